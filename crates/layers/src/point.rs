use std::f64::consts::TAU;

use formats::{Feature, Geometry, SvgElement, SvgNode};
use scene::{DEFAULT_POINT_RADIUS, FeatureIndex, Marker};

use crate::canvas::Canvas2d;
use crate::layer::{
    IndexCache, LayerCapabilities, LayerContext, LayerId, MapLayer, RenderMode, pick_feature,
};
use crate::symbology::{DynamicProp, FeatureStyle, format_number};

/// Circle markers. Non-point geometries are marked at their centroid.
///
/// A radius resolving to `None` hides that feature's marker and its hit area.
#[derive(Debug)]
pub struct PointLayer {
    id: LayerId,
    z_index: i32,
    features: Vec<Feature>,
    pub style: FeatureStyle,
    pub radius: DynamicProp<f64>,
    hit_test: bool,
    index: IndexCache,
}

/// A resolved marker in content space.
#[derive(Debug, Copy, Clone, PartialEq)]
struct Placed {
    index: usize,
    center: [f64; 2],
    radius: f64,
}

impl PointLayer {
    pub fn new(id: u64, features: Vec<Feature>) -> Self {
        Self {
            id: LayerId(id),
            z_index: 0,
            features,
            style: FeatureStyle::default(),
            radius: DynamicProp::Constant(DEFAULT_POINT_RADIUS),
            hit_test: true,
            index: IndexCache::default(),
        }
    }

    pub fn with_z_index(mut self, z_index: i32) -> Self {
        self.z_index = z_index;
        self
    }

    pub fn with_style(mut self, style: FeatureStyle) -> Self {
        self.style = style;
        self
    }

    pub fn with_radius(mut self, radius: impl Into<DynamicProp<f64>>) -> Self {
        self.radius = radius.into();
        self
    }

    pub fn with_hit_test(mut self, enabled: bool) -> Self {
        self.hit_test = enabled;
        self
    }

    pub fn features(&self) -> &[Feature] {
        &self.features
    }

    fn place(&self, ctx: &LayerContext) -> Vec<Placed> {
        self.features
            .iter()
            .enumerate()
            .filter_map(|(index, f)| {
                let radius = self.radius.resolve(f, index)?;
                let center = match f.geometry.as_ref()? {
                    Geometry::Point(p) => ctx.projection().project_point(*p)?,
                    other => ctx.path.centroid(other)?,
                };
                Some(Placed {
                    index,
                    center,
                    radius,
                })
            })
            .collect()
    }

    fn feature_index(&self, ctx: &LayerContext) -> std::rc::Rc<FeatureIndex> {
        self.index.get_or_build(ctx.generation, || {
            FeatureIndex::from_markers(self.place(ctx).into_iter().map(|p| Marker {
                index: p.index,
                center: p.center,
                radius: p.radius,
            }))
        })
    }
}

impl MapLayer for PointLayer {
    fn id(&self) -> LayerId {
        self.id
    }

    fn z_index(&self) -> i32 {
        self.z_index
    }

    fn capabilities(&self) -> LayerCapabilities {
        LayerCapabilities {
            hit_test: self.hit_test,
        }
    }

    fn render_vector(&self, ctx: &LayerContext) -> Vec<SvgNode> {
        if ctx.mode == RenderMode::Canvas {
            return vec![SvgNode::Comment("Point layer".to_string())];
        }
        self.place(ctx)
            .into_iter()
            .map(|m| {
                let style = self.style.resolve(&self.features[m.index], m.index);
                let el = SvgElement::new("circle")
                    .attr("cx", format_number(m.center[0]))
                    .attr("cy", format_number(m.center[1]))
                    .attr("r", format_number(ctx.unzoomed(m.radius)))
                    .attr_opt("fill", style.fill.as_deref());
                style.apply_to(el, ctx.zoom_scale()).into()
            })
            .collect()
    }

    fn draw(&self, canvas: &mut dyn Canvas2d, ctx: &LayerContext) {
        for m in self.place(ctx) {
            let style = self.style.resolve(&self.features[m.index], m.index);
            canvas.begin_path();
            canvas.arc(m.center[0], m.center[1], ctx.unzoomed(m.radius), 0.0, TAU);
            if let Some(fill) = &style.fill {
                canvas.set_fill_style(fill);
                canvas.fill();
            }
            if let Some(stroke) = &style.stroke {
                canvas.set_stroke_style(stroke);
                canvas.set_line_width(ctx.unzoomed(style.stroke_width.unwrap_or(1.0)));
                canvas.stroke();
            }
        }
    }

    fn find_feature_at_point(&self, p: [f64; 2], ctx: &LayerContext) -> Option<Feature> {
        let index = self.feature_index(ctx);
        pick_feature(&self.features, &index, p, ctx).cloned()
    }
}

use formats::{Feature, SvgElement, SvgNode};
use scene::{FeatureIndex, PickEntry, PickStyle};

use crate::canvas::Canvas2d;
use crate::layer::{
    IndexCache, LayerCapabilities, LayerContext, LayerId, MapLayer, RenderMode, pick_feature,
};
use crate::symbology::FeatureStyle;

/// Filled areas, one `<path>` per feature.
#[derive(Debug)]
pub struct PolygonLayer {
    id: LayerId,
    z_index: i32,
    features: Vec<Feature>,
    pub style: FeatureStyle,
    hit_test: bool,
    index: IndexCache,
}

impl PolygonLayer {
    pub fn new(id: u64, features: Vec<Feature>) -> Self {
        Self {
            id: LayerId(id),
            z_index: 0,
            features,
            style: FeatureStyle::default(),
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

    pub fn with_hit_test(mut self, enabled: bool) -> Self {
        self.hit_test = enabled;
        self
    }

    pub fn features(&self) -> &[Feature] {
        &self.features
    }

    fn feature_index(&self, ctx: &LayerContext) -> std::rc::Rc<FeatureIndex> {
        self.index.get_or_build(ctx.generation, || {
            let entries = self.features.iter().enumerate().filter_map(|(index, f)| {
                Some(PickEntry {
                    index,
                    geometry: f.geometry.as_ref()?,
                    style: PickStyle::default(),
                })
            });
            FeatureIndex::build(entries, &ctx.path)
        })
    }
}

impl MapLayer for PolygonLayer {
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
            return vec![SvgNode::Comment("Polygon layer".to_string())];
        }
        self.features
            .iter()
            .enumerate()
            .filter_map(|(i, f)| {
                let d = ctx.path.path(f.geometry.as_ref()?)?;
                let style = self.style.resolve(f, i);
                let el = SvgElement::new("path")
                    .attr("d", d)
                    .attr("fill", style.fill.as_deref().unwrap_or("none"))
                    .attr("stroke-linejoin", "round");
                Some(style.apply_to(el, ctx.zoom_scale()).into())
            })
            .collect()
    }

    fn draw(&self, canvas: &mut dyn Canvas2d, ctx: &LayerContext) {
        for (i, f) in self.features.iter().enumerate() {
            let Some(geometry) = &f.geometry else {
                continue;
            };
            let style = self.style.resolve(f, i);
            canvas.begin_path();
            ctx.path.draw(geometry, canvas);
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

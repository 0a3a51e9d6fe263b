use formats::{Feature, SvgElement, SvgNode};
use scene::{FeatureIndex, PickEntry, PickStyle};

use crate::canvas::Canvas2d;
use crate::layer::{
    IndexCache, LayerCapabilities, LayerContext, LayerId, MapLayer, RenderMode, pick_feature,
};
use crate::symbology::FeatureStyle;

/// Hit slack around a stroked line, in screen pixels.
pub const LINE_PICK_TOLERANCE: f64 = 3.0;

/// Unfilled strokes. Stroke width is kept constant on screen under zoom.
#[derive(Debug)]
pub struct LineLayer {
    id: LayerId,
    z_index: i32,
    features: Vec<Feature>,
    pub style: FeatureStyle,
    hit_test: bool,
    index: IndexCache,
}

impl LineLayer {
    pub fn new(id: u64, features: Vec<Feature>) -> Self {
        Self {
            id: LayerId(id),
            z_index: 0,
            features,
            style: FeatureStyle::default(),
            hit_test: false,
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
                let width = self.style.resolve(f, index).stroke_width.unwrap_or(1.0);
                Some(PickEntry {
                    index,
                    geometry: f.geometry.as_ref()?,
                    style: PickStyle {
                        tolerance: LINE_PICK_TOLERANCE.max(width * 0.5),
                        ..PickStyle::default()
                    },
                })
            });
            FeatureIndex::build(entries, &ctx.path)
        })
    }
}

impl MapLayer for LineLayer {
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
            return vec![SvgNode::Comment("Line layer".to_string())];
        }
        self.features
            .iter()
            .enumerate()
            .filter_map(|(i, f)| {
                let d = ctx.path.path(f.geometry.as_ref()?)?;
                let style = self.style.resolve(f, i);
                let el = SvgElement::new("path")
                    .attr("d", d)
                    .attr("fill", "none")
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
            canvas.set_line_width(ctx.unzoomed(style.stroke_width.unwrap_or(1.0)));
            if let Some(stroke) = &style.stroke {
                canvas.set_stroke_style(stroke);
            }
            ctx.path.draw(geometry, canvas);
            canvas.stroke();
        }
    }

    fn find_feature_at_point(&self, p: [f64; 2], ctx: &LayerContext) -> Option<Feature> {
        let index = self.feature_index(ctx);
        pick_feature(&self.features, &index, p, ctx).cloned()
    }
}

#[cfg(test)]
mod tests {
    use foundation::math::ZoomTransform;
    use formats::SvgNode;
    use pretty_assertions::assert_eq;

    use super::LineLayer;
    use crate::canvas::RecordingCanvas;
    use crate::layer::test_support::{context, segment};
    use crate::layer::{MapLayer, RenderMode};
    use crate::symbology::FeatureStyle;

    fn layer() -> LineLayer {
        LineLayer::new(2, vec![segment("m1", [0.0, 10.0], [80.0, 10.0])])
            .with_style(FeatureStyle::default().with_stroke("#222").with_stroke_width(2.0))
            .with_hit_test(true)
    }

    fn stroke_width(nodes: &[SvgNode]) -> f64 {
        let SvgNode::Element(el) = &nodes[0] else {
            panic!("expected element");
        };
        el.get_attr("stroke-width")
            .and_then(|w| w.parse().ok())
            .expect("stroke-width")
    }

    #[test]
    fn doubling_zoom_halves_vector_stroke_width() {
        let layer = layer();
        let at_1 = layer.render_vector(&context(RenderMode::Vector, ZoomTransform::identity()));
        let at_2 =
            layer.render_vector(&context(RenderMode::Vector, ZoomTransform::new(0.0, 0.0, 2.0)));
        let at_4 =
            layer.render_vector(&context(RenderMode::Vector, ZoomTransform::new(0.0, 0.0, 4.0)));
        assert_eq!(stroke_width(&at_1), 2.0);
        assert_eq!(stroke_width(&at_2), 1.0);
        assert_eq!(stroke_width(&at_4), 0.5);
    }

    #[test]
    fn lines_are_never_filled() {
        let nodes = layer().render_vector(&context(RenderMode::Vector, ZoomTransform::identity()));
        let SvgNode::Element(el) = &nodes[0] else {
            panic!("expected element");
        };
        assert_eq!(el.get_attr("fill"), Some("none"));
        assert_eq!(el.get_attr("d"), Some("M0,10L80,10"));
    }

    #[test]
    fn canvas_line_width_is_divided_by_zoom() {
        let mut canvas = RecordingCanvas::new();
        layer().draw(
            &mut canvas,
            &context(RenderMode::Canvas, ZoomTransform::new(0.0, 0.0, 4.0)),
        );
        assert_eq!(canvas.line_widths(), vec![0.5]);
    }

    #[test]
    fn picks_near_the_stroke() {
        let layer = layer();
        let ctx = context(RenderMode::Vector, ZoomTransform::identity());
        assert!(layer.find_feature_at_point([40.0, 12.0], &ctx).is_some());
        assert!(layer.find_feature_at_point([40.0, 20.0], &ctx).is_none());
    }
}

use formats::{SvgElement, SvgNode};

use crate::canvas::Canvas2d;
use crate::layer::{LayerContext, LayerId, MapLayer, RenderMode};
use crate::symbology::format_number;

/// A static image stretched over the content rectangle.
///
/// Carries no features and never takes part in hit-testing.
#[derive(Debug, Clone, PartialEq)]
pub struct PrerenderedLayer {
    id: LayerId,
    z_index: i32,
    pub src: String,
    pub class: Option<String>,
}

impl PrerenderedLayer {
    pub fn new(id: u64, src: impl Into<String>) -> Self {
        Self {
            id: LayerId(id),
            z_index: 0,
            src: src.into(),
            class: None,
        }
    }

    pub fn with_z_index(mut self, z_index: i32) -> Self {
        self.z_index = z_index;
        self
    }

    pub fn with_class(mut self, class: impl Into<String>) -> Self {
        self.class = Some(class.into());
        self
    }
}

impl MapLayer for PrerenderedLayer {
    fn id(&self) -> LayerId {
        self.id
    }

    fn z_index(&self) -> i32 {
        self.z_index
    }

    fn render_vector(&self, ctx: &LayerContext) -> Vec<SvgNode> {
        if ctx.mode == RenderMode::Canvas {
            return vec![SvgNode::Comment("Prerendered layer".to_string())];
        }
        let image = SvgElement::new("image")
            .attr("href", &self.src)
            .attr("x", 0)
            .attr("y", 0)
            .attr("width", format_number(ctx.content_size.width))
            .attr("height", format_number(ctx.content_size.height))
            .attr("preserveAspectRatio", "none")
            .attr_opt("class", self.class.as_deref());
        vec![image.into()]
    }

    fn draw(&self, canvas: &mut dyn Canvas2d, ctx: &LayerContext) {
        canvas.draw_image(
            &self.src,
            0.0,
            0.0,
            ctx.content_size.width,
            ctx.content_size.height,
        );
    }
}

#[cfg(test)]
mod tests {
    use foundation::math::ZoomTransform;
    use formats::SvgNode;
    use pretty_assertions::assert_eq;

    use super::PrerenderedLayer;
    use crate::canvas::{DrawCommand, RecordingCanvas};
    use crate::layer::test_support::context;
    use crate::layer::{LayerCapabilities, MapLayer, RenderMode};

    #[test]
    fn image_covers_content_rect() {
        let layer = PrerenderedLayer::new(9, "uk.png").with_class("backdrop");
        let nodes = layer.render_vector(&context(RenderMode::Vector, ZoomTransform::identity()));
        let SvgNode::Element(el) = &nodes[0] else {
            panic!("expected element");
        };
        assert_eq!(
            el.to_markup(),
            r#"<image href="uk.png" x="0" y="0" width="100" height="100" preserveAspectRatio="none" class="backdrop"/>"#
        );
    }

    #[test]
    fn canvas_draws_image_and_cannot_hit_test() {
        let layer = PrerenderedLayer::new(9, "uk.png");
        let ctx = context(RenderMode::Canvas, ZoomTransform::identity());
        let mut canvas = RecordingCanvas::new();
        layer.draw(&mut canvas, &ctx);
        assert_eq!(
            canvas.commands(),
            &[DrawCommand::DrawImage {
                src: "uk.png".to_string(),
                x: 0.0,
                y: 0.0,
                width: 100.0,
                height: 100.0,
            }]
        );
        assert_eq!(layer.capabilities(), LayerCapabilities::NONE);
        assert!(layer.find_feature_at_point([1.0, 1.0], &ctx).is_none());
    }
}

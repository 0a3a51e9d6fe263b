//! Whole-map render passes over the registered layers.

use formats::SvgElement;
use layers::{Canvas2d, format_number};
use scene::PathSink;

use crate::context::MapContext;

pub const COMPOSITION_BORDER_STROKE: &str = "#999";

/// Vector pass: `<svg>` with a padding group, a zoom group and every layer
/// bottom first.
pub fn render_svg(ctx: &MapContext) -> SvgElement {
    let view = ctx.layer_context();
    let mut zoom_group = SvgElement::new("g")
        .attr("class", "zoom")
        .attr("transform", ctx.transform().to_svg());
    for layer in ctx.draw_order() {
        zoom_group.extend(layer.render_vector(view));
    }
    if let Some(borders) = composition_borders_svg(ctx) {
        zoom_group.push(borders);
    }

    let content = SvgElement::new("g")
        .attr(
            "transform",
            format!(
                "translate({},{})",
                format_number(ctx.padding.left),
                format_number(ctx.padding.top)
            ),
        )
        .child(zoom_group);

    let [width, height] = ctx.size;
    SvgElement::new("svg")
        .attr("id", &ctx.id)
        .attr("xmlns", "http://www.w3.org/2000/svg")
        .attr("width", format_number(width))
        .attr("height", format_number(height))
        .attr(
            "viewBox",
            format!("0 0 {} {}", format_number(width), format_number(height)),
        )
        .child(content)
}

fn composition_borders_svg(ctx: &MapContext) -> Option<SvgElement> {
    if !ctx.config.draw_composition_borders {
        return None;
    }
    let mut d = scene::SvgPathWriter::new();
    trace_borders(ctx, &mut d);
    if d.is_empty() {
        return None;
    }
    Some(
        SvgElement::new("path")
            .attr("class", "composition-borders")
            .attr("d", d.finish())
            .attr("fill", "none")
            .attr("stroke", COMPOSITION_BORDER_STROKE)
            .attr("stroke-width", format_number(1.0 / ctx.get_zoom_scale())),
    )
}

fn trace_borders<S: PathSink + ?Sized>(ctx: &MapContext, sink: &mut S) {
    for line in ctx.projection().composition_borders() {
        let Some((first, rest)) = line.split_first() else {
            continue;
        };
        sink.move_to(first[0], first[1]);
        for p in rest {
            sink.line_to(p[0], p[1]);
        }
    }
}

/// Canvas pass: clears the surface, applies `pixel_ratio * zoom` offset by
/// the padding, then lets every layer draw bottom first.
pub fn draw_canvas(ctx: &MapContext, canvas: &mut dyn Canvas2d) {
    let view = ctx.layer_context();
    let ratio = view.pixel_ratio;
    let t = ctx.transform();
    let [width, height] = ctx.size;

    canvas.save();
    canvas.set_transform(1.0, 0.0, 0.0, 1.0, 0.0, 0.0);
    canvas.clear_rect(0.0, 0.0, width * ratio, height * ratio);
    let s = ratio * t.k;
    canvas.set_transform(
        s,
        0.0,
        0.0,
        s,
        ratio * (ctx.padding.left + t.x),
        ratio * (ctx.padding.top + t.y),
    );

    for layer in ctx.draw_order() {
        layer.draw(canvas, view);
    }

    if ctx.config.draw_composition_borders {
        canvas.begin_path();
        trace_borders(ctx, canvas);
        canvas.set_stroke_style(COMPOSITION_BORDER_STROKE);
        canvas.set_line_width(view.unzoomed(1.0));
        canvas.stroke();
    }
    canvas.restore();
}

//! `Canvas2d` over a browser `CanvasRenderingContext2d`.

use std::collections::HashMap;

use js_sys::Reflect;
use scene::PathSink;
use tracing::warn;
use wasm_bindgen::JsValue;
use web_sys::{CanvasRenderingContext2d, HtmlImageElement};

use crate::canvas::Canvas2d;

pub struct WebCanvas {
    ctx: CanvasRenderingContext2d,
    images: HashMap<String, HtmlImageElement>,
}

impl WebCanvas {
    pub fn new(ctx: CanvasRenderingContext2d) -> Self {
        Self {
            ctx,
            images: HashMap::new(),
        }
    }

    pub fn context(&self) -> &CanvasRenderingContext2d {
        &self.ctx
    }

    fn set_prop(&self, name: &str, value: &JsValue) {
        if let Err(err) = Reflect::set(&self.ctx, &JsValue::from_str(name), value) {
            warn!(?err, name, "canvas property rejected");
        }
    }

    fn image(&mut self, src: &str) -> Option<HtmlImageElement> {
        if let Some(img) = self.images.get(src) {
            return Some(img.clone());
        }
        let img = match HtmlImageElement::new() {
            Ok(img) => img,
            Err(err) => {
                warn!(?err, src, "image element unavailable");
                return None;
            }
        };
        img.set_src(src);
        self.images.insert(src.to_string(), img.clone());
        Some(img)
    }
}

fn report(result: Result<(), JsValue>, op: &str) {
    if let Err(err) = result {
        warn!(?err, op, "canvas call failed");
    }
}

impl PathSink for WebCanvas {
    fn move_to(&mut self, x: f64, y: f64) {
        self.ctx.move_to(x, y);
    }

    fn line_to(&mut self, x: f64, y: f64) {
        self.ctx.line_to(x, y);
    }

    fn close_path(&mut self) {
        self.ctx.close_path();
    }

    fn circle(&mut self, x: f64, y: f64, r: f64) {
        self.ctx.move_to(x + r, y);
        self.arc(x, y, r, 0.0, std::f64::consts::TAU);
    }
}

impl Canvas2d for WebCanvas {
    fn begin_path(&mut self) {
        self.ctx.begin_path();
    }

    fn fill(&mut self) {
        self.ctx.fill();
    }

    fn stroke(&mut self) {
        self.ctx.stroke();
    }

    fn set_fill_style(&mut self, style: &str) {
        self.set_prop("fillStyle", &JsValue::from_str(style));
    }

    fn set_stroke_style(&mut self, style: &str) {
        self.set_prop("strokeStyle", &JsValue::from_str(style));
    }

    fn set_line_width(&mut self, width: f64) {
        self.ctx.set_line_width(width);
    }

    fn set_transform(&mut self, a: f64, b: f64, c: f64, d: f64, e: f64, f: f64) {
        report(self.ctx.set_transform(a, b, c, d, e, f), "setTransform");
    }

    fn save(&mut self) {
        self.ctx.save();
    }

    fn restore(&mut self) {
        self.ctx.restore();
    }

    fn clear_rect(&mut self, x: f64, y: f64, width: f64, height: f64) {
        self.ctx.clear_rect(x, y, width, height);
    }

    fn draw_image(&mut self, src: &str, x: f64, y: f64, width: f64, height: f64) {
        let Some(img) = self.image(src) else {
            return;
        };
        // Not yet decoded images are skipped; the next pass picks them up.
        if !img.complete() {
            return;
        }
        report(
            self.ctx
                .draw_image_with_html_image_element_and_dw_and_dh(&img, x, y, width, height),
            "drawImage",
        );
    }

    fn arc(&mut self, x: f64, y: f64, radius: f64, start_angle: f64, end_angle: f64) {
        report(self.ctx.arc(x, y, radius, start_angle, end_angle), "arc");
    }
}

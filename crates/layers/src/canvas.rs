//! Immediate-mode 2D drawing surface used by the canvas render pass.

use scene::PathSink;
use serde::Serialize;

/// Subset of the HTML canvas 2D context the layers draw with.
///
/// Path building goes through the `PathSink` supertrait so the shared path
/// generator can draw straight onto the surface.
pub trait Canvas2d: PathSink {
    fn begin_path(&mut self);
    fn fill(&mut self);
    fn stroke(&mut self);
    fn set_fill_style(&mut self, style: &str);
    fn set_stroke_style(&mut self, style: &str);
    fn set_line_width(&mut self, width: f64);
    fn set_transform(&mut self, a: f64, b: f64, c: f64, d: f64, e: f64, f: f64);
    fn save(&mut self);
    fn restore(&mut self);
    fn clear_rect(&mut self, x: f64, y: f64, width: f64, height: f64);
    fn draw_image(&mut self, src: &str, x: f64, y: f64, width: f64, height: f64);
    fn arc(&mut self, x: f64, y: f64, radius: f64, start_angle: f64, end_angle: f64);
}

/// One recorded canvas call.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "op", rename_all = "snake_case")]
pub enum DrawCommand {
    BeginPath,
    MoveTo { x: f64, y: f64 },
    LineTo { x: f64, y: f64 },
    ClosePath,
    Arc { x: f64, y: f64, radius: f64, start_angle: f64, end_angle: f64 },
    Fill,
    Stroke,
    FillStyle { style: String },
    StrokeStyle { style: String },
    LineWidth { width: f64 },
    SetTransform { matrix: [f64; 6] },
    Save,
    Restore,
    ClearRect { x: f64, y: f64, width: f64, height: f64 },
    DrawImage { src: String, x: f64, y: f64, width: f64, height: f64 },
}

/// A `Canvas2d` that records every call as a display list.
#[derive(Debug, Default, Clone, PartialEq)]
pub struct RecordingCanvas {
    commands: Vec<DrawCommand>,
}

impl RecordingCanvas {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn commands(&self) -> &[DrawCommand] {
        &self.commands
    }

    pub fn into_commands(self) -> Vec<DrawCommand> {
        self.commands
    }

    /// Every line width set so far, in call order.
    pub fn line_widths(&self) -> Vec<f64> {
        self.commands
            .iter()
            .filter_map(|c| match c {
                DrawCommand::LineWidth { width } => Some(*width),
                _ => None,
            })
            .collect()
    }

    fn push(&mut self, command: DrawCommand) {
        self.commands.push(command);
    }
}

impl PathSink for RecordingCanvas {
    fn move_to(&mut self, x: f64, y: f64) {
        self.push(DrawCommand::MoveTo { x, y });
    }

    fn line_to(&mut self, x: f64, y: f64) {
        self.push(DrawCommand::LineTo { x, y });
    }

    fn close_path(&mut self) {
        self.push(DrawCommand::ClosePath);
    }

    fn circle(&mut self, x: f64, y: f64, r: f64) {
        self.move_to(x + r, y);
        self.arc(x, y, r, 0.0, std::f64::consts::TAU);
    }
}

impl Canvas2d for RecordingCanvas {
    fn begin_path(&mut self) {
        self.push(DrawCommand::BeginPath);
    }

    fn fill(&mut self) {
        self.push(DrawCommand::Fill);
    }

    fn stroke(&mut self) {
        self.push(DrawCommand::Stroke);
    }

    fn set_fill_style(&mut self, style: &str) {
        self.push(DrawCommand::FillStyle {
            style: style.to_string(),
        });
    }

    fn set_stroke_style(&mut self, style: &str) {
        self.push(DrawCommand::StrokeStyle {
            style: style.to_string(),
        });
    }

    fn set_line_width(&mut self, width: f64) {
        self.push(DrawCommand::LineWidth { width });
    }

    fn set_transform(&mut self, a: f64, b: f64, c: f64, d: f64, e: f64, f: f64) {
        self.push(DrawCommand::SetTransform {
            matrix: [a, b, c, d, e, f],
        });
    }

    fn save(&mut self) {
        self.push(DrawCommand::Save);
    }

    fn restore(&mut self) {
        self.push(DrawCommand::Restore);
    }

    fn clear_rect(&mut self, x: f64, y: f64, width: f64, height: f64) {
        self.push(DrawCommand::ClearRect {
            x,
            y,
            width,
            height,
        });
    }

    fn draw_image(&mut self, src: &str, x: f64, y: f64, width: f64, height: f64) {
        self.push(DrawCommand::DrawImage {
            src: src.to_string(),
            x,
            y,
            width,
            height,
        });
    }

    fn arc(&mut self, x: f64, y: f64, radius: f64, start_angle: f64, end_angle: f64) {
        self.push(DrawCommand::Arc {
            x,
            y,
            radius,
            start_angle,
            end_angle,
        });
    }
}

// src/overlay.rs
//
// Stateless overlay rendering. Every cycle fully clears the surface and
// redraws from the cycle's DetectionSet alone; nothing survives to the
// next cycle.

use crate::types::{Detection, DetectionSet};

const STROKE_WIDTH: f32 = 3.0;
const LABEL_FONT: &str = "18px Arial";

/// Overlay palette. One color per detection class, fixed mapping.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Color {
    Blue,
    Red,
    Lime,
}

impl Color {
    pub fn as_str(&self) -> &'static str {
        match self {
            Color::Blue => "blue",
            Color::Red => "red",
            Color::Lime => "lime",
        }
    }
}

/// Drawing primitives of the rendering surface. The caller owning the
/// surface is responsible for resizing it to the source frame before a
/// cycle renders; the renderer itself never resizes.
pub trait DrawSurface: Send {
    fn resize(&mut self, width: u32, height: u32);
    fn clear(&mut self);
    fn set_stroke_style(&mut self, color: Color);
    fn set_fill_style(&mut self, color: Color);
    fn set_line_width(&mut self, width: f32);
    fn set_font(&mut self, font: &str);
    fn fill_text(&mut self, text: &str, x: f32, y: f32);
    fn stroke_rect(&mut self, x: f32, y: f32, width: f32, height: f32);
}

/// Color mapping invariant: person → blue, cell phone → red, rest → lime.
pub fn class_color(class: &str) -> Color {
    match class {
        "person" => Color::Blue,
        "cell phone" => Color::Red,
        _ => Color::Lime,
    }
}

/// Label anchor for a bbox origin. Sits just above the box, clamped to
/// y = 10 so labels near the top edge are not clipped.
pub fn label_position(x: f32, y: f32) -> (f32, f32) {
    if y > 10.0 {
        (x, y - 5.0)
    } else {
        (x, 10.0)
    }
}

/// Clear the surface and draw one box + label per detection, in detector
/// output order. Pure in its inputs; the only side effect is on `surface`.
pub fn render(detections: &DetectionSet, surface: &mut dyn DrawSurface) {
    surface.clear();

    for detection in detections {
        draw_detection(detection, surface);
    }
}

fn draw_detection(detection: &Detection, surface: &mut dyn DrawSurface) {
    let [x, y, width, height] = detection.bbox;
    let color = class_color(&detection.class);

    surface.set_stroke_style(color);
    surface.set_line_width(STROKE_WIDTH);
    surface.set_font(LABEL_FONT);
    surface.set_fill_style(color);

    let (label_x, label_y) = label_position(x, y);
    surface.fill_text(&detection.class, label_x, label_y);
    surface.stroke_rect(x, y, width, height);
}

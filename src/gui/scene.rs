//! Drawing one [`Scene`] into a ratatui frame.
//!
//! Shapes are laid out on a 900 by 600 canvas with the origin at the top
//! left, then flipped into ratatui's bottom-left canvas space, so positions
//! stay the same whatever the terminal size.

use crate::{instrument::Scene, keyboard::key_name, MAX_ANGLE};

use ratatui::{
    buffer::Buffer,
    layout::Rect,
    prelude::*,
    symbols::Marker,
    widgets::{
        canvas::{Canvas, Context, Points},
        Widget,
    },
};
use std::f64::consts::PI;

/// Logical canvas width.
pub const WIDTH: f64 = 900.0;
/// Logical canvas height.
pub const HEIGHT: f64 = 600.0;

const KNOB_RADIUS: f64 = 50.0;
const KNOB_RING: f64 = 8.0;
const KNOB_FACE: Color = Color::Rgb(40, 40, 60);
const KNOB_ARC: Color = Color::Rgb(0, 255, 255);
const LABEL: Color = Color::Rgb(200, 200, 200);
const TITLE: (u8, u8, u8) = (255, 100, 255);
/// Speed, in degrees per second, that fills the velocity knob.
const VELOCITY_FULL_SCALE: f32 = 400.0;

/// Vertical gradient from an angle-dependent colour at the top to near-black.
#[derive(Debug, Clone, Copy)]
pub struct Gradient {
    /// Hinge angle in degrees.
    pub angle: f32,
}

impl Gradient {
    /// Colour of the top row.
    pub fn top_color(&self) -> (u8, u8, u8) {
        let hue = ((self.angle / MAX_ANGLE) * 255.0).clamp(0.0, 255.0) as u8;
        (hue, 100, 255 - hue)
    }

    /// Colour at `ratio` of the way down, `[0, 1]`.
    pub fn color_at(&self, ratio: f32) -> Color {
        let (r1, g1, b1) = self.top_color();
        let (r2, g2, b2) = (10_u8, 10_u8, 15_u8);
        let mix = |a: u8, b: u8| (a as f32 * (1.0 - ratio) + b as f32 * ratio) as u8;
        Color::Rgb(mix(r1, r2), mix(g1, g2), mix(b1, b2))
    }
}

impl Widget for Gradient {
    fn render(self, area: Rect, buf: &mut Buffer) {
        let height = area.height.max(1) as f32;
        for row in 0..area.height {
            let color = self.color_at(row as f32 / height);
            for col in 0..area.width {
                buf.get_mut(area.x + col, area.y + row).set_bg(color);
            }
        }
    }
}

/// Converts a top-left-origin point to canvas coordinates.
fn flip(x: f64, y: f64) -> (f64, f64) {
    (x, HEIGHT - y)
}

/// Filled disc of the knob face, sampled on a grid.
pub fn knob_face_points(cx: f64, cy: f64) -> Vec<(f64, f64)> {
    let step = 3.0;
    let n = (KNOB_RADIUS / step) as i32;
    (-n..=n)
        .flat_map(|i| (-n..=n).map(move |j| (i as f64 * step, j as f64 * step)))
        .filter(|(dx, dy)| dx * dx + dy * dy <= KNOB_RADIUS * KNOB_RADIUS)
        .map(|(dx, dy)| flip(cx + dx, cy + dy))
        .collect()
}

/// The value ring: starts at the upper left and sweeps counterclockwise
/// through three quarters of a turn as `value` goes from 0 to 1.
pub fn knob_arc_points(cx: f64, cy: f64, value: f32) -> Vec<(f64, f64)> {
    let value = if value.is_finite() {
        value.clamp(0.0, 1.0) as f64
    } else {
        0.0
    };
    let start = PI * 0.75;
    let sweep = value * PI * 1.5;
    let steps = (sweep * KNOB_RADIUS / 2.0).ceil() as usize;
    let (fx, fy) = flip(cx, cy);

    (0..steps)
        .flat_map(|s| {
            let theta = start + sweep * (s as f64 + 0.5) / steps as f64;
            (0..4).map(move |k| {
                let r = KNOB_RADIUS - KNOB_RING * k as f64 / 3.0;
                (fx + r * theta.cos(), fy + r * theta.sin())
            })
        })
        .collect()
}

fn draw_knob(ctx: &mut Context, cx: f64, cy: f64, value: f32, label: &'static str) {
    ctx.draw(&Points {
        coords: &knob_face_points(cx, cy),
        color: KNOB_FACE,
    });
    ctx.draw(&Points {
        coords: &knob_arc_points(cx, cy, value),
        color: KNOB_ARC,
    });
    let (lx, ly) = flip(cx - 40.0, cy + 60.0);
    ctx.print(lx, ly, label.fg(LABEL));
}

/// Title colour, breathing with a period of π seconds.
pub fn pulse_color(elapsed: f32) -> Color {
    let level = ((elapsed * 2.0).sin() + 1.0) / 2.0;
    let scale = |c: u8| (c as f32 * level) as u8;
    Color::Rgb(scale(TITLE.0), scale(TITLE.1), scale(TITLE.2))
}

/// The `Keys:` status line.
pub fn keys_line(scene: &Scene) -> String {
    let names: Vec<String> = scene.keys.iter().map(|&k| key_name(k)).collect();
    if names.is_empty() {
        "Keys: None".to_owned()
    } else {
        format!("Keys: {}", names.join(" "))
    }
}

/// Shown under the keys line while the drone sounds.
pub fn drone_line(scene: &Scene) -> Option<&'static str> {
    scene.drone.then_some("Drone")
}

/// Draws the whole scene over `frame`.
///
/// The canvas resets the background of every cell it covers, so the gradient
/// goes on last and only touches background colours.
pub fn draw_scene(frame: &mut Frame, scene: &Scene) {
    let area = frame.size();

    let title = " Harmonium ".fg(pulse_color(scene.elapsed)).bold();
    let mode = Span::styled(
        format!("Mode: {}", scene.mode.name()),
        Style::default().fg(Color::Rgb(220, 255, 220)),
    );
    let keys = Span::styled(keys_line(scene), Style::default().fg(Color::Rgb(180, 220, 255)));
    let drone = drone_line(scene).map(|text| text.fg(Color::Rgb(255, 220, 150)));
    let angle = scene.angle;
    let pressure = scene.pressure;
    let velocity = scene.velocity.abs() / VELOCITY_FULL_SCALE;

    let canvas = Canvas::default()
        .marker(Marker::Braille)
        .x_bounds([0.0, WIDTH])
        .y_bounds([0.0, HEIGHT])
        .paint(move |ctx| {
            draw_knob(ctx, 150.0, 300.0, angle / MAX_ANGLE, "Angle");
            draw_knob(ctx, 350.0, 300.0, pressure, "Pressure");
            draw_knob(ctx, 550.0, 300.0, velocity, "Velocity");

            let (x, y) = flip(230.0, 40.0);
            ctx.print(x, y, title.clone());
            let (x, y) = flip(360.0, 100.0);
            ctx.print(x, y, mode.clone());
            let (x, y) = flip(340.0, 130.0);
            ctx.print(x, y, keys.clone());
            if let Some(drone) = &drone {
                let (x, y) = flip(340.0, 160.0);
                ctx.print(x, y, drone.clone());
            }
        });
    frame.render_widget(canvas, area);
    frame.render_widget(Gradient { angle: scene.angle }, area);
}

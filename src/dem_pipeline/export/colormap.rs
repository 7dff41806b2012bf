//! Multi-stop color ramps for elevation rendering.

use image::Rgb;

/// A color stop: position in [0, 1] mapped to an RGB color.
#[derive(Debug, Clone, Copy)]
pub struct ColorStop {
    pub t: f64,
    pub color: [u8; 3],
}

impl ColorStop {
    pub const fn new(t: f64, r: u8, g: u8, b: u8) -> Self {
        Self { t, color: [r, g, b] }
    }
}

/// Deep water -> shallows -> lowland green -> sand -> rock -> snow.
pub const TERRAIN: &[ColorStop] = &[
    ColorStop::new(0.00, 51, 51, 153),
    ColorStop::new(0.15, 0, 153, 255),
    ColorStop::new(0.25, 0, 204, 102),
    ColorStop::new(0.50, 255, 255, 153),
    ColorStop::new(0.75, 128, 92, 84),
    ColorStop::new(1.00, 255, 255, 255),
];

pub const GRAYSCALE: &[ColorStop] = &[
    ColorStop::new(0.0, 0, 0, 0),
    ColorStop::new(1.0, 255, 255, 255),
];

fn lerp(a: u8, b: u8, t: f64) -> u8 {
    (a as f64 + (b as f64 - a as f64) * t).round() as u8
}

/// Evaluates a ramp at `t`, clamped to the end stops.
pub fn evaluate(stops: &[ColorStop], t: f64) -> Rgb<u8> {
    let first = stops[0];
    let last = stops[stops.len() - 1];
    if t.is_nan() || t <= first.t {
        return Rgb(first.color);
    }
    if t >= last.t {
        return Rgb(last.color);
    }
    for pair in stops.windows(2) {
        let (lo, hi) = (pair[0], pair[1]);
        if t <= hi.t {
            let ratio = (t - lo.t) / (hi.t - lo.t);
            return Rgb([
                lerp(lo.color[0], hi.color[0], ratio),
                lerp(lo.color[1], hi.color[1], ratio),
                lerp(lo.color[2], hi.color[2], ratio),
            ]);
        }
    }
    Rgb(last.color)
}

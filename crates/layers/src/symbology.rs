/// Paint attributes attached to rendered paths. Colors are straight RGBA in `0..=1`.
#[derive(Debug, Copy, Clone, PartialEq)]
pub struct PathStyle {
    pub fill: Option<[f32; 4]>,
    pub stroke: Option<[f32; 4]>,
    pub stroke_width: f32,
}

impl PathStyle {
    pub const fn new(fill: Option<[f32; 4]>, stroke: Option<[f32; 4]>, stroke_width: f32) -> Self {
        Self {
            fill,
            stroke,
            stroke_width,
        }
    }

    /// Unfilled hairline, the default for mesh layers.
    pub const fn border() -> Self {
        Self::new(None, Some([0.2, 0.2, 0.2, 1.0]), 0.5)
    }

    /// SVG presentation attributes, e.g. `fill="rgba(...)" stroke="none"`.
    pub fn svg_attributes(&self) -> String {
        format!(
            r#"fill="{}" stroke="{}" stroke-width="{}""#,
            css_color(self.fill),
            css_color(self.stroke),
            self.stroke_width
        )
    }
}

impl Default for PathStyle {
    fn default() -> Self {
        Self {
            fill: Some([0.8, 0.8, 0.8, 1.0]),
            stroke: Some([1.0, 1.0, 1.0, 1.0]),
            stroke_width: 0.5,
        }
    }
}

fn css_color(color: Option<[f32; 4]>) -> String {
    match color {
        None => "none".to_string(),
        Some([r, g, b, a]) => format!(
            "rgba({},{},{},{})",
            channel(r),
            channel(g),
            channel(b),
            a.clamp(0.0, 1.0)
        ),
    }
}

fn channel(v: f32) -> u8 {
    (v.clamp(0.0, 1.0) * 255.0).round() as u8
}

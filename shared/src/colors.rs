use serde::{Deserialize, Serialize};

/// 8-bit RGB plus a 0..=1 alpha, the way canvas and SVG take colours.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Rgba {
    pub r: u8,
    pub g: u8,
    pub b: u8,
    pub a: f64,
}

impl Rgba {
    pub const TRANSPARENT: Self = Self::new(0, 0, 0, 0.0);
    pub const BLACK: Self = Self::new(0, 0, 0, 1.0);

    pub const fn new(r: u8, g: u8, b: u8, a: f64) -> Self {
        Self { r, g, b, a }
    }

    pub fn is_transparent(&self) -> bool {
        self.a <= 0.0
    }

    /// CSS colour text; opaque colours use the short `rgb()` form.
    pub fn css(&self) -> String {
        let Self { r, g, b, a } = *self;
        if a >= 1.0 {
            format!("rgb({r},{g},{b})")
        } else {
            rgba_css(r, g, b, a.max(0.0))
        }
    }
}

pub fn rgba_css(r: u8, g: u8, b: u8, a: f64) -> String {
    format!("rgba({r},{g},{b},{a})")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn css_text() {
        assert_eq!(Rgba::BLACK.css(), "rgb(0,0,0)");
        assert_eq!(Rgba::new(0, 0, 0, 0.3).css(), "rgba(0,0,0,0.3)");
        assert_eq!(Rgba::TRANSPARENT.css(), "rgba(0,0,0,0)");
        assert!(Rgba::TRANSPARENT.is_transparent());
        assert!(!Rgba::new(10, 20, 30, 0.01).is_transparent());
    }
}

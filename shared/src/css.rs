//! Just enough CSS to recover how a canvas element is displayed: inline
//! `style` declarations and 2D transform lists.

use kurbo::{Affine, Vec2};

use crate::error::CssError;

/// Declarations of an element's `style` attribute, in source order.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct InlineStyle {
    declarations: Vec<(String, String)>,
}

impl InlineStyle {
    /// Value of `property` (case-insensitive). The last declaration wins.
    pub fn get(&self, property: &str) -> Option<&str> {
        self.declarations
            .iter()
            .rev()
            .find(|(name, _)| name.eq_ignore_ascii_case(property))
            .map(|(_, value)| value.as_str())
    }

    pub fn len(&self) -> usize {
        self.declarations.len()
    }

    pub fn is_empty(&self) -> bool {
        self.declarations.is_empty()
    }
}

/// Split a `style` attribute into `name: value` declarations. Empty or
/// colon-less segments are skipped and `!important` is dropped.
pub fn parse_inline_style(style: &str) -> InlineStyle {
    let declarations = style
        .split(';')
        .filter_map(|decl| {
            let (name, value) = decl.split_once(':')?;
            let name = name.trim();
            let value = value.trim();
            let value = value.strip_suffix("!important").unwrap_or(value).trim();
            if name.is_empty() || value.is_empty() {
                return None;
            }
            Some((name.to_ascii_lowercase(), value.to_string()))
        })
        .collect();
    InlineStyle { declarations }
}

/// Parse a CSS `transform` value into a 2D affine map. Functions compose
/// left to right, so `translate(10px) scale(2)` scales first.
pub fn parse_transform(value: &str) -> Result<Affine, CssError> {
    let mut rest = value.trim();
    if rest.is_empty() || rest.eq_ignore_ascii_case("none") {
        return Ok(Affine::IDENTITY);
    }

    let mut out = Affine::IDENTITY;
    while !rest.is_empty() {
        let open = rest
            .find('(')
            .ok_or_else(|| CssError::Malformed(rest.to_string()))?;
        let close = rest
            .find(')')
            .filter(|&close| close > open)
            .ok_or_else(|| CssError::Malformed(rest.to_string()))?;
        let name = rest[..open].trim();
        if name.is_empty() || !name.chars().all(|c| c.is_ascii_alphanumeric()) {
            return Err(CssError::Malformed(rest.to_string()));
        }
        let args = split_args(&rest[open + 1..close]);
        out = out * transform_function(name, &args)?;
        rest = rest[close + 1..].trim_start();
    }
    Ok(out)
}

fn split_args(args: &str) -> Vec<&str> {
    let args = args.trim();
    if args.is_empty() {
        return Vec::new();
    }
    if args.contains(',') {
        args.split(',').map(str::trim).collect()
    } else {
        args.split_whitespace().collect()
    }
}

fn transform_function(name: &str, args: &[&str]) -> Result<Affine, CssError> {
    let lower = name.to_ascii_lowercase();
    let affine = match lower.as_str() {
        "matrix" => {
            arity(name, args, 6, 6, "6")?;
            let mut c = [0.0; 6];
            for (slot, arg) in c.iter_mut().zip(args) {
                *slot = number(arg)?;
            }
            Affine::new(c)
        }
        "matrix3d" => {
            arity(name, args, 16, 16, "16")?;
            let m = args
                .iter()
                .map(|arg| number(arg))
                .collect::<Result<Vec<_>, _>>()?;
            Affine::new([m[0], m[1], m[4], m[5], m[12], m[13]])
        }
        "translate" => {
            arity(name, args, 1, 2, "1 or 2")?;
            let x = length(args[0])?;
            let y = args.get(1).map(|a| length(a)).transpose()?.unwrap_or(0.0);
            Affine::translate(Vec2::new(x, y))
        }
        "translate3d" => {
            arity(name, args, 3, 3, "3")?;
            Affine::translate(Vec2::new(length(args[0])?, length(args[1])?))
        }
        "translatex" => {
            arity(name, args, 1, 1, "1")?;
            Affine::translate(Vec2::new(length(args[0])?, 0.0))
        }
        "translatey" => {
            arity(name, args, 1, 1, "1")?;
            Affine::translate(Vec2::new(0.0, length(args[0])?))
        }
        "scale" => {
            arity(name, args, 1, 2, "1 or 2")?;
            let sx = number(args[0])?;
            let sy = args.get(1).map(|a| number(a)).transpose()?.unwrap_or(sx);
            Affine::scale_non_uniform(sx, sy)
        }
        "scale3d" => {
            arity(name, args, 3, 3, "3")?;
            Affine::scale_non_uniform(number(args[0])?, number(args[1])?)
        }
        "scalex" => {
            arity(name, args, 1, 1, "1")?;
            Affine::scale_non_uniform(number(args[0])?, 1.0)
        }
        "scaley" => {
            arity(name, args, 1, 1, "1")?;
            Affine::scale_non_uniform(1.0, number(args[0])?)
        }
        "rotate" => {
            arity(name, args, 1, 1, "1")?;
            Affine::rotate(angle(args[0])?)
        }
        "skew" => {
            arity(name, args, 1, 2, "1 or 2")?;
            let ax = angle(args[0])?;
            let ay = args.get(1).map(|a| angle(a)).transpose()?.unwrap_or(0.0);
            Affine::skew(ax.tan(), ay.tan())
        }
        "skewx" => {
            arity(name, args, 1, 1, "1")?;
            Affine::skew(angle(args[0])?.tan(), 0.0)
        }
        "skewy" => {
            arity(name, args, 1, 1, "1")?;
            Affine::skew(0.0, angle(args[0])?.tan())
        }
        _ => return Err(CssError::UnknownFunction(name.to_string())),
    };
    Ok(affine)
}

fn arity(
    name: &str,
    args: &[&str],
    min: usize,
    max: usize,
    expected: &'static str,
) -> Result<(), CssError> {
    if args.len() < min || args.len() > max {
        return Err(CssError::ArgumentCount {
            function: name.to_string(),
            expected,
            got: args.len(),
        });
    }
    Ok(())
}

fn number(raw: &str) -> Result<f64, CssError> {
    raw.trim()
        .parse::<f64>()
        .ok()
        .filter(|v| v.is_finite())
        .ok_or_else(|| invalid("number", raw))
}

/// A `px` or unitless length.
fn length(raw: &str) -> Result<f64, CssError> {
    let raw = raw.trim();
    let digits = raw.strip_suffix("px").unwrap_or(raw);
    number(digits).map_err(|_| invalid("length", raw))
}

/// An angle in radians. Bare `0` is accepted without a unit.
fn angle(raw: &str) -> Result<f64, CssError> {
    let raw = raw.trim();
    let lower = raw.to_ascii_lowercase();
    let (digits, to_radians): (&str, fn(f64) -> f64) = if let Some(d) = lower.strip_suffix("deg")
    {
        (d, f64::to_radians)
    } else if let Some(d) = lower.strip_suffix("grad") {
        (d, |v| v * std::f64::consts::PI / 200.0)
    } else if let Some(d) = lower.strip_suffix("rad") {
        (d, |v| v)
    } else if let Some(d) = lower.strip_suffix("turn") {
        (d, |v| v * std::f64::consts::TAU)
    } else if lower.parse::<f64>() == Ok(0.0) {
        return Ok(0.0);
    } else {
        return Err(invalid("angle", raw));
    };
    number(digits)
        .map(to_radians)
        .map_err(|_| invalid("angle", raw))
}

fn invalid(kind: &'static str, value: &str) -> CssError {
    CssError::InvalidValue {
        kind,
        value: value.to_string(),
    }
}

/// `transform-origin` as a pixel offset. Only `px`/unitless lengths and the
/// `left`/`top` keywords are understood.
fn transform_origin(value: &str) -> Result<Vec2, CssError> {
    let parts: Vec<&str> = value.split_whitespace().collect();
    if parts.is_empty() || parts.len() > 3 {
        return Err(CssError::UnsupportedOrigin(value.to_string()));
    }
    let component = |raw: &str| match raw.to_ascii_lowercase().as_str() {
        "left" | "top" => Ok(0.0),
        _ => length(raw).map_err(|_| CssError::UnsupportedOrigin(value.to_string())),
    };
    let x = component(parts[0])?;
    let y = parts.get(1).map(|p| component(p)).transpose()?.unwrap_or(0.0);
    Ok(Vec2::new(x, y))
}

/// Affine map from backing-buffer pixels of a canvas to the canvas element's
/// local display pixels, given the element's `style` attribute.
///
/// The result is `origin * transform * origin^-1 * scale(css width / backing
/// width)`. A missing `width` means the element is shown at backing size.
pub fn surface_transform(style: &str, backing_width: f64) -> Result<Affine, CssError> {
    if backing_width.is_nan() || backing_width <= 0.0 {
        return Err(CssError::ZeroBackingWidth);
    }
    let style = parse_inline_style(style);

    let scale = match style.get("width") {
        Some(width) => length(width).map_err(|_| invalid("width", width))? / backing_width,
        None => 1.0,
    };
    let transform = style
        .get("transform")
        .map(parse_transform)
        .transpose()?
        .unwrap_or(Affine::IDENTITY);
    let origin = style
        .get("transform-origin")
        .map(transform_origin)
        .transpose()?
        .unwrap_or(Vec2::ZERO);

    Ok(Affine::translate(origin)
        * transform
        * Affine::translate(-origin)
        * Affine::scale(scale))
}

#[cfg(test)]
mod tests {
    use kurbo::Point;

    use super::*;

    fn assert_point(actual: Point, x: f64, y: f64) {
        assert!(
            (actual.x - x).abs() < 1e-9 && (actual.y - y).abs() < 1e-9,
            "expected ({x}, {y}), got {actual:?}"
        );
    }

    #[test]
    fn inline_style_last_declaration_wins() {
        let style = parse_inline_style(
            "position: absolute; WIDTH: 300px;; width: 400px !important; bogus; transform:",
        );
        assert_eq!(style.len(), 3);
        assert_eq!(style.get("width"), Some("400px"));
        assert_eq!(style.get("Position"), Some("absolute"));
        assert_eq!(style.get("transform"), None);
    }

    #[test]
    fn none_and_empty_are_identity() {
        assert_eq!(parse_transform("none"), Ok(Affine::IDENTITY));
        assert_eq!(parse_transform("  "), Ok(Affine::IDENTITY));
    }

    #[test]
    fn functions_compose_left_to_right() {
        let t = parse_transform("translate(10px, 0px) scale(2)").unwrap();
        assert_point(t * Point::new(1.0, 1.0), 12.0, 2.0);

        let t = parse_transform("scale(2) translate(10px, 0px)").unwrap();
        assert_point(t * Point::new(1.0, 1.0), 22.0, 2.0);
    }

    #[test]
    fn leaflet_style_translate3d() {
        let t = parse_transform("translate3d(-12px, 34.5px, 0px)").unwrap();
        assert_point(t * Point::ORIGIN, -12.0, 34.5);
    }

    #[test]
    fn angles_in_every_unit() {
        for rotate in ["rotate(90deg)", "rotate(0.25turn)", "rotate(100grad)"] {
            let t = parse_transform(rotate).unwrap();
            assert_point(t * Point::new(1.0, 0.0), 0.0, 1.0);
        }
        let t = parse_transform(&format!("rotate({}rad)", std::f64::consts::PI)).unwrap();
        assert_point(t * Point::new(1.0, 0.0), -1.0, 0.0);
    }

    #[test]
    fn matrix_forms_agree() {
        let m = parse_transform("matrix(2, 0, 0, 3, 5, 7)").unwrap();
        let m3 = parse_transform("matrix3d(2,0,0,0, 0,3,0,0, 0,0,1,0, 5,7,0,1)").unwrap();
        assert_eq!(m, m3);
        assert_point(m * Point::new(1.0, 1.0), 7.0, 10.0);
    }

    #[test]
    fn axis_functions_and_skew() {
        let t = parse_transform("translateX(3px) translateY(4px) scaleX(2) scaleY(0.5)").unwrap();
        assert_point(t * Point::new(1.0, 2.0), 5.0, 5.0);

        let t = parse_transform("skewX(45deg)").unwrap();
        assert_point(t * Point::new(0.0, 1.0), 1.0, 1.0);
        let t = parse_transform("skew(0, 45deg)").unwrap();
        assert_point(t * Point::new(1.0, 0.0), 1.0, 1.0);
    }

    #[test]
    fn errors_are_reported() {
        assert_eq!(
            parse_transform("perspective(100px)"),
            Err(CssError::UnknownFunction("perspective".into()))
        );
        assert!(matches!(
            parse_transform("translate(1px, 2px, 3px)"),
            Err(CssError::ArgumentCount { got: 3, .. })
        ));
        assert!(matches!(
            parse_transform("translate(50%)"),
            Err(CssError::InvalidValue { kind: "length", .. })
        ));
        assert!(matches!(
            parse_transform("rotate(45)"),
            Err(CssError::InvalidValue { kind: "angle", .. })
        ));
        assert!(matches!(
            parse_transform("scale(2"),
            Err(CssError::Malformed(_))
        ));
    }

    #[test]
    fn surface_scale_from_css_width() {
        let t = surface_transform("width: 400px; height: 300px", 200.0).unwrap();
        assert_point(t * Point::new(50.0, 25.0), 100.0, 50.0);

        let unscaled = surface_transform("", 200.0).unwrap();
        assert_eq!(unscaled, Affine::IDENTITY);
    }

    #[test]
    fn surface_transform_applies_origin() {
        let t = surface_transform(
            "width: 100px; transform: rotate(90deg); transform-origin: 10px 10px",
            100.0,
        )
        .unwrap();
        assert_point(t * Point::new(10.0, 10.0), 10.0, 10.0);
        assert_point(t * Point::new(20.0, 10.0), 10.0, 20.0);
    }

    #[test]
    fn surface_transform_rejects_bad_input() {
        assert_eq!(
            surface_transform("width: 10px", 0.0),
            Err(CssError::ZeroBackingWidth)
        );
        assert!(matches!(
            surface_transform("transform-origin: 50% 50%", 100.0),
            Err(CssError::UnsupportedOrigin(_))
        ));
        assert!(matches!(
            surface_transform("width: auto", 100.0),
            Err(CssError::InvalidValue { kind: "width", .. })
        ));
    }
}

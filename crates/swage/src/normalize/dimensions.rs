//! Dimension token parser.
//!
//! Accepted grammars (case-insensitive, whitespace-tolerant, `×`/`x`/`*`
//! interchangeable, decimal comma allowed):
//!
//! - `M<d>×<pitch>×<L>` and `M<d>×<L>` (metric thread tokens)
//! - `<d>x<L>` (bare dimension pair)
//! - `Ø<d>` / `D=<d>` (diameter only)
//! - `L<L>` / `L=<L>` (length only)

use once_cell::sync::Lazy;
use regex::Regex;

/// Admissible diameter range in mm; out-of-range values are clamped.
pub const DIAMETER_RANGE_MM: (f64, f64) = (1.0, 2000.0);

/// Admissible length range in mm; out-of-range values are clamped.
pub const LENGTH_RANGE_MM: (f64, f64) = (1.0, 5000.0);

// Numeric token with optional decimal comma or point.
const NUM: &str = r"(\d+(?:[.,]\d+)?)";

static METRIC_THREAD: Lazy<Regex> = Lazy::new(|| {
    Regex::new(&format!(
        r"(?i)\bM\s*{NUM}(?:\s*[×x*]\s*{NUM})?(?:\s*[×x*]\s*{NUM})?"
    ))
    .unwrap()
});

static DIMENSION_PAIR: Lazy<Regex> =
    Lazy::new(|| Regex::new(&format!(r"(?i)\b{NUM}\s*[×x*]\s*{NUM}\b")).unwrap());

static DIAMETER_TOKEN: Lazy<Regex> =
    Lazy::new(|| Regex::new(&format!(r"(?i)(?:[Øø⌀]|\bD\s*=)\s*{NUM}")).unwrap());

static LENGTH_TOKEN: Lazy<Regex> =
    Lazy::new(|| Regex::new(&format!(r"(?i)\bL\s*=?\s*{NUM}")).unwrap());

/// Parsed dimensions; missing tokens stay `None`.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Dimensions {
    pub diameter_mm: Option<f64>,
    pub length_mm: Option<f64>,
    pub pitch_mm: Option<f64>,
}

/// Parse dimension tokens out of a free-form description.
///
/// Metric thread tokens win over bare pairs; diameter-only and length-only
/// tokens fill whatever is still missing. Values are clamped to the physical
/// ranges, so a `0` never survives to the physics kernel.
pub fn parse_dimensions(text: &str) -> Dimensions {
    let mut dims = Dimensions::default();

    if let Some(caps) = METRIC_THREAD.captures(text) {
        dims.diameter_mm = caps.get(1).and_then(|m| parse_num(m.as_str()));
        let second = caps.get(2).and_then(|m| parse_num(m.as_str()));
        let third = caps.get(3).and_then(|m| parse_num(m.as_str()));
        match (second, third) {
            // M10×1,25×45: pitch sits in the middle
            (Some(pitch), Some(len)) => {
                dims.pitch_mm = Some(pitch);
                dims.length_mm = Some(len);
            }
            (Some(len), None) => dims.length_mm = Some(len),
            _ => {}
        }
    } else if let Some(caps) = DIMENSION_PAIR.captures(text) {
        dims.diameter_mm = caps.get(1).and_then(|m| parse_num(m.as_str()));
        dims.length_mm = caps.get(2).and_then(|m| parse_num(m.as_str()));
    }

    if dims.diameter_mm.is_none() {
        if let Some(caps) = DIAMETER_TOKEN.captures(text) {
            dims.diameter_mm = caps.get(1).and_then(|m| parse_num(m.as_str()));
        }
    }
    if dims.length_mm.is_none() {
        if let Some(caps) = LENGTH_TOKEN.captures(text) {
            dims.length_mm = caps.get(1).and_then(|m| parse_num(m.as_str()));
        }
    }

    dims.diameter_mm = dims.diameter_mm.map(|d| clamp(d, DIAMETER_RANGE_MM));
    dims.length_mm = dims.length_mm.map(|l| clamp(l, LENGTH_RANGE_MM));
    dims
}

/// Parse a numeric token, accepting a decimal comma.
fn parse_num(token: &str) -> Option<f64> {
    token.replace(',', ".").parse().ok()
}

fn clamp(value: f64, (lo, hi): (f64, f64)) -> f64 {
    if !value.is_finite() || value < lo {
        lo
    } else if value > hi {
        hi
    } else {
        value
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_metric_thread_with_pitch() {
        let dims = parse_dimensions("ISO 4028-10.9-(ZN-NI)-M10×1,25×45");
        assert_eq!(dims.diameter_mm, Some(10.0));
        assert_eq!(dims.pitch_mm, Some(1.25));
        assert_eq!(dims.length_mm, Some(45.0));
    }

    #[test]
    fn test_metric_thread_two_numbers() {
        let dims = parse_dimensions("DIN933 M8×25");
        assert_eq!(dims.diameter_mm, Some(8.0));
        assert_eq!(dims.length_mm, Some(25.0));
        assert_eq!(dims.pitch_mm, None);
    }

    #[test]
    fn test_separator_variants() {
        for sep in ["×", "x", "*", " x "] {
            let text = format!("M6{sep}30 8.8 verzinkt");
            let dims = parse_dimensions(&text);
            assert_eq!(dims.diameter_mm, Some(6.0), "separator {sep:?}");
            assert_eq!(dims.length_mm, Some(30.0), "separator {sep:?}");
        }
    }

    #[test]
    fn test_diameter_and_length_tokens() {
        let dims = parse_dimensions("AlMg3-Flansch Ø40 L20");
        assert_eq!(dims.diameter_mm, Some(40.0));
        assert_eq!(dims.length_mm, Some(20.0));
    }

    #[test]
    fn test_d_equals_token() {
        let dims = parse_dimensions("Bolzen D=12 L=30");
        assert_eq!(dims.diameter_mm, Some(12.0));
        assert_eq!(dims.length_mm, Some(30.0));
    }

    #[test]
    fn test_thread_only() {
        let dims = parse_dimensions("DIN934-A2-70-M10");
        assert_eq!(dims.diameter_mm, Some(10.0));
        assert_eq!(dims.length_mm, None);
    }

    #[test]
    fn test_zero_is_clamped_to_one() {
        let dims = parse_dimensions("0x0");
        assert_eq!(dims.diameter_mm, Some(1.0));
        assert_eq!(dims.length_mm, Some(1.0));
    }

    #[test]
    fn test_oversize_is_clamped() {
        let dims = parse_dimensions("Ø99999 L99999");
        assert_eq!(dims.diameter_mm, Some(2000.0));
        assert_eq!(dims.length_mm, Some(5000.0));
    }

    #[test]
    fn test_no_dimensions() {
        let dims = parse_dimensions("Sechskantmutter verzinkt");
        assert_eq!(dims, Dimensions::default());
    }
}

//! Quantity parsing and rounding shared by every stock calculation.

/// Slack allowed when comparing a requested quantity against a PO balance.
pub const EPSILON: f64 = 0.001;

/// Rounds to one decimal place, the precision every stored quantity uses.
#[must_use]
pub fn round1(value: f64) -> f64 {
    let rounded = (value * 10.0).round() / 10.0;
    // Avoid storing -0.0
    if rounded == 0.0 { 0.0 } else { rounded }
}

/// Parses a user-entered quantity.
///
/// Every character that is not an ASCII digit or `.` is dropped first, so
/// `"30 bags"` reads as `30`. Returns `None` when nothing numeric remains or
/// the remainder is not a number.
#[must_use]
pub fn parse_quantity(raw: &str) -> Option<f64> {
    let cleaned: String = raw
        .chars()
        .filter(|c| c.is_ascii_digit() || *c == '.')
        .collect();
    if cleaned.is_empty() {
        return None;
    }
    cleaned
        .parse::<f64>()
        .ok()
        .filter(|q| q.is_finite())
        .map(round1)
}

/// Checks that a typed quantity is finite and strictly positive.
#[must_use]
pub fn is_positive_quantity(quantity: f64) -> bool {
    quantity.is_finite() && quantity > 0.0
}

#[cfg(test)]
mod tests {
    #![allow(clippy::float_cmp)]
    use super::*;

    #[test]
    fn test_round1() {
        assert_eq!(round1(70.04), 70.0);
        assert_eq!(round1(0.1 + 0.2), 0.3);
        assert_eq!(round1(-0.04), 0.0);
        assert!(round1(-0.04).is_sign_positive());
    }

    #[test]
    fn test_parse_quantity_strips_units() {
        assert_eq!(parse_quantity("30"), Some(30.0));
        assert_eq!(parse_quantity(" 12.5 MT"), Some(12.5));
        assert_eq!(parse_quantity("1,200"), Some(1200.0));
        assert_eq!(parse_quantity("0"), Some(0.0));
    }

    #[test]
    fn test_parse_quantity_rejects_garbage() {
        assert_eq!(parse_quantity(""), None);
        assert_eq!(parse_quantity("bags"), None);
        assert_eq!(parse_quantity("1.2.3"), None);
        assert_eq!(parse_quantity("."), None);
    }

    #[test]
    fn test_minus_sign_is_stripped() {
        // Negative quantities cannot be expressed
        assert_eq!(parse_quantity("-5"), Some(5.0));
    }

    #[test]
    fn test_is_positive_quantity() {
        assert!(is_positive_quantity(0.5));
        assert!(!is_positive_quantity(0.0));
        assert!(!is_positive_quantity(-1.0));
        assert!(!is_positive_quantity(f64::NAN));
        assert!(!is_positive_quantity(f64::INFINITY));
    }
}

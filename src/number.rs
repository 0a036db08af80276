//! All-or-nothing number parsing.
//!
//! `"12abc"` must classify as a string, not an integer with trailing junk,
//! so parsing here either consumes the *entire* slice as a number or
//! reports failure — there is no partial-parse result. Rust's `FromStr`
//! impls for `i64` and `f64` already have exactly that contract (no
//! leading/trailing whitespace stripping, no partial success), so this
//! module is a thin, well-documented wrapper rather than a hand-rolled
//! grammar.

/// Parses `s` as an `i64` if and only if the whole slice is a valid
/// integer literal (optional leading `+`/`-`, then one or more digits).
/// Empty input and any leading/trailing whitespace both fail.
pub fn parse_int64(s: &str) -> Option<i64> {
    if s.is_empty() {
        return None;
    }
    s.parse::<i64>().ok()
}

/// Parses `s` as an `f64` if and only if the whole slice is a valid
/// floating point literal. Empty input fails.
pub fn parse_float64(s: &str) -> Option<f64> {
    if s.is_empty() {
        return None;
    }
    s.parse::<f64>().ok()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_plain_integers() {
        assert_eq!(parse_int64("123"), Some(123));
        assert_eq!(parse_int64("-123"), Some(-123));
        assert_eq!(parse_int64("+123"), Some(123));
        assert_eq!(parse_int64("0"), Some(0));
    }

    #[test]
    fn rejects_non_integers() {
        assert_eq!(parse_int64(""), None);
        assert_eq!(parse_int64("12abc"), None);
        assert_eq!(parse_int64("12.0"), None);
        assert_eq!(parse_int64(" 12"), None);
        assert_eq!(parse_int64("12 "), None);
        assert_eq!(parse_int64("++1"), None);
    }

    #[test]
    fn parses_floats() {
        assert_eq!(parse_float64("5.0"), Some(5.0));
        assert_eq!(parse_float64("-2.2"), Some(-2.2));
        assert_eq!(parse_float64("69E-01"), Some(6.9));
        assert_eq!(parse_float64("4.20E+2"), Some(420.0));
        assert_eq!(parse_float64("5"), Some(5.0));
    }

    #[test]
    fn rejects_non_floats() {
        assert_eq!(parse_float64(""), None);
        assert_eq!(parse_float64("five"), None);
        assert_eq!(parse_float64("1.2.3"), None);
        assert_eq!(parse_float64(" 1.2"), None);
    }
}

//! Numeric field parsing.

use std::num::ParseFloatError;

/// Parse a float field after trimming surrounding whitespace.
pub fn parse_float(text: &str) -> Result<f64, ParseFloatError> {
    text.trim().parse()
}

/// Parse a float field, falling back to `default` on malformed input.
/// Front ends that need the failure recorded go through
/// [`crate::ParseReport`] instead.
pub fn parse_float_or(text: &str, default: f64) -> f64 {
    parse_float(text).unwrap_or(default)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn trims_before_parsing() {
        assert_eq!(parse_float(" 2.5 ").unwrap(), 2.5);
        assert!(parse_float("two").is_err());
    }

    #[test]
    fn fallback_substitutes_default() {
        assert_eq!(parse_float_or("-1e3", 0.0), -1000.0);
        assert_eq!(parse_float_or("", 0.0), 0.0);
        assert_eq!(parse_float_or("3..0", 7.0), 7.0);
    }
}

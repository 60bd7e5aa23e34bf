use std::sync::LazyLock;

use regex::Regex;

static NUMBER: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\d+(?:[.,]\d+)?").expect("rating pattern is valid"));

pub const MAX_RATING: f64 = 5.0;

/// Parse a rating from labels like "5 stars", "Rated 4.0 out of 5" or "4/5".
///
/// The first number in the label is the rating. Values outside `0..=5` are
/// rejected rather than clamped.
pub fn parse_rating(label: &str) -> Option<f64> {
    let found = NUMBER.find(label)?;
    let value: f64 = found.as_str().replace(',', ".").parse().ok()?;
    (0.0..=MAX_RATING).contains(&value).then_some(value)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_star_labels() {
        assert_eq!(parse_rating("5 stars"), Some(5.0));
        assert_eq!(parse_rating(" 1 star "), Some(1.0));
    }

    #[test]
    fn test_decimal_labels() {
        assert_eq!(parse_rating("Rated 4.5 out of 5"), Some(4.5));
        assert_eq!(parse_rating("3,5 Sterne"), Some(3.5));
    }

    #[test]
    fn test_fraction_label() {
        assert_eq!(parse_rating("4/5"), Some(4.0));
    }

    #[test]
    fn test_rejects_out_of_range() {
        assert_eq!(parse_rating("128 reviews"), None);
    }

    #[test]
    fn test_no_number() {
        assert_eq!(parse_rating("Excellent"), None);
        assert_eq!(parse_rating(""), None);
    }
}

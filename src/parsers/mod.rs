use html_escape::decode_html_entities;
use once_cell::sync::Lazy;
use regex::Regex;

static COMMENT_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"<!--.*?-->").expect("Invalid comment regex"));

static DIGIT_RUN_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"\d+").expect("Invalid digit-run regex"));

/// Clean and normalize element text: decode HTML entities, strip embedded
/// comment markers, collapse whitespace runs to single spaces, trim.
pub fn clean_text(text: &str) -> String {
    let decoded = decode_html_entities(text);
    let stripped = COMMENT_RE.replace_all(&decoded, "");
    stripped
        .split_whitespace()
        .collect::<Vec<_>>()
        .join(" ")
}

/// Parse a displayed price like "12 345 ₽" by keeping only the digits.
/// Rouble prices are integer-granular; the amount is still carried as f64.
pub fn parse_price_text(text: &str) -> Option<f64> {
    let digits: String = text.chars().filter(|c| c.is_ascii_digit()).collect();
    if digits.is_empty() {
        return None;
    }
    digits.parse::<f64>().ok()
}

/// Parse a rating like "4.7"; anything unparsable is treated as absent.
pub fn parse_rating_text(text: &str) -> Option<f64> {
    text.trim().parse::<f64>().ok()
}

/// Pull the first run of digits out of a review-count blurb like
/// "127 отзывов".
pub fn parse_review_count(text: &str) -> Option<u32> {
    DIGIT_RUN_RE.find(text)?.as_str().parse::<u32>().ok()
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn clean_text_strips_comments_and_collapses_whitespace() {
        assert_eq!(
            clean_text("  Ноутбук<!-- promo -->  ASUS \n VivoBook  "),
            "Ноутбук ASUS VivoBook"
        );
    }

    #[test]
    fn clean_text_decodes_entities() {
        assert_eq!(clean_text("Tom &amp; Jerry"), "Tom & Jerry");
    }

    #[test]
    fn price_keeps_only_digits() {
        assert_eq!(parse_price_text("12 345 ₽"), Some(12345.0));
        assert_eq!(parse_price_text("1 299 990 ₽"), Some(1299990.0));
    }

    #[test]
    fn price_without_digits_is_absent() {
        assert_eq!(parse_price_text("Цена по запросу"), None);
        assert_eq!(parse_price_text(""), None);
    }

    #[test]
    fn rating_parses_trimmed_float() {
        assert_eq!(parse_rating_text(" 4.7 "), Some(4.7));
    }

    #[test]
    fn rating_parse_failure_is_absent() {
        assert_eq!(parse_rating_text("n/a"), None);
    }

    #[test]
    fn review_count_takes_first_digit_run() {
        assert_eq!(parse_review_count("127 отзывов"), Some(127));
        assert_eq!(parse_review_count("отзывов: 8"), Some(8));
    }

    #[test]
    fn review_count_without_digits_is_absent() {
        assert_eq!(parse_review_count("нет отзывов пока"), None);
    }
}

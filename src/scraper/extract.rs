use once_cell::sync::Lazy;
use scraper::{Html, Selector};
use tracing::warn;

use crate::models::ScrapeResult;
use crate::parsers::{clean_text, parse_price_text, parse_rating_text, parse_review_count};

static TITLE_SELECTOR: Lazy<Selector> =
    Lazy::new(|| Selector::parse("h1#card_main_title").expect("Invalid title selector"));

static PRICE_SELECTOR: Lazy<Selector> = Lazy::new(|| {
    Selector::parse("div.card-content-total-price__current").expect("Invalid price selector")
});

static RATING_SELECTOR: Lazy<Selector> = Lazy::new(|| {
    Selector::parse("span.card-head-reviews-rating__value").expect("Invalid rating selector")
});

static REVIEWS_SELECTOR: Lazy<Selector> = Lazy::new(|| {
    Selector::parse("div.card-head-reviews-info__value").expect("Invalid reviews selector")
});

fn element_text(document: &Html, selector: &Selector) -> Option<String> {
    document
        .select(selector)
        .next()
        .map(|el| el.text().collect::<String>())
}

/// Extract product fields from a fetched page. Each field is looked up
/// independently; a missing element or unparsable value leaves that field
/// absent and never blocks the remaining fields.
pub fn extract_product(html: &str) -> ScrapeResult {
    let document = Html::parse_document(html);
    let mut result = ScrapeResult::default();

    match element_text(&document, &TITLE_SELECTOR) {
        Some(text) => {
            let name = clean_text(&text);
            if name.is_empty() {
                warn!("title element is empty");
            } else {
                result.name = Some(name);
            }
        }
        None => warn!("title element not found"),
    }

    match element_text(&document, &PRICE_SELECTOR) {
        Some(text) => match parse_price_text(&text) {
            Some(price) => result.price = Some(price),
            None => warn!(text = %clean_text(&text), "no digits in price text"),
        },
        None => warn!("current-price element not found"),
    }

    match element_text(&document, &RATING_SELECTOR) {
        Some(text) => match parse_rating_text(&text) {
            Some(rating) => result.rating = Some(rating),
            None => warn!(text = %clean_text(&text), "rating text did not parse"),
        },
        None => warn!("rating element not found"),
    }

    match element_text(&document, &REVIEWS_SELECTOR) {
        Some(text) => match parse_review_count(&text) {
            Some(count) => result.review_count = Some(count),
            None => warn!(text = %clean_text(&text), "no digits in review count"),
        },
        None => warn!("review-count element not found"),
    }

    result
}

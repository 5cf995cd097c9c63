#![allow(dead_code)]

use price_monitor::config::Settings;

/// Product page markup with the structural elements the extractor looks for.
pub fn product_page(title: &str, price: &str, rating: &str, reviews: &str) -> String {
    format!(
        r#"<html><body>
        <h1 id="card_main_title">{title}</h1>
        <div class="card-head-reviews">
            <span class="card-head-reviews-rating__value">{rating}</span>
            <div class="card-head-reviews-info__value">{reviews}</div>
        </div>
        <div class="card-content-total-price__current">{price}</div>
        </body></html>"#
    )
}

pub fn empty_page() -> String {
    "<html><body><p>товар не найден</p></body></html>".to_string()
}

pub fn test_settings() -> Settings {
    Settings {
        fetch_timeout_secs: 5,
        retry_backoff_secs: 0,
        ..Settings::default()
    }
}

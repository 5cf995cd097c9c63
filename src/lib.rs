pub mod config;
pub mod manager;
pub mod models;
pub mod monitor;
pub mod parsers;
pub mod scraper;
pub mod storage;

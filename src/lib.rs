//! jobscrape: concurrent scraper for paginated job listings
//!
//! Crawls a fixed number of result pages from a job-listing site. Each page
//! is handled by one worker in a bounded pool: fetch the listing HTML, parse
//! out job cards, resolve each card's reference to a lookup key, pull the
//! full job record from the detail API, and persist it as pretty-printed
//! JSON under a per-page output directory.

pub mod config;
pub mod scrape;

pub use config::Config;

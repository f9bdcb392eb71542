//! Scraping subsystem: the concurrent crawl-and-fetch pipeline
//!
//! A dispatcher enqueues one task per listing page onto a bounded queue and a
//! fixed pool of workers drains it. Each worker runs a strictly sequential
//! pipeline per task: fetch the listing page, parse its job cards, then for
//! each card resolve the lookup key, fetch the full job record, and persist
//! it under the page's output directory.
//!
//! Key components:
//! - `listing`: job-card parsing and lookup-key resolution
//! - `fetcher`: the `JobApi` trait and its reqwest-backed `JobClient`
//! - `writer`: filename sanitization and artifact persistence
//! - `pipeline`: worker pool, dispatcher, and failure policy

pub mod fetcher;
pub mod listing;
pub mod pipeline;
pub mod writer;

pub use fetcher::{FetchError, JobApi, JobClient, JobDetail};
pub use listing::{JobStub, MalformedReference};
pub use pipeline::{CrawlStats, Dispatcher, FailurePolicy, ScrapeTask};
pub use writer::ArtifactWriter;

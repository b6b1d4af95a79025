//! Accident chart crawler
//!
//! Collects cases from the public fault-ratio chart pages and hands them to
//! the case store writer.

pub mod crawler;
pub mod parser;

pub use crawler::{CaseCrawler, CrawlReport, HttpFetcher, PageFetcher};
pub use parser::{case_code, case_url, CaseSelectors, PageFetch, NOT_FOUND_MARKER};

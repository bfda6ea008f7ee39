//! Crawler module: the fetch/extract/match pipeline and the batch loop
//!
//! This module contains the core scraping logic, including:
//! - HTTP fetching with retry, backoff and proxy support
//! - Declarative field extraction and exact-match evaluation
//! - The per-identifier item pipeline
//! - Chunked, concurrency-bounded, resumable batch scheduling

mod extract;
mod fetcher;
mod matcher;
mod pipeline;
mod scheduler;

pub use extract::{element_text, extract_field};
pub use fetcher::{
    build_http_client, FetchResponse, Fetcher, ProxyCheck, IP_CHECK_URL, USER_AGENT,
};
pub use matcher::is_exact_match;
pub use pipeline::{resolve_product_url, ItemPipeline};
pub use scheduler::{
    is_valid_identifier, BatchOptions, BatchScheduler, ItemEvent, RunObserver, RunReport,
    SilentObserver,
};

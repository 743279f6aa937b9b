//! Scraper infrastructure
//!
//! The rate-limited HTTP client shared by every scraper, the comment
//! normalization step, the registry that syncs discovered scrapers to the
//! database, and the in-tree site scrapers.

pub mod base;
pub mod bilibili;
pub mod http;
pub mod normalize;
pub mod registry;
pub mod tencent;

pub use base::ScraperBase;
pub use http::{RateLimitedClient, SessionHandler};
pub use normalize::normalize_comments;
pub use registry::ScraperRegistry;

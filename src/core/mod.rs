//! Core business logic abstractions

pub mod config;
pub mod error;
pub mod log;
pub mod rate;
pub mod source;
pub mod store;

// Re-export main types for cleaner imports
pub use error::{Error, Result};
pub use rate::{Quote, RateRecord, RateView};
pub use source::RateSource;
pub use store::{RatePage, RateStore};

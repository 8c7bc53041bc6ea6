//! Core domain concepts shared across all subdomains.
//!
//! - [`query::Query`]: raw user text with cache-key and token views
//! - [`error::DomainError`]: domain-level errors

pub mod error;
pub mod query;

pub mod aggregate;
pub mod config;
pub mod dataset;
pub mod error;
pub mod filter;
pub mod join;
pub mod metrics;
pub mod record;
pub mod summary;

pub mod cache;
pub mod error;
pub mod loader;
pub mod parse;

pub use cache::DatasetCache;
pub use error::LoadError;
pub use loader::{business_from_reader, load_dataset, platform_from_reader, SourceFiles};

pub mod breakdown;
pub mod export;
pub mod health;
pub mod query;
pub mod reload;
pub mod summary;
pub mod tables;

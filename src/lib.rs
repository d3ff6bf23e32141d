// Library for tests to access modules

pub mod config;
pub mod conversions;
pub mod domain_cache;
pub mod error;
pub mod fields;
pub mod input;
pub mod licensing;
pub mod meter;
pub mod models;
pub mod reading;
pub mod report;
pub mod summary;
pub mod telemetry;
pub mod time_range;
pub mod version;

pub mod metals_service;
pub mod quote;
pub mod response_cache;
pub mod series;

pub use metals_service::MetalsService;
pub use response_cache::{CacheState, CacheStats, CacheStatus, ResponseCache};

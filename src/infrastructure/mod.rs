pub mod fx_client;
pub mod http;
pub mod resilience;
pub mod stooq_client;

pub use fx_client::FxRateClient;
pub use http::build_http_client;
pub use resilience::RetryPolicy;
pub use stooq_client::StooqClient;

use utoipa::OpenApi;

#[derive(OpenApi)]
#[openapi(
    paths(
        crate::api::handlers::health_handler,
        crate::api::handlers::metrics_handler,
        crate::api::handlers::metals_handler,
        crate::api::handlers::metal_handler
    ),
    components(
        schemas(
            crate::api::handlers::HealthResponse,
            crate::application::CacheState,
            crate::application::CacheStats,
            crate::domain::MetalSymbol,
            crate::domain::PricePoint,
            crate::domain::QuoteSample,
            crate::domain::ConvertedQuote,
            crate::domain::AggregatePayload,
            crate::domain::SymbolQuotePayload,
            crate::domain::ErrorPayload
        )
    ),
    tags(
        (name = "system", description = "System endpoints for health checks and metrics"),
        (name = "metals", description = "Precious metal quotes with FX conversion")
    ),
    info(
        title = "Metals Quote Gateway",
        version = "0.1.0",
        description = "Aggregates USD FX rates and daily gold, silver and platinum series into one cached JSON payload."
    )
)]
pub struct ApiDoc;

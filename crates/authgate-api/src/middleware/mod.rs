//! HTTP 미들웨어.

pub mod cors;
pub mod error_funnel;
pub mod rate_limit;

pub use cors::cors_layer;
pub use error_funnel::{error_funnel, panic_response, ErrorFunnel};
pub use rate_limit::{rate_limit_middleware, RateLimitConfig, RateLimitState, RateLimiter};

//! Provider policies: request pacing, token persistence and count tiers.

pub mod quantize;
pub mod throttle;
pub mod token_cache;

pub use quantize::quantize_count;
pub use throttle::Throttle;
pub use token_cache::TokenCache;

//! Rate limiting logic and state management.

mod endpoint;
mod limiter;
mod window;

pub use endpoint::EndpointLimiter;
pub use limiter::{Decision, RateLimiter};
pub use window::SlidingWindow;

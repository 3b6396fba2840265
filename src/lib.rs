//! Tollgate - In-Process Request Rate Limiting
//!
//! This crate implements sliding-window request rate limiting for HTTP
//! services: a process-wide dual-window (minute and hour) limiter keyed by
//! client identity, a lighter single-window limiter for gating expensive
//! endpoint categories, and an axum/tower middleware that turns rejections
//! into structured 429 responses with a `Retry-After` hint.

pub mod clock;
pub mod config;
pub mod error;
pub mod http;
pub mod ratelimit;

//! HTTP middleware components.
//!
//! Middleware run before route handlers and can short-circuit requests,
//! e.g. reject callers without a valid session.

/// Session bearer-token authentication
pub mod auth;

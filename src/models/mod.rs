//! Data models representing database entities.
//!
//! This module contains all data structures that map to database tables,
//! along with the JSON request and response bodies built from them.

/// Outbound email records
pub mod notification;
/// Bank transaction model
pub mod transaction;
/// Users, addresses and bank accounts
pub mod user;

//! API handlers.

pub mod billing;
pub mod health;
pub mod rewrite;
pub mod usage;
pub mod users;
pub mod webhooks;

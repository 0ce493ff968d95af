//! Request handlers, one module per endpoint group.

pub mod analyze;
pub mod health;
pub mod metrics;

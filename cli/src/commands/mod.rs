//! Command handlers — wire infrastructure adapters into application
//! services.

pub mod cleanup;
pub mod deploy;

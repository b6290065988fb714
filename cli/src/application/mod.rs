//! Application layer — orchestration services and the ports they consume.

pub mod ports;
pub mod services;

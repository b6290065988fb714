//! Topology orchestration — the three supported deployment patterns.
//!
//! Each pattern is a fixed pipeline of stages. Stage transitions are
//! strictly sequential: a stage's inputs are the previous stage's outputs.
//! Concurrency exists only within a stage, via `try_join_all`, which joins
//! every member or returns the first error and drops the rest. There is no
//! rollback on partial failure — the operator runs `stratus cleanup`.

pub mod cluster;
pub mod gatekeeper;
pub mod standalone;

/// Database server port.
pub const MYSQL_PORT: u16 = 3306;
/// Reverse-proxy application port.
pub const PROXY_PORT: u16 = 9000;
/// Trusted-host application port.
pub const TRUSTED_HOST_PORT: u16 = 8000;
/// Public gatekeeper application port.
pub const GATEKEEPER_PORT: u16 = 3000;

//! Application services — deployment use-cases composed from ports.

pub mod cleanup;
pub mod compute;
pub mod provision;
pub mod retry;
pub mod topology;
pub mod trust;

#[cfg(test)]
pub mod test_support;

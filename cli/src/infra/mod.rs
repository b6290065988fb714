//! Infrastructure layer — adapters implementing `application::ports`
//! against the real platform: the aws CLI, OpenSSH, and embedded templates.

pub mod command_runner;
pub mod ec2;
pub mod ssh;
pub mod templates;

pub mod commands;
pub mod init;
pub mod session;

pub use commands::{Cli, Commands};

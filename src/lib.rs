pub mod cli;
pub mod config;
pub mod errors;
pub mod reporting;
pub mod session;
pub mod target;

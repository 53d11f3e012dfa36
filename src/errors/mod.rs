pub mod types;

pub use types::SqlsentryError;

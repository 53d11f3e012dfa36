pub mod parser;
pub mod schema;
pub mod types;

pub use types::*;
pub use parser::{load_targets_file, parse_config, parse_header, parse_method};

pub mod dumper;

pub use dumper::{select_dumper, Dumper};

//! JSON output for resolved documents

mod json;

pub use json::{to_json_string, to_json_value, DEFAULT_INDENT};

//! Path parsing and resolution.

pub mod parser;
pub mod resolver;

pub use parser::{PathPart, is_numeric_bracket, parse_path};
pub use resolver::{resolve_path, unfold};

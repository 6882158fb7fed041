//! Record formatting: the percent-placeholder scanner and the ANSI color helper
//! behind the level prefix tables.

mod color;
mod scanner;

pub use color::Color;
pub use scanner::{FormatError, PlaceholderSpec, Rendered, Segment, Template, Value, Verb};

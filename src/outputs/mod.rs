//! Output shaping and writing.
//!
//! # Submodules
//!
//! - [`normalize`]: maps scraped listings onto the uniform article schema
//! - [`json`]: writes any result as pretty JSON to stdout or a file

pub mod json;
pub mod normalize;

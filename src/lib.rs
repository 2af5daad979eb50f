pub mod catalog;
pub mod cli;
pub mod config;
pub mod document;
pub mod error;
pub mod manifest;
pub mod plan;
pub mod section;
pub mod splitter;
pub mod util;

pub use error::SplitError;

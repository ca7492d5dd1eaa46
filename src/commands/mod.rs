//! Command implementations for the sift CLI.

pub mod count;
pub mod generate;
pub mod select;

pub use count::{CountCommand, CountStats};
pub use generate::{GenerateCommand, GenerateStats};
pub use select::{SelectCommand, SelectStats};

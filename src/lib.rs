pub mod demo;
pub mod error;
pub mod sorter;
pub mod trace;

// Re-export main types and functions
pub use error::SortError;
pub use sorter::*;
pub use trace::*;

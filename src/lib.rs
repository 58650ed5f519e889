pub mod cli;
pub mod mosaic;

pub use mosaic::*;

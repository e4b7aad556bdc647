pub mod battery;
pub mod types;

pub use battery::*;
pub use types::*;

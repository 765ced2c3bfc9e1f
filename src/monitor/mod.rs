pub mod guardian;
pub mod types;

pub use guardian::*;
pub use types::*;

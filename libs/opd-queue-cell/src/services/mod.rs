pub mod registry;
pub mod allocation;
pub mod sweeper;

pub use registry::*;
pub use allocation::*;
pub use sweeper::*;

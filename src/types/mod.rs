pub mod change;
pub mod node;

pub use change::*;
pub use node::*;

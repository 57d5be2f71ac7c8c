pub mod diff;
pub mod parser;
pub mod query;
pub mod store;

pub use diff::*;
pub use parser::*;
pub use query::*;
pub use store::*;

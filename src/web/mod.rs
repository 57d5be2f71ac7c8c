pub mod api;
pub mod server;
pub mod state;

pub use server::start_server;
pub use state::{AppState, Workspace};

pub mod config;
pub mod detect;
pub mod error;
pub mod metrics;
pub mod server;
pub mod state;

pub use error::ApiError;
pub use server::{router, run_server};
pub use state::AppState;

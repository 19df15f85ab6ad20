pub mod config;
mod content_routes;
mod errors;
mod http_layers;
mod search;
mod session;
pub mod state;
pub mod server;
mod user_routes;

pub use config::ServerConfig;
pub use http_layers::*;
pub use server::{make_app, run_server};
pub use session::Session;

pub mod auth;
pub mod config;
pub mod error;
pub mod handlers;
pub mod middleware;
pub mod rate_limiter;
pub mod response;
pub mod server;
pub mod store;
pub mod validation;
pub mod verification;

pub use config::Config;
pub use error::ApiError;
pub use handlers::AppState;
pub use server::{create_app, Server};

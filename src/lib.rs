pub mod cache;
pub mod config;
pub mod config_validator;
pub mod error;
pub mod fanout;
pub mod handlers;
pub mod health;
pub mod key_generator;
pub mod maps_service;
pub mod metrics;
pub mod middleware;
pub mod models;
pub mod rate_limiter;
pub mod response;
pub mod server;
pub mod token_bucket;
pub mod upstream;
pub mod validation;

pub use config::Config;
pub use error::{MapsError, Result};
pub use maps_service::MapsService;
pub use response::ApiResponse;
pub use server::create_app;

//! Backend-for-frontend gateway for the meme pipeline.

pub mod config;
pub mod http;
pub mod lifecycle;
pub mod observability;
pub mod picture;
pub mod upstream;

pub use config::schema::BffConfig;
pub use http::HttpServer;
pub use lifecycle::Shutdown;

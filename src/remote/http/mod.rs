mod client;
mod config;

pub use client::{HttpSessionApi, encode_uri_component};
pub use config::ApiConfig;

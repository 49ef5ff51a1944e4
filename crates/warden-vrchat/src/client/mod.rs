//! HTTP implementation of the remote API.

mod config;
mod http;

pub use config::ClientConfig;
pub use http::{HttpApi, HttpConnector};

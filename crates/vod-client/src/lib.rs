//! VOD service client.
//!
//! Async HTTP client using `reqwest`, authenticated with an `X-Auth-Token`
//! header. Implements [`vodup_uploader::RemoteProtocolClient`].

pub mod client;
pub mod config;

pub use client::{Error, HuaweiVodClient};
pub use config::ClientConfig;

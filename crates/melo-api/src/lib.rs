// melo-api: Async Rust client for the melo device discovery API

pub mod client;
pub mod error;
pub mod transport;
pub mod types;

pub use client::DeviceClient;
pub use error::Error;
pub use transport::{TlsMode, TransportConfig};
pub use types::{DeviceResponse, InterfaceResponse};

/// Public endpoint of the hosted discovery service.
pub const DEFAULT_API_URL: &str = "https://api.melo.re";

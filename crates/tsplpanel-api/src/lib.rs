// tsplpanel-api: Async Rust client for the local USB printer agent

pub mod client;
pub mod error;
pub mod models;
pub mod transport;

pub use client::AgentClient;
pub use error::Error;
pub use models::{
    Binding, BindRequest, BindResponse, Device, DevicesResponse, DriverArgs, IdentityResponse,
    PrintRequest, PrintResponse,
};
pub use transport::{TlsMode, TransportConfig};

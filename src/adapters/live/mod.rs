//! Live adapters that talk to real external systems.

pub mod http;
pub mod identity;

pub use http::LiveTransport;
pub use identity::ThreadNameIdentity;

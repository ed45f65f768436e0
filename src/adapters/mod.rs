//! Adapter implementations of the port traits.

pub mod canned;
pub mod intercept;
pub mod live;

pub use canned::CannedTransport;
pub use intercept::Interceptor;
pub use live::{LiveTransport, ThreadNameIdentity};

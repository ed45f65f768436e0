//! Port traits defining external boundaries.
//!
//! Each trait represents a collaborator the cassette engine talks to but does
//! not own: the HTTP transport, the interception boundary wrapped around it,
//! and the test framework's notion of the current test.
//! Implementations live in `src/adapters/`.

pub mod boundary;
pub mod identity;
pub mod transport;

pub use boundary::{
    BodyPattern, ExchangeObserver, InterceptionBoundary, MockDefinition, MockResponse,
    RequestPattern, ResponseRewrite, ValuePattern,
};
pub use identity::{IdentitySource, TestIdentity};
pub use transport::{HttpRequest, HttpResponse, HttpTransport, TransportFuture};

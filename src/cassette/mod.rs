//! Cassettes: recorded HTTP interactions keyed by test, and the sessions
//! that record and replay them.

pub mod format;
pub mod normalize;
pub mod recorder;
pub mod replayer;
pub mod session;
pub mod store;

pub use format::{CassetteFile, Interaction};
pub use session::{Session, SessionMode, SessionReport, Vcr, VcrOptions};
pub use store::{cassette_path_for, CassetteStore, CassetteTarget, LoadState, PutOutcome};

//! Serialized CLI session and blocking command execution.
//!
//! This crate wraps an asynchronous per-device CLI transport in the
//! blocking, strictly sequential execution contract the rest of the
//! engine relies on:
//!
//! - [`Cli`]: the transport capability an integration supplies — one per
//!   managed device, already authenticated and in the correct CLI mode
//! - [`CliSession`]: serializes all commands for one device, enforces a
//!   deadline per round-trip, and classifies responses against the
//!   device family's error patterns
//! - [`DeviceProfile`] / [`ErrorPatterns`]: per-family rejection regexes
//!   supplied as data, not code
//!
//! A command is submitted exactly once per invocation: a timeout or a
//! device rejection is surfaced to the caller, which may retry at a
//! higher level, but the session itself never re-issues.

mod error;
mod profile;
mod session;
mod transport;

pub use error::{SessionError, SessionResult};
pub use profile::{DeviceProfile, ErrorPatterns};
pub use session::CliSession;
pub use transport::{Cli, TransportError};

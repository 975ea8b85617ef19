//! Handler registry and reconciliation dispatcher.
//!
//! This crate binds vendor adapters to the engine and drives one
//! reconciliation transaction at a time:
//!
//! - [`Reader`] / [`Writer`] / [`Check`]: the capability traits a vendor
//!   adapter implements — independent interfaces, no inheritance chains
//! - [`HandlerRegistration`] / [`RegistryBuilder`] / [`Registry`]:
//!   explicit, build-once binding of path patterns to handlers with
//!   declared ordering edges; cycles are rejected at build time
//! - [`Dispatcher`]: collect → order → check → invoke → aggregate over
//!   one transaction
//!
//! The registration call surface is the only API the vendor layer uses;
//! the engine calls handlers, never the reverse.
//!
//! # Partial application
//!
//! The dispatcher stops the current ordered batch on the first failure
//! and reports it with the path, operation kind, and cause. There is no
//! rollback primitive: commands already executed stay executed, and the
//! [`ApplyReport`] tells the caller exactly how far the transaction got
//! so it can re-read device state and reconcile.

mod dispatcher;
mod error;
mod handler;
mod registry;
mod transaction;

pub use dispatcher::Dispatcher;
pub use error::{DispatchError, ReadError, RegistryError, WriteError};
pub use handler::{Check, Reader, Writer};
pub use registry::{HandlerRegistration, Registry, RegistryBuilder};
pub use transaction::{ApplyReport, Change, ChangeKind, Transaction};

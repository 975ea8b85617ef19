//! Integration test infrastructure for the unicli engine.
//!
//! Provides the pieces every engine test needs:
//!
//! - [`MockCli`]: a scripted transport double that records every issued
//!   command
//! - [`fixtures`]: ConfigNode builders for common interface/VLAN
//!   scenarios plus ready-made sessions
//! - [`adapters`]: small reference Reader/Writer implementations used by
//!   the integration suites

pub mod adapters;
pub mod fixtures;
mod mock;

pub use mock::MockCli;

/// Initializes test logging; safe to call from every test.
pub fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "debug".into()),
        )
        .with_test_writer()
        .try_init();
}

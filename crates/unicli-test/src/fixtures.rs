//! Test fixtures for common reconciliation scenarios.

use crate::MockCli;
use std::sync::Arc;
use std::time::Duration;
use unicli_model::ConfigNode;
use unicli_session::{CliSession, DeviceProfile, ErrorPatterns};

/// Interface subtree fixtures.
pub mod interface_fixtures {
    use super::*;

    /// An Ethernet interface with the default configuration.
    pub fn ethernet(name: &str) -> ConfigNode {
        ethernet_with_mtu(name, 9100)
    }

    /// An Ethernet interface with a custom MTU.
    pub fn ethernet_with_mtu(name: &str, mtu: u64) -> ConfigNode {
        ConfigNode::builder()
            .field("name", name)
            .field("mtu", mtu)
            .field("enabled", true)
            .build()
            .expect("fixture node is well-formed")
    }

    /// An administratively-down interface.
    pub fn ethernet_disabled(name: &str) -> ConfigNode {
        ConfigNode::builder()
            .field("name", name)
            .field("mtu", 9100u64)
            .field("enabled", false)
            .build()
            .expect("fixture node is well-formed")
    }
}

/// VLAN subtree fixtures.
pub mod vlan_fixtures {
    use super::*;

    /// A named VLAN.
    pub fn vlan(id: u16, name: &str) -> ConfigNode {
        ConfigNode::builder()
            .field("vlan-id", id)
            .field("name", name)
            .build()
            .expect("fixture node is well-formed")
    }

    /// A VLAN with member ports.
    pub fn vlan_with_members(id: u16, name: &str, members: &[&str]) -> ConfigNode {
        let mut builder = ConfigNode::builder().field("vlan-id", id).field("name", name);
        for member in members {
            builder = builder.child(
                format!("member[{member}]"),
                ConfigNode::builder()
                    .field("port", *member)
                    .build()
                    .expect("fixture node is well-formed"),
            );
        }
        builder.build().expect("fixture node is well-formed")
    }
}

/// An IOS-style device profile with the usual rejection markers.
pub fn ios_profile() -> DeviceProfile {
    DeviceProfile {
        family: "ios".to_string(),
        error_patterns: vec![
            r"(?m)^% Invalid input".to_string(),
            r"(?m)^% Incomplete command".to_string(),
            r"(?m)^% Error".to_string(),
        ],
        deadline_ms: 2_000,
    }
}

/// A session over a mock transport with no rejection patterns.
pub fn session(cli: Arc<MockCli>) -> CliSession {
    CliSession::new(cli, ErrorPatterns::none("test"), Duration::from_secs(2))
}

/// A session over a mock transport classifying IOS rejection text.
pub fn ios_session(cli: Arc<MockCli>) -> CliSession {
    let profile = ios_profile();
    let patterns = profile.compile().expect("fixture profile compiles");
    CliSession::new(cli, patterns, Duration::from_millis(profile.deadline_ms))
}

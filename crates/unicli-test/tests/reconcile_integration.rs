//! End-to-end reconciliation scenarios against a mock transport.

use std::sync::Arc;

use async_trait::async_trait;
use pretty_assertions::assert_eq;
use tokio_util::sync::CancellationToken;

use unicli_dispatch::{
    Change, ChangeKind, DispatchError, Dispatcher, HandlerRegistration, RegistryBuilder,
    Transaction, WriteError, Writer,
};
use unicli_model::{ConfigNode, Path};
use unicli_session::{CliSession, SessionError};
use unicli_test::adapters::{reference_registry, vlan_pattern, VlanWriter};
use unicli_test::fixtures::{interface_fixtures, ios_session, session, vlan_fixtures};
use unicli_test::{init_tracing, MockCli};

/// Interface + VLAN scenario
///
/// Scenario:
/// 1. One transaction creates a VLAN and the interface it references
/// 2. The VLAN registration declares `run_after` the interface one
/// 3. The interface block must hit the device first, every time
#[tokio::test]
async fn test_interface_configured_before_vlan() {
    init_tracing();
    let cli = Arc::new(MockCli::new());
    let dispatcher = Dispatcher::new(Arc::new(reference_registry()));

    // The VLAN change is declared first on purpose.
    let transaction = Transaction::new()
        .with_change(Change::create(
            "/vlans/vlan[100]".parse().unwrap(),
            vlan_fixtures::vlan(100, "servers"),
        ))
        .with_change(Change::create(
            "/interfaces/interface[eth0]".parse().unwrap(),
            interface_fixtures::ethernet("eth0"),
        ));

    let report = dispatcher
        .apply(&session(cli.clone()), &transaction, &CancellationToken::new())
        .await;

    assert!(report.is_success());
    assert_eq!(
        cli.commands(),
        vec![
            "interface eth0",
            "mtu 9100",
            "exit",
            "vlan 100",
            "name servers",
            "exit",
        ]
    );
}

/// Dispatcher ordering is stable across repeated runs with the same
/// input set.
#[tokio::test]
async fn test_apply_order_is_deterministic() {
    init_tracing();
    let dispatcher = Dispatcher::new(Arc::new(reference_registry()));

    let transaction = Transaction::new()
        .with_change(Change::create(
            "/vlans/vlan[20]".parse().unwrap(),
            vlan_fixtures::vlan(20, "voice"),
        ))
        .with_change(Change::create(
            "/interfaces/interface[eth1]".parse().unwrap(),
            interface_fixtures::ethernet_with_mtu("eth1", 1500),
        ))
        .with_change(Change::create(
            "/vlans/vlan[10]".parse().unwrap(),
            vlan_fixtures::vlan(10, "data"),
        ));

    let mut first_run: Option<Vec<String>> = None;
    for _ in 0..5 {
        let cli = Arc::new(MockCli::new());
        let report = dispatcher
            .apply(&session(cli.clone()), &transaction, &CancellationToken::new())
            .await;
        assert!(report.is_success());
        match &first_run {
            None => first_run = Some(cli.commands()),
            Some(expected) => assert_eq!(&cli.commands(), expected),
        }
    }
}

/// A writer whose check declines is never invoked; with no other
/// registration taking the path, the report lists it as unhandled.
#[tokio::test]
async fn test_declined_check_is_unhandled_not_error() {
    init_tracing();
    let cli = Arc::new(MockCli::new());
    let registry = RegistryBuilder::new()
        .register(
            HandlerRegistration::new(vlan_pattern())
                .with_writer(Arc::new(VlanWriter))
                // Only applies inside an L3 instance, which this is not.
                .check_fn(|_, _, after| {
                    after
                        .and_then(|n| n.get_str("type"))
                        .is_some_and(|t| t == "L3VRF")
                }),
        )
        .build()
        .unwrap();

    let transaction = Transaction::new().with_change(Change::create(
        "/vlans/vlan[100]".parse().unwrap(),
        vlan_fixtures::vlan(100, "servers"),
    ));

    let report = Dispatcher::new(Arc::new(registry))
        .apply(&session(cli.clone()), &transaction, &CancellationToken::new())
        .await;

    assert!(report.is_success());
    assert!(report.applied.is_empty());
    assert_eq!(report.unhandled, vec!["/vlans/vlan[100]".parse().unwrap()]);
    assert!(cli.commands().is_empty());
}

/// Writer that tags its commands, standing in for a legacy variant of
/// the same subtree.
struct LegacyVlanWriter;

#[async_trait]
impl Writer for LegacyVlanWriter {
    async fn create(
        &self,
        path: &Path,
        _after: &ConfigNode,
        session: &CliSession,
    ) -> Result<(), WriteError> {
        session
            .execute_write(
                &format!("set vlans {}", path.key_of("vlan").unwrap_or_default()),
                path,
            )
            .await?;
        Ok(())
    }

    async fn update(
        &self,
        path: &Path,
        _before: &ConfigNode,
        _after: &ConfigNode,
        session: &CliSession,
    ) -> Result<(), WriteError> {
        session.execute_write("set vlans", path).await?;
        Ok(())
    }

    async fn delete(
        &self,
        path: &Path,
        _before: &ConfigNode,
        session: &CliSession,
    ) -> Result<(), WriteError> {
        session.execute_write("delete vlans", path).await?;
        Ok(())
    }
}

/// A declined check lets a different registration take over the same
/// path.
#[tokio::test]
async fn test_declined_check_falls_through_to_next_registration() {
    init_tracing();
    let cli = Arc::new(MockCli::new());
    let registry = RegistryBuilder::new()
        .register(
            HandlerRegistration::new(vlan_pattern())
                .with_writer(Arc::new(VlanWriter))
                .check_fn(|_, _, _| false),
        )
        .register(
            HandlerRegistration::new(vlan_pattern()).with_writer(Arc::new(LegacyVlanWriter)),
        )
        .build()
        .unwrap();

    let transaction = Transaction::new().with_change(Change::create(
        "/vlans/vlan[200]".parse().unwrap(),
        vlan_fixtures::vlan(200, "mgmt"),
    ));

    let report = Dispatcher::new(Arc::new(registry))
        .apply(&session(cli.clone()), &transaction, &CancellationToken::new())
        .await;

    assert!(report.is_success());
    assert_eq!(
        report.applied,
        vec![("/vlans/vlan[200]".parse().unwrap(), ChangeKind::Create)]
    );
    assert!(report.unhandled.is_empty());
    assert_eq!(cli.commands(), vec!["set vlans 200"]);
}

/// Device rejection scenario
///
/// Scenario:
/// 1. The transport accepts the channel exchange but the device answers
///    with an IOS rejection marker
/// 2. The executor classifies the response and fails the writer
/// 3. The batch stops; nothing is rolled back
#[tokio::test]
async fn test_device_rejection_stops_batch() {
    init_tracing();
    let cli = Arc::new(
        MockCli::new().respond("mtu 99999", "% Invalid input detected at '^' marker."),
    );
    let dispatcher = Dispatcher::new(Arc::new(reference_registry()));

    let transaction = Transaction::new()
        .with_change(Change::create(
            "/interfaces/interface[eth0]".parse().unwrap(),
            interface_fixtures::ethernet_with_mtu("eth0", 99_999),
        ))
        .with_change(Change::create(
            "/vlans/vlan[100]".parse().unwrap(),
            vlan_fixtures::vlan(100, "servers"),
        ));

    let report = dispatcher
        .apply(&ios_session(cli.clone()), &transaction, &CancellationToken::new())
        .await;

    assert!(!report.is_success());
    // The interface block was entered, the bad line rejected, and the
    // dependent VLAN never attempted.
    assert_eq!(cli.commands(), vec!["interface eth0", "mtu 99999"]);
    assert_eq!(report.aborted, vec!["/vlans/vlan[100]".parse::<Path>().unwrap()]);

    let failure = report.failure.expect("rejection fails the batch");
    assert_eq!(failure.operation(), "create");
    match failure {
        DispatchError::CreateFailed {
            source: WriteError::Session(SessionError::DeviceRejected { command, response }),
            ..
        } => {
            assert_eq!(command, "mtu 99999");
            assert!(response.contains("% Invalid input"));
        }
        other => panic!("unexpected failure: {other:?}"),
    }
}

/// A hanging transport surfaces a timeout, not a rejection, and the
/// caller may retry.
#[tokio::test(start_paused = true)]
async fn test_transport_timeout_is_retryable() {
    init_tracing();
    let cli = Arc::new(MockCli::new().hang_on("interface eth0"));
    let dispatcher = Dispatcher::new(Arc::new(reference_registry()));

    let transaction = Transaction::new().with_change(Change::create(
        "/interfaces/interface[eth0]".parse().unwrap(),
        interface_fixtures::ethernet("eth0"),
    ));

    let report = dispatcher
        .apply(&session(cli.clone()), &transaction, &CancellationToken::new())
        .await;

    let failure = report.failure.expect("timeout fails the batch");
    match failure {
        DispatchError::CreateFailed {
            source: WriteError::Session(SessionError::TransportTimeout { command, .. }),
            ..
        } => assert_eq!(command, "interface eth0"),
        other => panic!("unexpected failure: {other:?}"),
    }
}

/// Reading walks containers before their children and grafts each
/// populated subtree into one tree.
#[tokio::test]
async fn test_read_populates_tree_from_show_output() {
    init_tracing();
    let cli = Arc::new(
        MockCli::new()
            .respond(
                "show running-config interfaces",
                "interface eth0\n mtu 9100\n!\ninterface eth1\n mtu 1500\n!\n",
            )
            .respond("show vlan", "vlan 100 name servers\nvlan 200\n"),
    );
    let dispatcher = Dispatcher::new(Arc::new(reference_registry()));

    let tree = dispatcher
        .read(&session(cli.clone()), &Path::root(), &CancellationToken::new())
        .await
        .unwrap();

    let eth0 = tree
        .subtree(&"/interfaces/interface[eth0]".parse().unwrap())
        .expect("eth0 was read");
    assert_eq!(eth0.get_str("name"), Some("eth0"));
    assert_eq!(eth0.get_uint("mtu"), Some(9100));

    let eth1 = tree
        .subtree(&"/interfaces/interface[eth1]".parse().unwrap())
        .expect("eth1 was read");
    assert_eq!(eth1.get_uint("mtu"), Some(1500));

    let vlan100 = tree
        .subtree(&"/vlans/vlan[100]".parse().unwrap())
        .expect("vlan 100 was read");
    assert_eq!(vlan100.get_uint("vlan-id"), Some(100));
    assert_eq!(vlan100.get_str("name"), Some("servers"));

    // VLAN 200 has no name; only the id field is populated.
    let vlan200 = tree
        .subtree(&"/vlans/vlan[200]".parse().unwrap())
        .expect("vlan 200 was read");
    assert!(!vlan200.has_field("name"));

    assert_eq!(
        cli.commands(),
        vec!["show running-config interfaces", "show vlan"]
    );
}

/// Concurrency across devices is unconstrained: two sessions reconcile
/// in parallel without shared state beyond the frozen registry.
#[tokio::test]
async fn test_two_devices_reconcile_independently() {
    init_tracing();
    let registry = Arc::new(reference_registry());
    let mut tasks = Vec::new();

    for device in 0..2 {
        let registry = registry.clone();
        tasks.push(tokio::spawn(async move {
            let cli = Arc::new(MockCli::new());
            let dispatcher = Dispatcher::new(registry);
            let transaction = Transaction::new().with_change(Change::create(
                format!("/interfaces/interface[eth{device}]").parse().unwrap(),
                interface_fixtures::ethernet(&format!("eth{device}")),
            ));
            let report = dispatcher
                .apply(&session(cli.clone()), &transaction, &CancellationToken::new())
                .await;
            assert!(report.is_success());
            cli.commands()
        }));
    }

    let logs: Vec<Vec<String>> = futures_join(tasks).await;
    assert_eq!(logs[0][0], "interface eth0");
    assert_eq!(logs[1][0], "interface eth1");
}

async fn futures_join(tasks: Vec<tokio::task::JoinHandle<Vec<String>>>) -> Vec<Vec<String>> {
    let mut out = Vec::new();
    for task in tasks {
        out.push(task.await.unwrap());
    }
    out
}

/// Deleting an interface renders the removal command, not a config
/// block.
#[tokio::test]
async fn test_delete_renders_removal_line() {
    init_tracing();
    let cli = Arc::new(MockCli::new());
    let dispatcher = Dispatcher::new(Arc::new(reference_registry()));

    let transaction = Transaction::new().with_change(Change::remove(
        "/interfaces/interface[eth0]".parse().unwrap(),
        interface_fixtures::ethernet("eth0"),
    ));

    let report = dispatcher
        .apply(&session(cli.clone()), &transaction, &CancellationToken::new())
        .await;

    assert!(report.is_success());
    assert_eq!(cli.commands(), vec!["no interface eth0"]);
}

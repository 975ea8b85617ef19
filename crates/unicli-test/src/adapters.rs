//! Reference adapters used by the integration suites.
//!
//! These are deliberately small but real: the writers render through
//! the template language and issue through the session, the readers
//! fetch and extract through the session and the field extractor —
//! exactly the shape a vendor adapter takes.

use async_trait::async_trait;
use once_cell::sync::Lazy;
use std::sync::Arc;
use unicli_dispatch::{
    HandlerRegistration, ReadError, Reader, Registry, RegistryBuilder, WriteError, Writer,
};
use unicli_extract::{extract_first, NamedPattern};
use unicli_model::{CommandBatch, ConfigNode, ConfigNodeBuilder, Path};
use unicli_session::CliSession;
use unicli_template::{Bindings, DiffPair, Template};

static IFACE_ENTER: Lazy<Template> =
    Lazy::new(|| Template::parse("interface {$name}\n").expect("static template parses"));

static IFACE_BODY: Lazy<Template> = Lazy::new(|| {
    Template::parse(
        "{$data|update(mtu,mtu `mtu`\n,no mtu\n)}\
         {$data|update(description,description `description`\n,no description\n)}",
    )
    .expect("static template parses")
});

static IFACE_DELETE: Lazy<Template> =
    Lazy::new(|| Template::parse("no interface {$name}\n").expect("static template parses"));

static VLAN_ENTER: Lazy<Template> =
    Lazy::new(|| Template::parse("vlan {$id}\n").expect("static template parses"));

static VLAN_BODY: Lazy<Template> = Lazy::new(|| {
    Template::parse("{$data|update(name,name `name`\n,no name\n)}")
        .expect("static template parses")
});

static VLAN_DELETE: Lazy<Template> =
    Lazy::new(|| Template::parse("no vlan {$id}\n").expect("static template parses"));

static IFACE_LINE: Lazy<NamedPattern> = Lazy::new(|| {
    NamedPattern::new("interface-line", r"(?m)^interface (?P<name>\S+)$")
        .expect("static pattern compiles")
});

static IFACE_MTU_LINE: Lazy<NamedPattern> = Lazy::new(|| {
    NamedPattern::new("interface-mtu", r"(?m)^\s+mtu (?P<mtu>\d+)$")
        .expect("static pattern compiles")
});

static VLAN_LINE: Lazy<NamedPattern> = Lazy::new(|| {
    NamedPattern::new("vlan-line", r"(?m)^vlan (?P<id>\d+)(?: name (?P<name>\S+))?$")
        .expect("static pattern compiles")
});

/// Issues every line of an enter/body/exit block, skipping the block
/// entirely when the body rendered empty — no context commands for a
/// no-op transition.
async fn issue_block(
    enter: &Template,
    body: &Template,
    bindings: &Bindings,
    path: &Path,
    session: &CliSession,
) -> Result<(), WriteError> {
    let rendered_body = body.render(bindings)?;
    if rendered_body.is_empty() {
        return Ok(());
    }
    let mut batch = CommandBatch::new();
    batch.push_rendered(&enter.render(bindings)?, -1);
    batch.push_rendered(&rendered_body, 0);
    batch.push_rendered("exit", 1);
    for line in batch.into_lines() {
        session.execute_write(&line, path).await?;
    }
    Ok(())
}

/// Writer for `/interfaces/interface` covering mtu and description.
pub struct InterfaceWriter;

impl InterfaceWriter {
    fn bindings(path: &Path, pair: DiffPair) -> Bindings {
        let name = path.key_of("interface").unwrap_or_default().to_string();
        Bindings::new().bind("name", name).bind("data", pair)
    }
}

#[async_trait]
impl Writer for InterfaceWriter {
    async fn create(
        &self,
        path: &Path,
        after: &ConfigNode,
        session: &CliSession,
    ) -> Result<(), WriteError> {
        let bindings = Self::bindings(path, DiffPair::create(after.clone()));
        issue_block(&IFACE_ENTER, &IFACE_BODY, &bindings, path, session).await
    }

    async fn update(
        &self,
        path: &Path,
        before: &ConfigNode,
        after: &ConfigNode,
        session: &CliSession,
    ) -> Result<(), WriteError> {
        let bindings = Self::bindings(path, DiffPair::modify(before.clone(), after.clone()));
        issue_block(&IFACE_ENTER, &IFACE_BODY, &bindings, path, session).await
    }

    async fn delete(
        &self,
        path: &Path,
        before: &ConfigNode,
        session: &CliSession,
    ) -> Result<(), WriteError> {
        let bindings = Self::bindings(path, DiffPair::remove(before.clone()));
        for line in IFACE_DELETE.render(&bindings)?.lines() {
            session.execute_write(line, path).await?;
        }
        Ok(())
    }
}

/// Writer for `/vlans/vlan` covering the VLAN name.
pub struct VlanWriter;

impl VlanWriter {
    fn bindings(path: &Path, pair: DiffPair) -> Bindings {
        let id = path.key_of("vlan").unwrap_or_default().to_string();
        Bindings::new().bind("id", id).bind("data", pair)
    }
}

#[async_trait]
impl Writer for VlanWriter {
    async fn create(
        &self,
        path: &Path,
        after: &ConfigNode,
        session: &CliSession,
    ) -> Result<(), WriteError> {
        let bindings = Self::bindings(path, DiffPair::create(after.clone()));
        issue_block(&VLAN_ENTER, &VLAN_BODY, &bindings, path, session).await
    }

    async fn update(
        &self,
        path: &Path,
        before: &ConfigNode,
        after: &ConfigNode,
        session: &CliSession,
    ) -> Result<(), WriteError> {
        let bindings = Self::bindings(path, DiffPair::modify(before.clone(), after.clone()));
        issue_block(&VLAN_ENTER, &VLAN_BODY, &bindings, path, session).await
    }

    async fn delete(
        &self,
        path: &Path,
        before: &ConfigNode,
        session: &CliSession,
    ) -> Result<(), WriteError> {
        let bindings = Self::bindings(path, DiffPair::remove(before.clone()));
        for line in VLAN_DELETE.render(&bindings)?.lines() {
            session.execute_write(line, path).await?;
        }
        Ok(())
    }
}

/// Reader for `/interfaces`: one child per configured interface.
pub struct InterfaceReader;

#[async_trait]
impl Reader for InterfaceReader {
    async fn read(
        &self,
        path: &Path,
        session: &CliSession,
        builder: &mut ConfigNodeBuilder,
    ) -> Result<(), ReadError> {
        let output = session
            .execute_read("show running-config interfaces", path)
            .await?;

        // Blocks terminated by a bang line, IOS-style.
        for block in output.split("!\n") {
            let Some(name) =
                extract_first(block, &IFACE_LINE, |m| Ok(m.req_str("name")?.to_string()))?
            else {
                continue;
            };
            let mut node = ConfigNode::builder().field("name", name.clone());
            if let Some(mtu) = extract_first(block, &IFACE_MTU_LINE, |m| m.req_u64("mtu"))? {
                node = node.field("mtu", mtu);
            }
            builder.set_child(format!("interface[{name}]"), node.build()?);
        }
        Ok(())
    }
}

/// Reader for `/vlans`: one child per configured VLAN.
pub struct VlanReader;

#[async_trait]
impl Reader for VlanReader {
    async fn read(
        &self,
        path: &Path,
        session: &CliSession,
        builder: &mut ConfigNodeBuilder,
    ) -> Result<(), ReadError> {
        let output = session.execute_read("show vlan", path).await?;

        for line in output.lines() {
            let Some((id, name)) = extract_first(line, &VLAN_LINE, |m| {
                Ok((m.req_u16("id")?, m.opt_str("name").map(str::to_string)))
            })?
            else {
                continue;
            };
            let mut node = ConfigNode::builder().field("vlan-id", id);
            if let Some(name) = name {
                node = node.field("name", name);
            }
            builder.set_child(format!("vlan[{id}]"), node.build()?);
        }
        Ok(())
    }
}

/// The registry the integration suites run against: interfaces before
/// VLANs on writes, interfaces and VLANs read at their containers.
pub fn reference_registry() -> Registry {
    RegistryBuilder::new()
        .register(
            HandlerRegistration::new(iface_container()).with_reader(Arc::new(InterfaceReader)),
        )
        .register(HandlerRegistration::new(iface_pattern()).with_writer(Arc::new(InterfaceWriter)))
        .register(HandlerRegistration::new(vlan_container()).with_reader(Arc::new(VlanReader)))
        .register(
            HandlerRegistration::new(vlan_pattern())
                .with_writer(Arc::new(VlanWriter))
                .run_after(iface_pattern()),
        )
        .build()
        .expect("reference registry is a DAG")
}

/// `/interfaces` container path.
pub fn iface_container() -> Path {
    "/interfaces".parse().expect("static path parses")
}

/// `/interfaces/interface` wildcard pattern.
pub fn iface_pattern() -> Path {
    "/interfaces/interface".parse().expect("static path parses")
}

/// `/vlans` container path.
pub fn vlan_container() -> Path {
    "/vlans".parse().expect("static path parses")
}

/// `/vlans/vlan` wildcard pattern.
pub fn vlan_pattern() -> Path {
    "/vlans/vlan".parse().expect("static path parses")
}

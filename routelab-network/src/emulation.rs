use routelab_core::{
    EmulationDriver, ExecOutput, NetError, NetworkNode, NodeHandle, NodeKind, NodeLogger,
    Provisionable, Result, Topology,
};
use std::collections::HashMap;
use std::sync::Arc;
use tracing::{debug, info, warn};
use uuid::Uuid;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EmulationState {
    Declared,
    Running,
    Stopped,
}

/// Materializes a declared topology through an external driver and runs the
/// node lifecycle hooks: `configure()` at start, `terminate()` at stop.
///
/// One instance drives one run. Starting creates every node, then every
/// link, then configures nodes in declaration order; stopping is
/// best-effort and attempts every teardown step before reporting the union
/// of failures.
pub struct Emulation {
    id: Uuid,
    topology: Topology,
    driver: Arc<dyn EmulationDriver>,
    handles: HashMap<String, Arc<dyn NodeHandle>>,
    provisioners: HashMap<String, Box<dyn Provisionable>>,
    state: EmulationState,
}

impl Emulation {
    pub fn new(topology: Topology, driver: Arc<dyn EmulationDriver>) -> Self {
        let provisioners = topology
            .nodes
            .iter()
            .map(|node| {
                (
                    node.name.clone(),
                    crate::provision::provisioner_for(node.kind),
                )
            })
            .collect();

        Self {
            id: Uuid::new_v4(),
            topology,
            driver,
            handles: HashMap::new(),
            provisioners,
            state: EmulationState::Declared,
        }
    }

    pub fn id(&self) -> Uuid {
        self.id
    }

    pub fn state(&self) -> EmulationState {
        self.state
    }

    pub fn topology(&self) -> &Topology {
        &self.topology
    }

    pub async fn start(&mut self) -> Result<()> {
        if self.state != EmulationState::Declared {
            return Err(NetError::ProtocolViolation(format!(
                "start() on an emulation in state {:?}",
                self.state
            )));
        }

        info!(id = %self.id, driver = self.driver.name(), "starting emulation");

        for node in &self.topology.nodes {
            let handle = match node.kind {
                NodeKind::Switch => self.driver.create_switch(node).await?,
                NodeKind::Router | NodeKind::Host => self.driver.create_node(node).await?,
            };
            self.handles.insert(node.name.clone(), handle);
        }

        for link in &self.topology.links {
            self.driver.create_link(link).await?;
        }

        for node in &self.topology.nodes {
            let handle = self
                .handles
                .get(&node.name)
                .cloned()
                .ok_or_else(|| NetError::DriverError {
                    operation: "start".to_string(),
                    cause: format!("driver returned no handle for {}", node.name),
                })?;

            let result = match self.provisioners.get_mut(&node.name) {
                Some(provisioner) => provisioner.configure(handle.as_ref()).await,
                None => Ok(()),
            };

            if let Err(err) = result {
                warn!(node = %node.name, %err, "configuration failed, attempting cleanup");
                if let Some(provisioner) = self.provisioners.get_mut(&node.name) {
                    if let Err(cleanup) = provisioner.terminate(handle.as_ref()).await {
                        warn!(node = %node.name, %cleanup, "cleanup after failure also failed");
                    }
                }
                return Err(err);
            }

            if node.kind == NodeKind::Router {
                self.journal(node, "configured").await;
            }
        }

        self.state = EmulationState::Running;
        info!(id = %self.id, "emulation running");
        Ok(())
    }

    /// Tears down whatever exists: terminate hooks, links, nodes, in that
    /// order. Runs every step even when earlier ones fail and reports the
    /// union of failures. Safe to call whether or not `start()` succeeded.
    pub async fn stop(&mut self) -> Result<()> {
        if self.state == EmulationState::Stopped {
            return Ok(());
        }

        info!(id = %self.id, "stopping emulation");
        let mut failures = Vec::new();

        for node in &self.topology.nodes {
            let Some(handle) = self.handles.get(&node.name).cloned() else {
                continue;
            };
            if let Some(provisioner) = self.provisioners.get_mut(&node.name) {
                if let Err(err) = provisioner.terminate(handle.as_ref()).await {
                    failures.push(format!("{}: {err}", node.name));
                }
            }
            if node.kind == NodeKind::Router {
                self.journal(node, "terminated").await;
            }
        }

        for link in &self.topology.links {
            if self.handles.contains_key(&link.a.node) && self.handles.contains_key(&link.b.node) {
                if let Err(err) = self.driver.remove_link(link).await {
                    failures.push(format!(
                        "link {}:{} - {}:{}: {err}",
                        link.a.node, link.a.interface, link.b.node, link.b.interface
                    ));
                }
            }
        }

        for node in self.topology.nodes.iter().rev() {
            if self.handles.contains_key(&node.name) {
                if let Err(err) = self.driver.destroy_node(&node.name).await {
                    failures.push(format!("{}: {err}", node.name));
                }
            }
        }

        self.handles.clear();
        self.state = EmulationState::Stopped;

        if failures.is_empty() {
            Ok(())
        } else {
            Err(NetError::ProvisioningFailure {
                operation: "emulation teardown".to_string(),
                cause: failures.join("; "),
            })
        }
    }

    /// Runs an inspection command on a live node, e.g. printing the
    /// router's routing table.
    pub async fn exec(&self, node: &str, command: &str) -> Result<ExecOutput> {
        if self.state != EmulationState::Running {
            return Err(NetError::ProtocolViolation(format!(
                "exec() on an emulation in state {:?}",
                self.state
            )));
        }
        let handle = self.handles.get(node).ok_or_else(|| NetError::DriverError {
            operation: "exec".to_string(),
            cause: format!("unknown node {node}"),
        })?;
        handle.exec(command).await
    }

    /// Appends a lifecycle event to the node's log file. The journal is an
    /// observability aid; an unwritable log directory never fails a run.
    async fn journal(&self, node: &NetworkNode, event: &str) {
        let logger = NodeLogger::new(node.name.clone());
        let entry = format!("{event} (run {})", self.id);
        let written = async {
            logger.init().await?;
            logger.info(&entry).await
        }
        .await;
        if let Err(err) = written {
            debug!(node = %node.name, %err, "node journal unavailable");
        }
    }
}

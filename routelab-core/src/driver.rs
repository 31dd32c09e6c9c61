use async_trait::async_trait;
use std::sync::Arc;

use crate::error::Result;
use crate::types::{Link, NetworkNode};

/// Result of running a command line on an emulated node. A non-zero exit
/// status signals failure; stderr is folded into `stdout` by the driver.
#[derive(Debug, Clone)]
pub struct ExecOutput {
    pub stdout: String,
    pub status: i32,
}

impl ExecOutput {
    pub fn success(&self) -> bool {
        self.status == 0
    }
}

/// A live node inside a running emulation. Handles are owned by the driver
/// for as long as the node is up; callers only issue narrow configuration
/// actions through them.
#[async_trait]
pub trait NodeHandle: Send + Sync {
    fn name(&self) -> &str;

    /// Runs a command line in the node's network namespace.
    async fn exec(&self, command: &str) -> Result<ExecOutput>;

    /// Binds a pre-existing, externally provided interface to this node. The
    /// node does not create the interface.
    async fn attach_interface(&self, name: &str) -> Result<()>;
}

/// The emulation engine seam. Implementations create virtual interfaces,
/// switches and namespaces and wire links together; this crate only declares
/// what to build and drives the lifecycle hooks.
#[async_trait]
pub trait EmulationDriver: Send + Sync {
    async fn create_node(&self, node: &NetworkNode) -> Result<Arc<dyn NodeHandle>>;
    async fn create_switch(&self, node: &NetworkNode) -> Result<Arc<dyn NodeHandle>>;
    async fn create_link(&self, link: &Link) -> Result<()>;
    async fn remove_link(&self, link: &Link) -> Result<()>;
    async fn destroy_node(&self, name: &str) -> Result<()>;
    fn name(&self) -> &str;
}

/// Start-of-life and end-of-life hooks a node kind may carry. Only routers
/// do real work; switches and hosts take the no-op defaults.
#[async_trait]
pub trait Provisionable: Send + Sync {
    async fn configure(&mut self, _node: &dyn NodeHandle) -> Result<()> {
        Ok(())
    }

    async fn terminate(&mut self, _node: &dyn NodeHandle) -> Result<()> {
        Ok(())
    }
}

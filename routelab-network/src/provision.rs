use async_trait::async_trait;
use routelab_core::{
    NetError, NodeHandle, NodeKind, PortRedirect, Protocol, Provisionable, Result,
};
use std::net::{Ipv4Addr, SocketAddrV4};
use std::time::Duration;
use tokio::time::timeout;
use tracing::{debug, info, warn};

use crate::builder::UPLINK_IFACE;

/// Inbound IMAPS traffic is handed to the proxy on the s3 host. The target
/// is a literal, not derived from the address plan; changing it is a
/// topology redefinition.
pub const IMAPS_REDIRECT: PortRedirect = PortRedirect {
    protocol: Protocol::Tcp,
    listen_port: 993,
    target: SocketAddrV4::new(Ipv4Addr::new(10, 0, 0, 100), 1030),
};

/// Upper bound on dynamic address acquisition so an unresponsive uplink
/// cannot hang provisioning.
const ACQUIRE_TIMEOUT: Duration = Duration::from_secs(30);

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RouterState {
    Unconfigured,
    Configured,
    Terminated,
}

/// Start-of-life and end-of-life network-stack configuration for the router
/// node. Strictly ordered, no retries: a failed step rolls back whatever was
/// already applied and surfaces the error, after which the caller may retry
/// from scratch.
///
/// The router owns its rule namespace exclusively, so teardown flushes the
/// whole nat and filter tables instead of removing rules one by one.
pub struct RouterProvisioner {
    state: RouterState,
    uplink: String,
    redirect: PortRedirect,
    acquire_timeout: Duration,
}

impl RouterProvisioner {
    pub fn new() -> Self {
        Self {
            state: RouterState::Unconfigured,
            uplink: UPLINK_IFACE.to_string(),
            redirect: IMAPS_REDIRECT,
            acquire_timeout: ACQUIRE_TIMEOUT,
        }
    }

    pub fn with_acquire_timeout(acquire_timeout: Duration) -> Self {
        Self {
            acquire_timeout,
            ..Self::new()
        }
    }

    pub fn state(&self) -> RouterState {
        self.state
    }

    async fn run(node: &dyn NodeHandle, operation: &str, command: &str) -> Result<()> {
        debug!(node = node.name(), command, "exec");
        let output = node.exec(command).await?;
        if output.success() {
            Ok(())
        } else {
            Err(NetError::ProvisioningFailure {
                operation: operation.to_string(),
                cause: format!(
                    "`{command}` exited with status {}: {}",
                    output.status,
                    output.stdout.trim()
                ),
            })
        }
    }

    async fn apply(&self, node: &dyn NodeHandle) -> Result<()> {
        // Safe to repeat if forwarding is already on.
        Self::run(node, "enable ip forwarding", "sysctl net.ipv4.ip_forward=1").await?;

        Self::run(
            node,
            "install masquerade rule",
            &format!(
                "iptables -t nat -A POSTROUTING -o {} -j MASQUERADE",
                self.uplink
            ),
        )
        .await?;

        node.attach_interface(&self.uplink).await?;
        let acquire = format!("dhclient {}", self.uplink);
        debug!(node = node.name(), command = acquire.as_str(), "exec");
        match timeout(self.acquire_timeout, node.exec(&acquire)).await {
            Ok(Ok(output)) if output.success() => {}
            Ok(Ok(output)) => {
                return Err(NetError::ProvisioningFailure {
                    operation: "acquire uplink address".to_string(),
                    cause: format!(
                        "`{acquire}` exited with status {}: {}",
                        output.status,
                        output.stdout.trim()
                    ),
                });
            }
            Ok(Err(err)) => return Err(err),
            Err(_) => {
                return Err(NetError::AcquisitionTimeout {
                    interface: self.uplink.clone(),
                    timeout: self.acquire_timeout,
                });
            }
        }

        Self::run(
            node,
            "install port redirection",
            &format!(
                "iptables -t nat -A PREROUTING -p {} --dport {} -j DNAT --to-destination {}",
                self.redirect.protocol, self.redirect.listen_port, self.redirect.target
            ),
        )
        .await?;

        Ok(())
    }

    /// Best-effort removal of whatever a partial configuration left behind.
    /// Failures here are logged and swallowed; the original error is what
    /// the caller needs to see.
    async fn rollback(&self, node: &dyn NodeHandle) {
        for command in [
            "sysctl net.ipv4.ip_forward=0",
            "iptables -F",
            "iptables -t nat -F",
        ] {
            match node.exec(command).await {
                Ok(output) if output.success() => {}
                Ok(output) => {
                    warn!(
                        node = node.name(),
                        command,
                        status = output.status,
                        "rollback step failed"
                    );
                }
                Err(err) => {
                    warn!(node = node.name(), command, %err, "rollback step failed");
                }
            }
        }
    }
}

impl Default for RouterProvisioner {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl Provisionable for RouterProvisioner {
    async fn configure(&mut self, node: &dyn NodeHandle) -> Result<()> {
        if self.state == RouterState::Configured {
            return Err(NetError::ProtocolViolation(
                "configure() called on an already configured router; terminate() it first"
                    .to_string(),
            ));
        }

        info!(node = node.name(), "configuring router");
        if let Err(err) = self.apply(node).await {
            warn!(node = node.name(), %err, "configuration failed, rolling back");
            self.rollback(node).await;
            return Err(err);
        }

        self.state = RouterState::Configured;
        info!(node = node.name(), "router configured");
        Ok(())
    }

    async fn terminate(&mut self, node: &dyn NodeHandle) -> Result<()> {
        if self.state != RouterState::Configured {
            debug!(node = node.name(), "terminate on unconfigured router");
            return Ok(());
        }

        info!(node = node.name(), "terminating router");
        // Forwarding goes first so no new flows are admitted while the rule
        // tables are being torn down. Every step runs even if one fails.
        let mut failures = Vec::new();
        for (operation, command) in [
            ("disable ip forwarding", "sysctl net.ipv4.ip_forward=0"),
            ("flush filter rules", "iptables -F"),
            ("flush nat rules", "iptables -t nat -F"),
        ] {
            if let Err(err) = Self::run(node, operation, command).await {
                failures.push(err.to_string());
            }
        }

        self.state = RouterState::Terminated;
        if failures.is_empty() {
            Ok(())
        } else {
            Err(NetError::ProvisioningFailure {
                operation: "terminate".to_string(),
                cause: failures.join("; "),
            })
        }
    }
}

/// Switches and hosts carry no start/stop behavior.
struct Passive;

#[async_trait]
impl Provisionable for Passive {}

pub fn provisioner_for(kind: NodeKind) -> Box<dyn Provisionable> {
    match kind {
        NodeKind::Router => Box::new(RouterProvisioner::new()),
        NodeKind::Switch | NodeKind::Host => Box::new(Passive),
    }
}

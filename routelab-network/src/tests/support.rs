use async_trait::async_trait;
use routelab_core::{EmulationDriver, ExecOutput, Link, NetworkNode, NodeHandle, Result};
use std::collections::HashMap;
use std::net::{Ipv4Addr, SocketAddrV4};
use std::sync::{Arc, Mutex};
use std::time::Duration;

/// Address a scripted dhclient run hands out (TEST-NET-3).
pub const UPLINK_LEASE: Ipv4Addr = Ipv4Addr::new(203, 0, 113, 17);

/// Network-stack state of one emulated node, reconstructed from the command
/// lines issued against it.
#[derive(Debug, Clone, Default)]
pub struct StackState {
    pub forwarding: bool,
    pub nat_rules: Vec<String>,
    pub filter_rules: Vec<String>,
    pub attached: Vec<String>,
    pub uplink_address: Option<Ipv4Addr>,
    pub commands: Vec<String>,
}

impl StackState {
    /// Applies the installed DNAT rules to a simulated inbound packet.
    pub fn inbound_target(&self, protocol: &str, dport: u16) -> Option<SocketAddrV4> {
        let proto = format!("-p {protocol}");
        let port = format!("--dport {dport}");
        for rule in &self.nat_rules {
            if rule.starts_with("PREROUTING")
                && rule.contains(&proto)
                && rule.contains(&port)
                && rule.contains("-j DNAT")
            {
                let mut tokens = rule.split_whitespace();
                while let Some(token) = tokens.next() {
                    if token == "--to-destination" {
                        return tokens.next().and_then(|addr| addr.parse().ok());
                    }
                }
            }
        }
        None
    }

    /// Source address a simulated outbound packet leaves with, or `None`
    /// when the node would not forward it at all.
    pub fn outbound_source(&self, src: Ipv4Addr, out_iface: &str) -> Option<Ipv4Addr> {
        if !self.forwarding {
            return None;
        }
        if self.masquerades(out_iface) {
            self.uplink_address
        } else {
            Some(src)
        }
    }

    pub fn masquerades(&self, out_iface: &str) -> bool {
        let iface = format!("-o {out_iface}");
        self.nat_rules
            .iter()
            .any(|rule| rule.starts_with("POSTROUTING") && rule.contains(&iface) && rule.contains("MASQUERADE"))
    }
}

/// Scripted stand-in for a live node: records every exec and interprets the
/// provisioning command lines into a [`StackState`].
pub struct MockNode {
    name: String,
    state: Mutex<StackState>,
    dhcp_delay: Duration,
    fail_on: Option<String>,
}

impl MockNode {
    pub fn new(name: &str) -> Arc<Self> {
        Arc::new(Self {
            name: name.to_string(),
            state: Mutex::new(StackState::default()),
            dhcp_delay: Duration::ZERO,
            fail_on: None,
        })
    }

    /// Every command containing `pattern` exits non-zero.
    pub fn failing_on(name: &str, pattern: &str) -> Arc<Self> {
        Arc::new(Self {
            name: name.to_string(),
            state: Mutex::new(StackState::default()),
            dhcp_delay: Duration::ZERO,
            fail_on: Some(pattern.to_string()),
        })
    }

    /// dhclient takes `delay` to complete, for exercising the acquisition
    /// bound.
    pub fn with_dhcp_delay(name: &str, delay: Duration) -> Arc<Self> {
        Arc::new(Self {
            name: name.to_string(),
            state: Mutex::new(StackState::default()),
            dhcp_delay: delay,
            fail_on: None,
        })
    }

    pub fn snapshot(&self) -> StackState {
        self.state.lock().unwrap().clone()
    }
}

#[async_trait]
impl NodeHandle for MockNode {
    fn name(&self) -> &str {
        &self.name
    }

    async fn exec(&self, command: &str) -> Result<ExecOutput> {
        if let Some(pattern) = &self.fail_on {
            if command.contains(pattern.as_str()) {
                self.state.lock().unwrap().commands.push(command.to_string());
                return Ok(ExecOutput {
                    stdout: format!("{pattern}: operation not permitted"),
                    status: 1,
                });
            }
        }

        if command.starts_with("dhclient ") {
            // The sleep sits outside the lock so a timed-out acquisition
            // leaves no trace of a lease.
            tokio::time::sleep(self.dhcp_delay).await;
            let mut state = self.state.lock().unwrap();
            state.commands.push(command.to_string());
            state.uplink_address = Some(UPLINK_LEASE);
            return Ok(ExecOutput {
                stdout: String::new(),
                status: 0,
            });
        }

        let mut state = self.state.lock().unwrap();
        state.commands.push(command.to_string());
        match command {
            "sysctl net.ipv4.ip_forward=1" => state.forwarding = true,
            "sysctl net.ipv4.ip_forward=0" => state.forwarding = false,
            "iptables -F" => state.filter_rules.clear(),
            "iptables -t nat -F" => state.nat_rules.clear(),
            _ => {
                if let Some(rule) = command.strip_prefix("iptables -t nat -A ") {
                    state.nat_rules.push(rule.to_string());
                } else if let Some(rule) = command.strip_prefix("iptables -A ") {
                    state.filter_rules.push(rule.to_string());
                }
            }
        }

        Ok(ExecOutput {
            stdout: String::new(),
            status: 0,
        })
    }

    async fn attach_interface(&self, name: &str) -> Result<()> {
        self.state.lock().unwrap().attached.push(name.to_string());
        Ok(())
    }
}

/// In-memory driver recording what a real engine would materialize.
#[derive(Default)]
pub struct MockDriver {
    pub nodes: Mutex<Vec<String>>,
    pub switches: Mutex<Vec<String>>,
    pub links: Mutex<Vec<Link>>,
    pub destroyed: Mutex<Vec<String>>,
    handles: Mutex<HashMap<String, Arc<MockNode>>>,
}

impl MockDriver {
    pub fn handle(&self, name: &str) -> Option<Arc<MockNode>> {
        self.handles.lock().unwrap().get(name).cloned()
    }
}

#[async_trait]
impl EmulationDriver for MockDriver {
    async fn create_node(&self, node: &NetworkNode) -> Result<Arc<dyn NodeHandle>> {
        let handle = MockNode::new(&node.name);
        self.nodes.lock().unwrap().push(node.name.clone());
        self.handles
            .lock()
            .unwrap()
            .insert(node.name.clone(), handle.clone());
        Ok(handle)
    }

    async fn create_switch(&self, node: &NetworkNode) -> Result<Arc<dyn NodeHandle>> {
        let handle = MockNode::new(&node.name);
        self.switches.lock().unwrap().push(node.name.clone());
        self.handles
            .lock()
            .unwrap()
            .insert(node.name.clone(), handle.clone());
        Ok(handle)
    }

    async fn create_link(&self, link: &Link) -> Result<()> {
        self.links.lock().unwrap().push(link.clone());
        Ok(())
    }

    async fn remove_link(&self, link: &Link) -> Result<()> {
        self.links.lock().unwrap().retain(|existing| existing != link);
        Ok(())
    }

    async fn destroy_node(&self, name: &str) -> Result<()> {
        self.destroyed.lock().unwrap().push(name.to_string());
        Ok(())
    }

    fn name(&self) -> &str {
        "mock"
    }
}

use ipnetwork::Ipv4Network;
use serde::{Deserialize, Serialize};
use std::collections::{HashSet, VecDeque};
use std::net::{Ipv4Addr, SocketAddrV4};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum NodeKind {
    Router,
    Switch,
    Host,
}

impl std::fmt::Display for NodeKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            NodeKind::Router => write!(f, "router"),
            NodeKind::Switch => write!(f, "switch"),
            NodeKind::Host => write!(f, "host"),
        }
    }
}

/// Where an interface sits in the topology. Switch ports are unnumbered and
/// get their own role; the addressed roles carry the invariants: a
/// `SubnetFacing` interface holds its subnet's gateway address, a
/// `HostFacing` interface holds the host address.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum InterfaceRole {
    Uplink,
    SubnetFacing,
    HostFacing,
    SwitchPort,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Interface {
    pub node: String,
    pub name: String,
    pub address: Option<Ipv4Network>,
    pub role: InterfaceRole,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NetworkNode {
    pub name: String,
    pub kind: NodeKind,
    pub interfaces: Vec<Interface>,
    /// Gateway address hosts route non-local traffic through. Router and
    /// switch nodes carry none.
    pub default_route: Option<Ipv4Addr>,
}

impl NetworkNode {
    pub fn interface(&self, name: &str) -> Option<&Interface> {
        self.interfaces.iter().find(|iface| iface.name == name)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Endpoint {
    pub node: String,
    pub interface: String,
}

/// Unordered pair of (node, interface) endpoints.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Link {
    pub a: Endpoint,
    pub b: Endpoint,
}

impl Link {
    pub fn between(node_a: &str, iface_a: &str, node_b: &str, iface_b: &str) -> Self {
        Self {
            a: Endpoint {
                node: node_a.to_string(),
                interface: iface_a.to_string(),
            },
            b: Endpoint {
                node: node_b.to_string(),
                interface: iface_b.to_string(),
            },
        }
    }

    pub fn peer_of(&self, node: &str) -> Option<&Endpoint> {
        if self.a.node == node {
            Some(&self.b)
        } else if self.b.node == node {
            Some(&self.a)
        } else {
            None
        }
    }
}

/// The declared node/link graph for one emulation instance. Owns its nodes
/// and links; live OS resources only exist once a driver materializes it.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Topology {
    pub nodes: Vec<NetworkNode>,
    pub links: Vec<Link>,
}

impl Topology {
    pub fn node(&self, name: &str) -> Option<&NetworkNode> {
        self.nodes.iter().find(|node| node.name == name)
    }

    pub fn router(&self) -> Option<&NetworkNode> {
        self.nodes.iter().find(|node| node.kind == NodeKind::Router)
    }

    pub fn hosts(&self) -> impl Iterator<Item = &NetworkNode> {
        self.nodes.iter().filter(|node| node.kind == NodeKind::Host)
    }

    pub fn switches(&self) -> impl Iterator<Item = &NetworkNode> {
        self.nodes
            .iter()
            .filter(|node| node.kind == NodeKind::Switch)
    }

    /// Every node is reachable from the router over the link graph.
    pub fn is_connected(&self) -> bool {
        let Some(router) = self.router() else {
            return false;
        };
        let mut visited: HashSet<&str> = HashSet::from([router.name.as_str()]);
        let mut queue: VecDeque<&str> = VecDeque::from([router.name.as_str()]);
        while let Some(current) = queue.pop_front() {
            for link in &self.links {
                if let Some(peer) = link.peer_of(current) {
                    if visited.insert(peer.node.as_str()) {
                        queue.push_back(peer.node.as_str());
                    }
                }
            }
        }
        visited.len() == self.nodes.len()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Protocol {
    Tcp,
    Udp,
}

impl std::fmt::Display for Protocol {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Protocol::Tcp => write!(f, "tcp"),
            Protocol::Udp => write!(f, "udp"),
        }
    }
}

/// Inbound destination-translation rule: traffic arriving on `listen_port`
/// is rewritten to `target`, whatever interface it came in on.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct PortRedirect {
    pub protocol: Protocol,
    pub listen_port: u16,
    pub target: SocketAddrV4,
}

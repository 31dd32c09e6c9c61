use ipnetwork::Ipv4Network;
use serde::{Deserialize, Serialize};
use std::net::Ipv4Addr;
use std::path::Path;
use tracing::debug;

use crate::error::{NetError, Result};

/// One subnet's addressing: the prefix, the router-side gateway address and
/// the single host living in it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SubnetPlan {
    pub id: String,
    pub prefix: Ipv4Network,
    pub gateway: Ipv4Addr,
    pub host: Ipv4Addr,
}

/// Static addressing for a whole emulation run. Pure data; the builder turns
/// it into a node/link graph.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AddressPlan {
    pub subnets: Vec<SubnetPlan>,
}

impl Default for AddressPlan {
    fn default() -> Self {
        Self {
            subnets: vec![
                SubnetPlan {
                    id: "s1".to_string(),
                    prefix: "192.168.1.0/24".parse().expect("static prefix"),
                    gateway: Ipv4Addr::new(192, 168, 1, 1),
                    host: Ipv4Addr::new(192, 168, 1, 100),
                },
                SubnetPlan {
                    id: "s2".to_string(),
                    prefix: "172.16.0.0/12".parse().expect("static prefix"),
                    gateway: Ipv4Addr::new(172, 16, 0, 1),
                    host: Ipv4Addr::new(172, 16, 0, 100),
                },
                SubnetPlan {
                    id: "s3".to_string(),
                    prefix: "10.0.0.0/8".parse().expect("static prefix"),
                    gateway: Ipv4Addr::new(10, 0, 0, 1),
                    host: Ipv4Addr::new(10, 0, 0, 100),
                },
            ],
        }
    }
}

impl AddressPlan {
    /// Checks addressing consistency before any node gets built: gateway and
    /// host must lie inside their prefix, subnet ids must be distinct and
    /// prefixes must not overlap.
    pub fn validate(&self) -> Result<()> {
        let mut seen_ids = std::collections::HashSet::new();
        for subnet in &self.subnets {
            if !seen_ids.insert(subnet.id.as_str()) {
                return Err(NetError::ConfigurationConflict(format!(
                    "duplicate subnet id {}",
                    subnet.id
                )));
            }
            if !subnet.prefix.contains(subnet.gateway) {
                return Err(NetError::ConfigurationConflict(format!(
                    "gateway {} is outside subnet {} ({})",
                    subnet.gateway, subnet.id, subnet.prefix
                )));
            }
            if !subnet.prefix.contains(subnet.host) {
                return Err(NetError::ConfigurationConflict(format!(
                    "host {} is outside subnet {} ({})",
                    subnet.host, subnet.id, subnet.prefix
                )));
            }
            if subnet.gateway == subnet.host {
                return Err(NetError::ConfigurationConflict(format!(
                    "gateway and host collide at {} in subnet {}",
                    subnet.gateway, subnet.id
                )));
            }
        }
        for (index, subnet) in self.subnets.iter().enumerate() {
            for other in &self.subnets[index + 1..] {
                if subnet.prefix.contains(other.prefix.network())
                    || other.prefix.contains(subnet.prefix.network())
                {
                    return Err(NetError::ConfigurationConflict(format!(
                        "subnets {} ({}) and {} ({}) overlap",
                        subnet.id, subnet.prefix, other.id, other.prefix
                    )));
                }
            }
        }
        Ok(())
    }

    pub fn subnet(&self, id: &str) -> Option<&SubnetPlan> {
        self.subnets.iter().find(|subnet| subnet.id == id)
    }

    /// Loads and validates a plan from a YAML file.
    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)?;
        let plan: AddressPlan =
            serde_yaml::from_str(&content).map_err(|e| NetError::ConfigError(e.to_string()))?;
        plan.validate()?;
        debug!(path = %path.display(), subnets = plan.subnets.len(), "loaded address plan");
        Ok(plan)
    }

    /// Loads from `path` when given, otherwise falls back to the built-in
    /// three-subnet plan.
    pub fn load_or_default(path: Option<&Path>) -> Result<Self> {
        match path {
            Some(path) => Self::load(path),
            None => Ok(Self::default()),
        }
    }

    pub fn save(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let content =
            serde_yaml::to_string(self).map_err(|e| NetError::ConfigError(e.to_string()))?;
        std::fs::write(path, content)?;
        Ok(())
    }
}

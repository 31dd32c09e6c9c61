use ipnetwork::Ipv4Network;
use routelab_core::{
    AddressPlan, Interface, InterfaceRole, Link, NetError, NetworkNode, NodeKind, Result, Topology,
};
use std::collections::HashSet;
use tracing::debug;

/// The single multi-homed router every topology is rooted at.
pub const ROUTER_NAME: &str = "r0";

/// Pre-existing external interface the router binds for upstream
/// connectivity. Not created by the builder; the driver provides it.
pub const UPLINK_IFACE: &str = "eth0";

/// Turns an address plan into the declared node/link graph: one router, and
/// per subnet one switch and one host chained `router - switch - host`.
///
/// Construction is all-or-nothing and follows plan order, so interface names
/// (`r0-eth1`, `r0-eth2`, ...) and routing entries come out identical across
/// runs.
pub fn build_topology(plan: &AddressPlan) -> Result<Topology> {
    plan.validate()?;

    let mut node_names = HashSet::new();
    let mut iface_names = HashSet::new();
    let mut nodes = Vec::new();
    let mut links = Vec::new();

    let mut router = NetworkNode {
        name: ROUTER_NAME.to_string(),
        kind: NodeKind::Router,
        interfaces: vec![Interface {
            node: ROUTER_NAME.to_string(),
            name: UPLINK_IFACE.to_string(),
            address: None,
            role: InterfaceRole::Uplink,
        }],
        default_route: None,
    };
    node_names.insert(ROUTER_NAME.to_string());
    iface_names.insert(UPLINK_IFACE.to_string());

    for (index, subnet) in plan.subnets.iter().enumerate() {
        let ordinal = index + 1;
        let switch_name = subnet.id.clone();
        let host_name = format!("h{ordinal}");
        let router_iface = format!("{ROUTER_NAME}-eth{ordinal}");

        for name in [&switch_name, &host_name] {
            if !node_names.insert(name.clone()) {
                return Err(NetError::ConfigurationConflict(format!(
                    "node name {name} assigned twice"
                )));
            }
        }

        let switch_router_port = format!("{switch_name}-eth1");
        let switch_host_port = format!("{switch_name}-eth2");
        let host_iface = format!("{host_name}-eth0");
        for name in [
            &router_iface,
            &switch_router_port,
            &switch_host_port,
            &host_iface,
        ] {
            if !iface_names.insert(name.clone()) {
                return Err(NetError::ConfigurationConflict(format!(
                    "interface name {name} assigned twice"
                )));
            }
        }

        let gateway_address = Ipv4Network::new(subnet.gateway, subnet.prefix.prefix())
            .map_err(|e| NetError::ConfigurationConflict(e.to_string()))?;
        let host_address = Ipv4Network::new(subnet.host, subnet.prefix.prefix())
            .map_err(|e| NetError::ConfigurationConflict(e.to_string()))?;

        router.interfaces.push(Interface {
            node: ROUTER_NAME.to_string(),
            name: router_iface.clone(),
            address: Some(gateway_address),
            role: InterfaceRole::SubnetFacing,
        });

        nodes.push(NetworkNode {
            name: switch_name.clone(),
            kind: NodeKind::Switch,
            interfaces: vec![
                Interface {
                    node: switch_name.clone(),
                    name: switch_router_port.clone(),
                    address: None,
                    role: InterfaceRole::SwitchPort,
                },
                Interface {
                    node: switch_name.clone(),
                    name: switch_host_port.clone(),
                    address: None,
                    role: InterfaceRole::SwitchPort,
                },
            ],
            default_route: None,
        });

        nodes.push(NetworkNode {
            name: host_name.clone(),
            kind: NodeKind::Host,
            interfaces: vec![Interface {
                node: host_name.clone(),
                name: host_iface.clone(),
                address: Some(host_address),
                role: InterfaceRole::HostFacing,
            }],
            default_route: Some(subnet.gateway),
        });

        links.push(Link::between(
            &switch_name,
            &switch_router_port,
            ROUTER_NAME,
            &router_iface,
        ));
        links.push(Link::between(
            &host_name,
            &host_iface,
            &switch_name,
            &switch_host_port,
        ));

        debug!(
            subnet = %subnet.id,
            prefix = %subnet.prefix,
            iface = %router_iface,
            "declared subnet"
        );
    }

    nodes.insert(0, router);

    Ok(Topology { nodes, links })
}

use routelab_core::{AddressPlan, Result};
use routelab_network::build_topology;
use serde::Serialize;
use std::path::Path;
use tabled::Tabled;
use tracing::debug;

use crate::output::{OutputFormat, OutputFormatter};

#[derive(Serialize, Tabled)]
struct InterfaceRow {
    node: String,
    kind: String,
    interface: String,
    address: String,
}

#[derive(Serialize, Tabled)]
struct LinkRow {
    endpoint_a: String,
    endpoint_b: String,
}

pub async fn execute(plan: Option<&Path>, format: OutputFormat) -> Result<()> {
    let plan = AddressPlan::load_or_default(plan)?;
    debug!(subnets = plan.subnets.len(), "building topology");
    let topology = build_topology(&plan)?;

    let interfaces: Vec<InterfaceRow> = topology
        .nodes
        .iter()
        .flat_map(|node| {
            node.interfaces.iter().map(move |iface| InterfaceRow {
                node: node.name.clone(),
                kind: node.kind.to_string(),
                interface: iface.name.clone(),
                address: iface
                    .address
                    .map(|a| a.to_string())
                    .unwrap_or_else(|| "-".to_string()),
            })
        })
        .collect();
    println!("{}", format.format_table(interfaces));

    let links: Vec<LinkRow> = topology
        .links
        .iter()
        .map(|link| LinkRow {
            endpoint_a: format!("{}:{}", link.a.node, link.a.interface),
            endpoint_b: format!("{}:{}", link.b.node, link.b.interface),
        })
        .collect();
    println!("{}", format.format_table(links));

    Ok(())
}

use routelab_core::{AddressPlan, InterfaceRole, Result};
use routelab_network::build_topology;
use serde::Serialize;
use std::path::Path;
use tabled::Tabled;

use crate::output::{OutputFormat, OutputFormatter};

#[derive(Serialize, Tabled)]
struct RouteRow {
    node: String,
    destination: String,
    device: String,
    via: String,
}

pub async fn execute(plan: Option<&Path>, format: OutputFormat) -> Result<()> {
    let plan = AddressPlan::load_or_default(plan)?;
    let topology = build_topology(&plan)?;

    let mut rows = Vec::new();

    if let Some(router) = topology.router() {
        for iface in &router.interfaces {
            if iface.role != InterfaceRole::SubnetFacing {
                continue;
            }
            let Some(address) = iface.address else {
                continue;
            };
            rows.push(RouteRow {
                node: router.name.clone(),
                destination: format!("{}/{}", address.network(), address.prefix()),
                device: iface.name.clone(),
                via: "-".to_string(),
            });
        }
    }

    for host in topology.hosts() {
        let Some(gateway) = host.default_route else {
            continue;
        };
        rows.push(RouteRow {
            node: host.name.clone(),
            destination: "default".to_string(),
            device: host
                .interfaces
                .first()
                .map(|iface| iface.name.clone())
                .unwrap_or_else(|| "-".to_string()),
            via: gateway.to_string(),
        });
    }

    println!("{}", format.format_table(rows));
    Ok(())
}

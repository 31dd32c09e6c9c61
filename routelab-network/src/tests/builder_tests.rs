use crate::builder::{ROUTER_NAME, UPLINK_IFACE, build_topology};
use routelab_core::{AddressPlan, InterfaceRole, NetError, NodeKind, SubnetPlan};
use std::net::Ipv4Addr;

#[test]
fn default_plan_names_router_interfaces_in_plan_order() {
    let topology = build_topology(&AddressPlan::default()).unwrap();
    let router = topology.router().unwrap();

    assert_eq!(router.name, ROUTER_NAME);
    let names: Vec<&str> = router.interfaces.iter().map(|i| i.name.as_str()).collect();
    assert_eq!(names, [UPLINK_IFACE, "r0-eth1", "r0-eth2", "r0-eth3"]);

    let addresses: Vec<String> = router
        .interfaces
        .iter()
        .filter_map(|i| i.address.map(|a| a.to_string()))
        .collect();
    assert_eq!(addresses, ["192.168.1.1/24", "172.16.0.1/12", "10.0.0.1/8"]);

    assert_eq!(router.interfaces[0].role, InterfaceRole::Uplink);
    assert!(router.interfaces[0].address.is_none());
}

#[test]
fn one_switch_and_one_host_per_subnet_connected_to_the_router() {
    let topology = build_topology(&AddressPlan::default()).unwrap();

    assert_eq!(
        topology
            .nodes
            .iter()
            .filter(|n| n.kind == NodeKind::Router)
            .count(),
        1
    );
    assert_eq!(topology.switches().count(), 3);
    assert_eq!(topology.hosts().count(), 3);
    assert_eq!(topology.links.len(), 6);
    assert!(topology.is_connected());
}

#[test]
fn hosts_default_route_via_their_gateway() {
    let topology = build_topology(&AddressPlan::default()).unwrap();

    let expectations = [
        ("h1", Ipv4Addr::new(192, 168, 1, 1), "192.168.1.100/24"),
        ("h2", Ipv4Addr::new(172, 16, 0, 1), "172.16.0.100/12"),
        ("h3", Ipv4Addr::new(10, 0, 0, 1), "10.0.0.100/8"),
    ];
    for (name, gateway, address) in expectations {
        let host = topology.node(name).unwrap();
        assert_eq!(host.default_route, Some(gateway));
        assert_eq!(host.interfaces[0].address.unwrap().to_string(), address);
        assert_eq!(host.interfaces[0].role, InterfaceRole::HostFacing);
    }
}

#[test]
fn subnet_facing_addresses_equal_the_gateway() {
    let plan = AddressPlan::default();
    let topology = build_topology(&plan).unwrap();
    let router = topology.router().unwrap();

    for (ordinal, subnet) in plan.subnets.iter().enumerate() {
        let iface = router.interface(&format!("r0-eth{}", ordinal + 1)).unwrap();
        assert_eq!(iface.role, InterfaceRole::SubnetFacing);
        assert_eq!(iface.address.unwrap().ip(), subnet.gateway);
        assert_eq!(iface.address.unwrap().prefix(), subnet.prefix.prefix());
    }
}

#[test]
fn building_is_deterministic() {
    let plan = AddressPlan::default();
    assert_eq!(build_topology(&plan).unwrap(), build_topology(&plan).unwrap());
}

#[test]
fn invalid_plan_fails_before_any_node_is_built() {
    let plan = AddressPlan {
        subnets: vec![SubnetPlan {
            id: "s1".to_string(),
            prefix: "192.168.1.0/24".parse().unwrap(),
            gateway: Ipv4Addr::new(10, 0, 0, 1),
            host: Ipv4Addr::new(192, 168, 1, 100),
        }],
    };

    let err = build_topology(&plan).unwrap_err();
    assert!(matches!(err, NetError::ConfigurationConflict(_)));
}

#[test]
fn subnet_id_colliding_with_a_generated_name_is_rejected() {
    // A subnet id of "h1" collides with the generated name of the first
    // host; nothing partial may come back.
    let plan = AddressPlan {
        subnets: vec![SubnetPlan {
            id: "h1".to_string(),
            prefix: "192.168.1.0/24".parse().unwrap(),
            gateway: Ipv4Addr::new(192, 168, 1, 1),
            host: Ipv4Addr::new(192, 168, 1, 100),
        }],
    };

    let err = build_topology(&plan).unwrap_err();
    assert!(matches!(err, NetError::ConfigurationConflict(_)));
}

#[test]
fn builds_for_any_consistent_plan() {
    let plan = AddressPlan {
        subnets: vec![
            SubnetPlan {
                id: "s1".to_string(),
                prefix: "192.0.2.0/25".parse().unwrap(),
                gateway: Ipv4Addr::new(192, 0, 2, 1),
                host: Ipv4Addr::new(192, 0, 2, 9),
            },
            SubnetPlan {
                id: "s2".to_string(),
                prefix: "198.51.100.0/24".parse().unwrap(),
                gateway: Ipv4Addr::new(198, 51, 100, 1),
                host: Ipv4Addr::new(198, 51, 100, 9),
            },
        ],
    };

    let topology = build_topology(&plan).unwrap();
    assert_eq!(topology.switches().count(), 2);
    assert_eq!(topology.hosts().count(), 2);
    assert!(topology.is_connected());

    let router = topology.router().unwrap();
    let names: Vec<&str> = router.interfaces.iter().map(|i| i.name.as_str()).collect();
    assert_eq!(names, ["eth0", "r0-eth1", "r0-eth2"]);
}

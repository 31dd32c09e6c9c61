pub mod builder;
pub mod emulation;
pub mod provision;

#[cfg(test)]
mod tests;

pub use builder::{ROUTER_NAME, UPLINK_IFACE, build_topology};
pub use emulation::{Emulation, EmulationState};
pub use provision::{IMAPS_REDIRECT, RouterProvisioner, RouterState, provisioner_for};

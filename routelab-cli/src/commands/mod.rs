mod routes;
mod topology;
mod validate;

use clap::Subcommand;
use routelab_core::Result;
use std::path::PathBuf;

use crate::output::OutputFormat;

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Print the node, interface and link layout built from an address plan
    Topology {
        /// Address plan file (YAML); defaults to the built-in three-subnet plan
        #[arg(long)]
        plan: Option<PathBuf>,
    },

    /// Print router interface networks and host default routes
    Routes {
        /// Address plan file (YAML); defaults to the built-in three-subnet plan
        #[arg(long)]
        plan: Option<PathBuf>,
    },

    /// Validate an address plan file
    Validate {
        /// Address plan file (YAML)
        file: PathBuf,
    },
}

pub async fn execute(command: Command, format: OutputFormat) -> Result<()> {
    match command {
        Command::Topology { plan } => topology::execute(plan.as_deref(), format).await,
        Command::Routes { plan } => routes::execute(plan.as_deref(), format).await,
        Command::Validate { file } => validate::execute(&file).await,
    }
}

use routelab_core::{AddressPlan, Result};
use std::path::Path;

use crate::output::print_success;

pub async fn execute(file: &Path) -> Result<()> {
    let plan = AddressPlan::load(file)?;
    print_success(&format!(
        "{}: {} subnets, addressing consistent",
        file.display(),
        plan.subnets.len()
    ));
    Ok(())
}

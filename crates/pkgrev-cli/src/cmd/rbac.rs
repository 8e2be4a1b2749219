use crate::output::print_document;
use anyhow::Result;
use pkgrev_controller::rbac::cluster_role;

pub fn run(name: &str, json: bool) -> Result<()> {
    print_document(&cluster_role(name), json)
}

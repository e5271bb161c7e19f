use anyhow::Result;
use clap::Parser;

use crate::cli::handlers::commons;

#[derive(Parser, Debug, Default)]
#[command(
    no_binary_name = true,
    about = "Prints the namespace user strategies and plugins are registered under."
)]
struct NamespaceArgs {}

pub fn handle(args: Vec<String>, root: Option<&str>) -> Result<()> {
    let _namespace_args = NamespaceArgs::try_parse_from(&args)?;
    let bootstrapper = commons::open_userland(root)?;
    println!("{}", bootstrapper.user_namespace());
    Ok(())
}

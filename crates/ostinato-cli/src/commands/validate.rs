//! Topology validation command.

use std::path::PathBuf;

use clap::Args;
use ostinato_config::{Topology, TopologyValidator, ValidationError};

#[derive(Args)]
pub struct ValidateArgs {
    /// Topology file (TOML)
    file: PathBuf,

    /// Number of cores requests may target
    #[arg(long, default_value_t = 2)]
    cores: usize,
}

pub fn run(args: ValidateArgs) -> anyhow::Result<()> {
    let topology = Topology::load(&args.file)?;
    match TopologyValidator::new(args.cores).validate(&topology) {
        Ok(()) => {
            println!(
                "{}: {} requests ok for {} cores",
                topology.name,
                topology.len(),
                args.cores
            );
            Ok(())
        }
        Err(ValidationError::Multiple(errors)) => {
            for e in &errors {
                println!("  {e}");
            }
            anyhow::bail!("{}: {} problems", topology.name, errors.len())
        }
        Err(e) => {
            println!("  {e}");
            anyhow::bail!("{}: 1 problem", topology.name)
        }
    }
}

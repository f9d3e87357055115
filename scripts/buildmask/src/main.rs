use std::path::PathBuf;

use buildmask::{build, BuildOpts};
use clap::Parser;

#[derive(Parser)]
#[command(
    author,
    version,
    about,
    long_about = "Build a flat, merged ferroelectric device mask from a TOML plan"
)]
pub struct Args {
    /// The mask configuration. Defaults to the reference mask.
    #[arg(short, long)]
    config: Option<PathBuf>,
    /// The output GDS file.
    #[arg(short, long, default_value = "mask.gds")]
    output: PathBuf,
    /// Also write the unmerged hierarchy to this GDS file.
    #[arg(long)]
    hierarchical: Option<PathBuf>,
    /// A CSV layer table (`name,layer,datatype,mode`) replacing the configured layers.
    #[arg(long)]
    layers_csv: Option<PathBuf>,
}

pub fn main() {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();
    let args = Args::parse();
    let opts = BuildOpts {
        config: args.config,
        output: args.output,
        hierarchical: args.hierarchical,
        layers_csv: args.layers_csv,
    };
    if let Err(err) = build(&opts) {
        log::error!("{err}");
        std::process::exit(1);
    }
}

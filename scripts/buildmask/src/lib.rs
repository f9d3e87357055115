use std::path::PathBuf;

use ferromask::config::MaskConfig;
use ferromask::data::MaskCtx;
use ferromask::error::{with_err_context, ErrorContext, Result};
use ferromask::io::read_to_string;
use ferromask::layout::layers::Layers;
use log::info;

/// Inputs and outputs of one mask build.
#[derive(Debug, Clone, Default)]
pub struct BuildOpts {
    /// Mask configuration; the reference mask when absent.
    pub config: Option<PathBuf>,
    /// Where the flat, merged mask is written.
    pub output: PathBuf,
    /// Where the unmerged hierarchy is written, if anywhere.
    pub hierarchical: Option<PathBuf>,
    /// A layer table replacing the configured one.
    pub layers_csv: Option<PathBuf>,
}

pub fn ctx(opts: &BuildOpts) -> Result<MaskCtx> {
    let config = match &opts.config {
        Some(path) => MaskConfig::from_file(path)?,
        None => MaskConfig::reference_mask(),
    };
    match &opts.layers_csv {
        Some(path) => {
            let csv = read_to_string(path)?;
            let layers = with_err_context(Layers::from_csv(&csv), || {
                ErrorContext::ReadFile(path.clone())
            })?;
            MaskCtx::with_layers(config, layers)
        }
        None => MaskCtx::from_config(config),
    }
}

/// Builds the configured plan and writes the requested GDS files.
pub fn build(opts: &BuildOpts) -> Result<()> {
    let ctx = ctx(opts)?;
    let top = ctx.build_plan()?;
    if let Some(path) = &opts.hierarchical {
        ctx.write_hierarchy(&top, path)?;
        info!("wrote hierarchy to {:?}", path);
    }
    ctx.write_mask(&top, &opts.output)?;
    info!("wrote mask to {:?}", opts.output);
    Ok(())
}

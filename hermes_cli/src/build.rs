use std::{path::PathBuf, time::Duration};

use anyhow::Context;
use clap::Args;
use comfy_table::Table;
use hermes_extensions::{
    builders::registry::GraphStorageBuilderRegistry, config::ExtensionsConfig,
    graph::GraphAccess, graph_builder::build_graph, osm::osm_reader::parse_osm_file,
};
use indicatif::{ProgressBar, ProgressStyle};
use tracing::info;

/// Used when `--config` is not given, can be set in `.env.local`
const CONFIG_ENV_VAR: &str = "HERMES_EXTENSIONS_CONFIG";

#[derive(Args)]
pub struct BuildArgs {
    /// OSM file in PBF format
    #[arg(long)]
    osm: PathBuf,

    /// JSON file listing the builders and their parameters
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Folder receiving the extension stores
    #[arg(short, long)]
    output: PathBuf,
}

fn read_config(path: Option<PathBuf>) -> Result<ExtensionsConfig, anyhow::Error> {
    let path = match path {
        Some(path) => path,
        None => std::env::var(CONFIG_ENV_VAR)
            .map(PathBuf::from)
            .with_context(|| format!("no --config given and {CONFIG_ENV_VAR} is not set"))?,
    };

    let json = std::fs::read_to_string(&path)
        .with_context(|| format!("failed to read {}", path.display()))?;
    let config = ExtensionsConfig::from_json(&json)
        .with_context(|| format!("invalid configuration in {}", path.display()))?;

    Ok(config)
}

pub fn run(args: BuildArgs) -> Result<(), anyhow::Error> {
    let config = read_config(args.config)?;
    let mut registry = GraphStorageBuilderRegistry::from_config(&config)?;

    let spinner = ProgressBar::new_spinner();
    spinner.set_style(ProgressStyle::default_spinner().template("{spinner} {msg} ({elapsed})")?);
    spinner.enable_steady_tick(Duration::from_millis(200));

    spinner.set_message(format!("Reading {}", args.osm.display()));
    let osm = parse_osm_file(&args.osm)?;

    spinner.set_message("Building extensions");
    let graph = build_graph(&osm, &mut registry, &args.output)?;
    spinner.finish_and_clear();

    let mut table = Table::new();
    table.set_header(vec!["Builder", "Output"]);
    for name in registry.names() {
        table.add_row(vec![name.to_string(), args.output.display().to_string()]);
    }

    info!(
        "Built {} edges from {} ways\n{}",
        graph.edge_count(),
        osm.ways().len(),
        table
    );

    Ok(())
}

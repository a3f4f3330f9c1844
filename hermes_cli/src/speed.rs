use std::path::PathBuf;

use clap::Args;
use hermes_extensions::traffic::traffic_storage::TrafficStore;
use tracing::info;

use crate::parsers;

#[derive(Args)]
pub struct SpeedArgs {
    /// Folder holding the built extension stores
    #[arg(short, long)]
    output: PathBuf,

    #[arg(short, long)]
    edge: usize,

    /// Node the edge is entered from
    #[arg(short, long)]
    base: usize,

    /// Node the edge is left at
    #[arg(short, long)]
    adj: usize,

    /// Departure time, RFC 3339 or seconds since the epoch
    #[arg(short, long, value_parser = parsers::parse_timestamp)]
    time: jiff::Timestamp,
}

pub fn run(args: SpeedArgs) -> Result<(), anyhow::Error> {
    let store = TrafficStore::from_file(&args.output)?;

    if !store.is_matched() {
        anyhow::bail!("traffic data in {} has not been matched", args.output.display());
    }

    match store.speed(args.edge, args.base, args.adj, args.time)? {
        Some(speed) => info!(
            "Edge {} from {} to {}: {} km/h (weekly max {} km/h)",
            args.edge,
            args.base,
            args.adj,
            speed,
            store.max_speed(args.edge, args.base, args.adj)
        ),
        None => info!(
            "No traffic data for edge {} from {} to {}",
            args.edge, args.base, args.adj
        ),
    }

    Ok(())
}

use std::path::{Path, PathBuf};

use catalog::store::InMemoryTargetStore;
use clap::{Parser, Subcommand};
use scene::viewport::ContainerSize;
use tools::{
    ToolError, cluster_report, density_ascii, density_report, load_steps, load_targets, replay,
};
use tracing::info;
use tracing_subscriber::EnvFilter;
use viewer::{HeatmapPanel, ViewerConfig};

#[derive(Parser, Debug)]
#[command(name = "geoscope", about = "Headless heatmap and cluster inspector")]
struct Args {
    /// JSON file with viewer tunables.
    #[arg(long)]
    config: Option<PathBuf>,
    /// Container width in pixels.
    #[arg(long, default_value_t = 800.0)]
    width: f64,
    /// Container height in pixels.
    #[arg(long, default_value_t = 600.0)]
    height: f64,
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Print the clusters visible after N zoom-in steps as JSON.
    Clusters {
        result: PathBuf,
        #[arg(long, default_value_t = 0)]
        zoom_in: u32,
    },
    /// Print the density grid as an ASCII tier map.
    Density {
        result: PathBuf,
        #[arg(long, default_value_t = 0)]
        zoom_in: u32,
        /// Print shaded cells with their palette colours as JSON instead.
        #[arg(long)]
        json: bool,
    },
    /// Replay a recorded list of input steps and print the final state.
    Replay { result: PathBuf, steps: PathBuf },
}

fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_writer(std::io::stderr)
        .init();

    if let Err(e) = real_main() {
        eprintln!("error: {e}");
        std::process::exit(1);
    }
}

fn real_main() -> Result<(), ToolError> {
    let args = Args::parse();
    let config = match &args.config {
        Some(path) => ViewerConfig::from_json_file(path)?,
        None => ViewerConfig::default(),
    };
    let container = ContainerSize::new(args.width, args.height);

    match args.command {
        Command::Clusters { result, zoom_in } => {
            let mut panel = open_panel(&result, container, config, zoom_in)?;
            let report = cluster_report(&mut panel);
            println!("{}", serde_json::to_string_pretty(&report)?);
        }
        Command::Density {
            result,
            zoom_in,
            json,
        } => {
            let mut panel = open_panel(&result, container, config, zoom_in)?;
            let style = panel.heatmap_style();
            let grid = panel.density();
            if json {
                println!("{}", serde_json::to_string_pretty(&density_report(grid, &style))?);
            } else {
                print!("{}", density_ascii(grid));
            }
        }
        Command::Replay { result, steps } => {
            let mut panel = open_panel(&result, container, config, 0)?;
            let steps = load_steps(&steps)?;
            let report = replay(&mut panel, &steps)?;
            println!("{}", serde_json::to_string_pretty(&report)?);
        }
    }
    Ok(())
}

fn open_panel(
    result: &Path,
    container: ContainerSize,
    config: ViewerConfig,
    zoom_in: u32,
) -> Result<HeatmapPanel<InMemoryTargetStore>, ToolError> {
    let targets = load_targets(result)?;
    info!(path = %result.display(), targets = targets.len(), "loaded analysis result");
    let mut panel = HeatmapPanel::new(InMemoryTargetStore::new(targets), container, config);
    for _ in 0..zoom_in {
        panel.zoom_in();
    }
    Ok(panel)
}

//! Quick-look plots of a polbuff file
//!
//! Reads the Stokes parameters of a polbuff HDF5 file and plots, on a 2x2 grid,
//! the direct and indirect intensities and the indirect Q and U parameters.

use anyhow::Context;
use clap::Parser;
use polbuff::{Figure, Polbuff};
use std::path::PathBuf;
use std::time::Instant;
use tracing::{info, Level};
use tracing_subscriber::FmtSubscriber;

#[derive(Parser, Debug)]
#[command(name = "plot_polbuff")]
#[command(about = "Plots the Stokes parameters of a polbuff file")]
struct Args {
    /// Polbuff HDF5 file
    #[arg(short, long, default_value = "polbuff.h5")]
    input: PathBuf,

    /// Figure file, the format (pdf, svg or png) follows the extension
    #[arg(short, long, default_value = "polbuff.pdf")]
    output: PathBuf,

    /// Figure width in points
    #[arg(long, default_value = "720")]
    width: u32,

    /// Figure height in points
    #[arg(long, default_value = "720")]
    height: u32,

    /// Caption the panels
    #[arg(long)]
    titles: bool,

    /// Leave out the axes and tick labels
    #[arg(long)]
    no_axes: bool,

    /// Log level
    #[arg(long, default_value = "info")]
    log_level: String,
}

fn main() -> anyhow::Result<()> {
    let args = Args::parse();

    let level = match args.log_level.to_lowercase().as_str() {
        "trace" => Level::TRACE,
        "debug" => Level::DEBUG,
        "warn" => Level::WARN,
        "error" => Level::ERROR,
        _ => Level::INFO,
    };
    let subscriber = FmtSubscriber::builder().with_max_level(level).finish();
    tracing::subscriber::set_global_default(subscriber)?;

    let now = Instant::now();
    let polbuff = Polbuff::from_h5(&args.input)
        .with_context(|| format!("failed to load {:?}", args.input))?;
    info!(
        "{:?}: {}x{} grid loaded in {}ms",
        args.input,
        polbuff.n_x,
        polbuff.n_y,
        now.elapsed().as_millis()
    );
    info!("extent: {:?}", <[f64; 4]>::from(polbuff.extent()));

    let figure = Figure {
        width: args.width,
        height: args.height,
        titles: args.titles,
        axes: !args.no_axes,
    };
    let now = Instant::now();
    figure
        .save(&polbuff, &args.output)
        .with_context(|| format!("failed to save {:?}", args.output))?;
    info!("figure rendered in {}ms", now.elapsed().as_millis());

    Ok(())
}

//! CLI driver: `scan` locates candidate tables in a firmware image and
//! writes a JSON report; `export-xdf` renders a JSON report as XDF.

use std::collections::HashMap;
use std::path::PathBuf;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use chrono::Utc;
use clap::{Parser, Subcommand};
use indicatif::{ProgressBar, ProgressStyle};
use tracing::info;

use mapscout::error::Error;
use mapscout::progress::{self, ProgressCounter};
use mapscout::store::CandidateStore;
use mapscout::template_rescan::{self, RescanConfig};
use mapscout::{io as mio, xdf, BruteScanner, ScanConfig};

#[derive(Parser)]
#[command(name = "mapscout", about = "Locates calibration tables in ECU firmware images")]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Scan a firmware image for candidate calibration tables.
    Scan {
        image: PathBuf,
        #[arg(long)]
        templates: Option<PathBuf>,
        #[arg(long)]
        hints: Option<PathBuf>,
        #[arg(long, default_value_t = 3)]
        min_rows: usize,
        #[arg(long, default_value_t = 128)]
        max_cols: usize,
        #[arg(long)]
        workers: Option<usize>,
        #[arg(long)]
        out: PathBuf,
    },

    /// Render a previously-produced maps.json as an XDF document.
    ExportXdf {
        maps: PathBuf,
        #[arg(long)]
        out: PathBuf,
        #[arg(long, default_value = "mapscout")]
        tool_name: String,
    },
}

/// Spawn a progress bar backed by an atomic counter, polled on a background
/// thread every 50ms. The caller signals completion via the returned flag
/// and joins the handle before exiting.
fn spawn_progress_bar(
    total: u64,
    msg: &str,
) -> (ProgressCounter, Arc<AtomicBool>, std::thread::JoinHandle<()>) {
    let counter = progress::new_counter();
    let done = Arc::new(AtomicBool::new(false));

    let bar = ProgressBar::new(total);
    bar.set_style(
        ProgressStyle::with_template("{msg} [{bar:40.cyan/blue}] {pos}/{len} ({eta})")
            .unwrap()
            .progress_chars("=> "),
    );
    bar.set_message(msg.to_string());

    let counter_clone = Arc::clone(&counter);
    let done_clone = Arc::clone(&done);
    let handle = std::thread::spawn(move || {
        while !done_clone.load(Ordering::Relaxed) {
            bar.set_position(progress::load(&counter_clone));
            std::thread::sleep(std::time::Duration::from_millis(50));
        }
        bar.set_position(progress::load(&counter_clone));
        bar.finish();
    });

    (counter, done, handle)
}

fn run() -> Result<(), Error> {
    let cli = Cli::parse();

    match cli.command {
        Command::Scan {
            image,
            templates,
            hints,
            min_rows,
            max_cols,
            workers,
            out,
        } => {
            let image = mio::read_image(&image)?;
            let hints = hints.map(|p| mio::read_hints(&p)).transpose()?;
            let catalog = templates.map(|p| mio::read_templates(&p)).transpose()?;

            let (counter, done, handle) = spawn_progress_bar(image.size() as u64, "Scanning");
            let scanner = BruteScanner::new(ScanConfig {
                min_rows,
                max_cols,
                workers,
            });
            let found = scanner.scan(&image, hints.as_ref(), Some(&counter));
            done.store(true, Ordering::Relaxed);
            let _ = handle.join();

            info!(candidates = found.len(), "brute-force scan complete");
            let mut store = CandidateStore::from_maps(found);

            if let Some(catalog) = catalog {
                // `known` holds offsets whose XDF is already externally
                // pinned, not the brute-force scan's own candidates — the
                // rescanner must be free to land on (and enrich) an offset
                // the scan already found.
                let known: HashMap<usize, String> = HashMap::new();
                let hits = template_rescan::rescan_templates(&image, &catalog, &known, RescanConfig::default());
                info!(hits = hits.len(), "template rescan complete");
                store.attach_template_hits(&hits);
            }

            mio::write_maps(&out, &store.into_sorted_vec())?;
            Ok(())
        }

        Command::ExportXdf { maps, out, tool_name } => {
            let maps = mio::read_maps(&maps)?;
            let document = xdf::write_xdf(&maps, &tool_name, Utc::now())?;
            mio::write_text(&out, &document)
        }
    }
}

fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .init();

    if let Err(err) = run() {
        eprintln!("mapscout: {err}");
        std::process::exit(err.exit_code());
    }
}

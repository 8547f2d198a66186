use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use region_grid::config::load_config_or_default;
use region_grid::{GridPos, NoPayload, RegionSystem};
use std::fs;
use std::path::{Path, PathBuf};
use std::process::ExitCode;
use std::time::Instant;
use tracing::{error, info};
use tracing_appender::rolling::{RollingFileAppender, Rotation};
use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

const LOG_PREFIX: &str = "region_grid";
const DEFAULT_CONFIG: &str = "assets/region_config.ron";

fn setup_file_logging() -> String {
    let log_dir = PathBuf::from("logs");
    if !log_dir.exists() {
        fs::create_dir_all(&log_dir).expect("Failed to create logs directory");
    }

    // Keep the last 25 runs
    cleanup_old_logs(&log_dir, 25);

    let now = chrono::Local::now();
    let log_filename = format!("{}_{}.log", LOG_PREFIX, now.format("%Y%m%d_%H%M%S"));
    let log_path_str = log_dir.join(&log_filename).to_string_lossy().to_string();

    let file_appender = RollingFileAppender::new(Rotation::NEVER, &log_dir, &log_filename);

    let file_layer = fmt::layer().with_writer(file_appender).with_ansi(false);
    let stdout_layer = fmt::layer().with_writer(std::io::stdout).with_target(false);

    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("region_grid=info"));

    tracing_subscriber::registry()
        .with(filter)
        .with(file_layer)
        .with(stdout_layer)
        .init();

    log_path_str
}

fn cleanup_old_logs(log_dir: &Path, keep_count: usize) {
    if let Ok(entries) = fs::read_dir(log_dir) {
        let mut log_files: Vec<_> = entries
            .filter_map(|e| e.ok())
            .filter(|e| {
                e.path()
                    .file_name()
                    .and_then(|n| n.to_str())
                    .map(|s| s.starts_with(LOG_PREFIX) && s.ends_with(".log"))
                    .unwrap_or(false)
            })
            .collect();

        // Oldest first
        log_files.sort_by_key(|e| e.metadata().ok().and_then(|m| m.modified().ok()));

        if log_files.len() > keep_count {
            for file in log_files.iter().take(log_files.len() - keep_count) {
                let _ = fs::remove_file(file.path());
            }
        }
    }
}

/// Random block/unblock edits against a full partition check.
fn run_soak(config_path: &str) -> Result<(), String> {
    let config = load_config_or_default(config_path);
    let mut system = RegionSystem::from_config(&config, NoPayload).map_err(|e| e.to_string())?;
    let extent = system.grid_extent();
    let mut rng = StdRng::seed_from_u64(config.soak_seed);
    let verify_interval = config.soak_verify_interval.max(1);

    info!(
        "[SOAK] {} edits on {}x{} (seed {}, block probability {})",
        config.soak_edits, extent.x, extent.y, config.soak_seed, config.soak_block_probability
    );

    let start = Instant::now();
    let mut changed = 0usize;
    for edit in 1..=config.soak_edits {
        let pos = GridPos::new(rng.random_range(0..extent.x), rng.random_range(0..extent.y));
        let occluded = rng.random_bool(config.soak_block_probability.clamp(0.0, 1.0));
        if system.set_occlusion(pos, occluded).map_err(|e| e.to_string())? {
            changed += 1;
        }

        if edit % verify_interval == 0 {
            system
                .verify_partition()
                .map_err(|fault| format!("after edit {} at {:?}: {}", edit, pos, fault))?;
            let stats = system.stats();
            info!(
                "[SOAK] {}/{} edits ok: {} regions, {} links, {} occluded",
                edit, config.soak_edits, stats.region_count, stats.link_count, stats.occluded_cells
            );
        }
    }

    system.verify_partition().map_err(|fault| fault.to_string())?;
    let stats = system.stats();
    info!(
        "[SOAK] Done in {:?}: {} of {} edits changed a cell, {} regions (largest {}), {} links",
        start.elapsed(),
        changed,
        config.soak_edits,
        stats.region_count,
        stats.largest_region,
        stats.link_count
    );
    Ok(())
}

fn main() -> ExitCode {
    let log_file = setup_file_logging();

    println!("╔══════════════════════════════════════════════════════════╗");
    println!("║  Region Grid soak - Logging to file                      ║");
    println!("╠══════════════════════════════════════════════════════════╣");
    println!("║  Log file: {:<45} ║", log_file);
    println!("╚══════════════════════════════════════════════════════════╝");

    let config_path = std::env::args().nth(1).unwrap_or_else(|| DEFAULT_CONFIG.to_string());
    match run_soak(&config_path) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            error!("[SOAK] Partition check failed {}", e);
            ExitCode::FAILURE
        }
    }
}

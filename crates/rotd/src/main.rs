//! rotd - Rotator control daemon
//!
//! Drives one rotator through the frontend: create, configure, open,
//! optionally command a position, report, then close and destroy.
//!
//! Usage:
//!   rotd [OPTIONS] [config.toml]
//!
//! Options:
//!   --position <AZ> <EL>  Command the rotator to this azimuth/elevation
//!   --list                List the known rotator models and exit
//!
//! If no config file is provided, the dummy rotator is used.

use std::ops::ControlFlow;
use std::sync::Arc;

use anyhow::Context;
use rot_frontend::{CapsRegistry, RotManager, RotModel, RotResult, RotatorConfig};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

/// Parsed command-line arguments
#[derive(Debug, Default)]
struct Args {
    /// Handle config file (TOML)
    config_path: Option<String>,
    /// Target azimuth/elevation
    position: Option<(f64, f64)>,
    list: bool,
}

fn parse_args(args: &[String]) -> anyhow::Result<Args> {
    let mut result = Args::default();

    let mut i = 0;
    while i < args.len() {
        match args[i].as_str() {
            "--position" | "-p" => {
                let (az, el) = match (args.get(i + 1), args.get(i + 2)) {
                    (Some(az), Some(el)) => (az, el),
                    _ => anyhow::bail!("--position needs an azimuth and an elevation"),
                };
                let az: f64 = az.parse().with_context(|| format!("bad azimuth '{}'", az))?;
                let el: f64 = el.parse().with_context(|| format!("bad elevation '{}'", el))?;
                result.position = Some((az, el));
                i += 3;
            }
            "--list" | "-l" => {
                result.list = true;
                i += 1;
            }
            "--help" | "-h" => {
                print_help();
                std::process::exit(0);
            }
            arg if !arg.starts_with('-') => {
                // Positional argument = config file
                result.config_path = Some(arg.to_string());
                i += 1;
            }
            _ => {
                tracing::warn!("Unknown argument: {}", args[i]);
                i += 1;
            }
        }
    }

    Ok(result)
}

fn print_help() {
    eprintln!(
        r#"rotd - Rotator control daemon

Usage: rotd [OPTIONS] [config.toml]

Options:
  -p, --position <AZ> <EL>  Command the rotator to this azimuth/elevation
  -l, --list                List the known rotator models and exit
  -h, --help                Print this help message

Examples:
  # Query the dummy rotator
  rotd

  # Point a configured rotator
  rotd rotator.toml --position 180 30
"#
    );
}

/// Loader of backend family 0
fn load_dummy(registry: &CapsRegistry) -> RotResult<()> {
    for caps in rot_dummy::all_caps() {
        registry.register(caps)?;
    }
    Ok(())
}

fn main() -> anyhow::Result<()> {
    // Initialize logging
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "rotd=info,rot_frontend=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    let raw: Vec<String> = std::env::args().skip(1).collect();
    let args = parse_args(&raw)?;

    let registry = Arc::new(CapsRegistry::new());
    registry.register_loader(rot_dummy::DUMMY_BACKEND, load_dummy);

    if args.list {
        registry.check_backend(rot_dummy::MODEL_DUMMY)?;
        registry.list_foreach(|caps| {
            println!(
                "{}",
                serde_json::json!({
                    "model": caps.model,
                    "manufacturer": caps.mfg_name,
                    "name": caps.model_name,
                    "version": caps.version,
                    "port_type": caps.port_type,
                })
            );
            ControlFlow::Continue(())
        });
        return Ok(());
    }

    let config = match args.config_path {
        Some(ref path) => {
            tracing::info!("Loading config from: {}", path);
            RotatorConfig::from_file(path)?
        }
        None => {
            tracing::info!("No config file provided, using the dummy rotator");
            RotatorConfig {
                model: rot_dummy::MODEL_DUMMY,
                conf: Default::default(),
            }
        }
    };

    let mut manager = RotManager::new(registry);
    run(&mut manager, &config, args.position)
}

fn run(
    manager: &mut RotManager,
    config: &RotatorConfig,
    position: Option<(f64, f64)>,
) -> anyhow::Result<()> {
    let model: RotModel = config.model;
    let id = manager
        .create(model)
        .with_context(|| format!("Failed to create rotator model {}", model))?;

    manager.apply_config(id, config)?;
    manager.open(id).context("Failed to open rotator")?;

    if let Some((az, el)) = position {
        tracing::info!(az, el, "Commanding position");
        manager.set_position(id, az, el)?;
    }

    let current = manager.get_position(id).ok();
    let info = manager.get_info(id).map(str::to_string);

    println!(
        "{}",
        serde_json::json!({
            "model": model,
            "info": info,
            "position": current,
        })
    );

    manager.close(id)?;
    manager.destroy(id)?;
    Ok(())
}

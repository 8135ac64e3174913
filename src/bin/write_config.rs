use std::path::PathBuf;

use anyhow::{Context, Result};

use gridiron_edge::config::{self, ModelConfig};

// Writes the built-in model config so it can be edited by hand.
fn main() -> Result<()> {
    let path = std::env::args()
        .skip(1)
        .find(|a| !a.starts_with("--"))
        .map(PathBuf::from)
        .or_else(config::config_path)
        .context("unable to resolve model config path")?;

    let current = config::load_config(&path);
    let cfg = if std::env::args().any(|a| a == "--reset") {
        ModelConfig::default()
    } else {
        current
    };
    config::save_config(&cfg, &path)?;
    println!("Model config written to {}", path.display());
    Ok(())
}

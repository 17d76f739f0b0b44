mod check;

use anyhow::anyhow;
use std::path::PathBuf;

const USAGE: &str = "usage: configurator-native <config.json> [asset-root]";

fn run() -> anyhow::Result<()> {
    let mut args = std::env::args_os().skip(1);
    let config_path = PathBuf::from(args.next().ok_or_else(|| anyhow!(USAGE))?);
    let asset_root = match args.next() {
        Some(root) => PathBuf::from(root),
        None => config_path
            .parent()
            .map(PathBuf::from)
            .unwrap_or_else(|| PathBuf::from(".")),
    };

    let config = check::load(&config_path)?;
    log::info!(
        "loaded `{}` ({}): {} colors, {} straps, {} environments",
        config.id,
        config.name,
        config.colors.len(),
        config.straps.len(),
        config.environments.len()
    );

    let missing = check::missing_assets(&config, &asset_root);
    for path in &missing {
        log::error!("missing asset: {}", path.display());
    }

    let plan = check::texture_plan(&config)?;
    println!("texture plan ({} selections):", plan.len());
    for entry in &plan {
        println!("  {}", entry);
    }
    println!("default share link: {}", check::default_share_url(&config)?);

    if !missing.is_empty() {
        return Err(anyhow!(
            "{} referenced asset(s) missing under {}",
            missing.len(),
            asset_root.display()
        ));
    }
    Ok(())
}

fn main() {
    env_logger::builder()
        .filter_level(log::LevelFilter::Info)
        .parse_default_env()
        .init();

    if let Err(e) = run() {
        log::error!("{:#}", e);
        std::process::exit(1);
    }
}

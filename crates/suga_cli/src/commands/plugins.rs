//! Plugins command - List the plugins in a catalogue directory.

use std::path::PathBuf;

use anyhow::Result;
use clap::Args;
use serde_json::json;
use tracing::info;

use suga_plugins::CatalogueLoader;

#[derive(Args)]
pub struct PluginsArgs {
    /// Plugin catalogue directory
    #[arg(long, env = "SUGA_PLUGINS", default_value = "plugins")]
    pub plugins: PathBuf,

    /// Print the catalogue as JSON
    #[arg(long)]
    pub json: bool,
}

pub fn execute(args: PluginsArgs) -> Result<()> {
    info!("Loading plugins from {}", args.plugins.display());
    let catalogue = CatalogueLoader::new(&args.plugins).load_all()?;

    if args.json {
        let entries: Vec<_> = catalogue
            .entries()
            .into_iter()
            .map(|(reference, manifest)| json!({ "reference": reference, "manifest": manifest }))
            .collect();
        println!("{}", serde_json::to_string_pretty(&entries)?);
        return Ok(());
    }

    if catalogue.is_empty() {
        println!("No plugins found in {}", args.plugins.display());
        return Ok(());
    }

    println!("📦 {} plugins in {}", catalogue.len(), args.plugins.display());
    for (reference, manifest) in catalogue.entries() {
        match manifest.identity_type() {
            Some(identity_type) => println!(
                "   {} ({}, provides {})",
                reference,
                manifest.kind(),
                identity_type
            ),
            None => println!("   {} ({})", reference, manifest.kind()),
        }
    }

    Ok(())
}

//! Retrieve command - produce catalog entries for the latest release

use crate::cli::args::RetrieveArgs;
use crate::config::Config;
use crate::error::{VsdbgError, VsdbgResult};
use crate::retrieval::{LicenseMode, Retrieval};
use console::style;

/// Execute the retrieve command
pub async fn execute(args: RetrieveArgs, config: &Config) -> VsdbgResult<()> {
    let mut settings = config.retrieval.clone();
    if args.scan_licenses {
        settings.license_mode = LicenseMode::Scan;
    }
    if !args.platforms.is_empty() {
        settings.platforms = args.platforms;
    }

    let retrieval = Retrieval::from_config(&settings);
    let descriptors = tokio::task::spawn_blocking(move || retrieval.run())
        .await
        .map_err(|e| VsdbgError::Internal(format!("retrieval task failed: {}", e)))??;

    let json = serde_json::to_string_pretty(&descriptors)?;

    match args.output {
        Some(path) => {
            tokio::fs::write(&path, format!("{}\n", json))
                .await
                .map_err(|e| VsdbgError::io(format!("writing {}", path.display()), e))?;
            eprintln!(
                "{} Wrote {} descriptor(s) to {}",
                style("✓").green(),
                descriptors.len(),
                path.display()
            );
        }
        None => println!("{}", json),
    }

    Ok(())
}

use crate::cli::output::OutputFormatter;
use crate::config::{CONFIG_FILE_STEM, Config};
use crate::error::Result;
use crate::storage::FileGateway;
use std::path::Path;

/// Handle the init command
///
/// Creates the table files and, unless one exists, a `valet.yaml` holding
/// the default configuration.
pub async fn handle_init(
    data_dir: Option<&Path>,
    force: bool,
    formatter: &OutputFormatter,
) -> Result<()> {
    let config = Config::load(data_dir)?;
    let data_dir = config.data_dir(data_dir);
    let gateway = FileGateway::init(&data_dir, force).await?;

    let has_config = ["toml", "yaml", "yml", "json"]
        .iter()
        .any(|ext| data_dir.join(format!("{CONFIG_FILE_STEM}.{ext}")).exists());
    if !has_config {
        let path = data_dir.join(format!("{CONFIG_FILE_STEM}.yaml"));
        tokio::fs::write(&path, serde_yaml::to_string(&Config::default())?).await?;
        tracing::debug!("Wrote default configuration to {}", path.display());
    }

    if formatter.is_json() {
        formatter.json(&serde_json::json!({
            "status": "success",
            "data_dir": gateway.data_dir(),
            "reset": force,
        }))?;
    } else {
        formatter.success(&format!(
            "Initialized valet data directory at {}",
            gateway.data_dir().display()
        ));
    }
    Ok(())
}

use anyhow::{Context, Result, bail};
use shared::config::ClientConfig;
use std::fs;

/// Writes a default `ayna.yaml` or `ayna.json` into the current directory.
pub fn generate_config(format: &str) -> Result<()> {
    let file_name = config_file_name(format)?;
    let serialized = render(&ClientConfig::with_defaults(), format)?;

    fs::write(file_name, serialized.as_bytes())
        .with_context(|| format!("failed to write {file_name}"))?;
    println!("Configuration file '{file_name}' generated successfully.");
    Ok(())
}

fn config_file_name(format: &str) -> Result<&'static str> {
    match format {
        "yaml" => Ok("ayna.yaml"),
        "json" => Ok("ayna.json"),
        other => bail!("unsupported format `{other}`; use 'yaml' or 'json'"),
    }
}

fn render(config: &ClientConfig, format: &str) -> Result<String> {
    Ok(match format {
        "yaml" => serde_yml::to_string(config)?,
        "json" => serde_json::to_string_pretty(config)?,
        other => bail!("unsupported format `{other}`; use 'yaml' or 'json'"),
    })
}

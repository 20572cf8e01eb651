//! `contextkit config`: Configuration commands.

use contextkit_config::RetrievalConfig;

pub fn show() -> Result<(), Box<dyn std::error::Error>> {
    let config = RetrievalConfig::load().map_err(|e| format!("Failed to load config: {e}"))?;
    let toml_str = toml::to_string_pretty(&config)?;
    println!("{toml_str}");
    Ok(())
}

pub fn path() -> Result<(), Box<dyn std::error::Error>> {
    let config_path = RetrievalConfig::config_dir().join("config.toml");
    println!("{}", config_path.display());
    Ok(())
}

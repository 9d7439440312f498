//! Configuration inspection command.

use crate::config;

/// Print the config path and the effective configuration.
pub fn cmd_config(init: bool) -> anyhow::Result<()> {
    if init {
        let path = config::save(&config::Config::default())?;
        println!("✓ Wrote default configuration to {}", path.display());
        println!();
    }

    match config::config_path() {
        Some(path) if path.exists() => println!("Config file: {}", path.display()),
        Some(path) => println!(
            "Config file: {} (not created, using defaults)",
            path.display()
        ),
        None => println!("Config file: unavailable on this system"),
    }
    println!();

    let effective = config::load();
    print!("{}", toml::to_string_pretty(&effective)?);
    Ok(())
}

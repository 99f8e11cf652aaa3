use crate::config::generate::generate_starter_config;
use std::fs;
use std::path::PathBuf;

pub fn init(stdout: bool) -> Result<(), Box<dyn std::error::Error>> {
    let config_content = generate_starter_config();

    if stdout {
        print!("{}", config_content);
        return Ok(());
    }

    let config_path = if let Some(home_dir) = dirs::home_dir() {
        let user_config = home_dir.join(".config/bakrot/config.yml");
        match user_config.parent().map(fs::create_dir_all) {
            Some(Ok(())) => user_config,
            _ => {
                eprintln!("Warning: could not create user config directory");
                eprintln!("Falling back to /etc/bakrot/config.yml");
                PathBuf::from("/etc/bakrot/config.yml")
            }
        }
    } else {
        PathBuf::from("/etc/bakrot/config.yml")
    };

    if config_path.exists() {
        eprintln!("Error: config file already exists at {}", config_path.display());
        eprintln!("Remove it first or use --stdout to print the config");
        std::process::exit(1);
    }

    if let Some(parent) = config_path.parent() {
        fs::create_dir_all(parent)?;
    }

    fs::write(&config_path, config_content)?;

    println!("Config file written to {}", config_path.display());
    Ok(())
}

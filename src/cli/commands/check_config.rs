//! Check-config command handler

use crate::config::Config;

pub fn cmd_check_config(config: &Config) -> anyhow::Result<()> {
    config.validate()?;

    println!("Configuration OK");
    println!("{:-<50}", "");
    println!("Database:        {}", config.general.database_path);
    println!(
        "Listen:          {}:{}",
        config.server.bind_address, config.server.port
    );
    println!("Session store:   {:?}", config.server.session_store);
    println!(
        "Session timeout: {} min",
        config.server.session_inactivity_minutes
    );
    println!("Max upload:      {} MiB", config.server.max_upload_size_mb);
    println!("CORS origins:    {}", config.server.cors_allowed_origins.join(", "));
    println!(
        "Metrics:         {}",
        if config.observability.metrics_enabled {
            "enabled"
        } else {
            "disabled"
        }
    );

    Ok(())
}

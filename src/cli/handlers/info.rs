//! Information display handlers

use crate::cli::output::print_config;
use crate::config::AppConfig;
use crate::Result;

pub fn handle_config_command(config: &AppConfig) -> Result<()> {
    config.validate()?;
    print_config(config);
    Ok(())
}

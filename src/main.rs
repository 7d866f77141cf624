use anyhow::Result;
use log::error;
use std::process;

use msr_sampler::{app, cli, logging};

fn main() {
    if let Err(e) = run() {
        let error_msg = format!("{:#}", e);

        // Input problems go to stderr only; anything else is logged as well
        let is_user_error = error_msg.contains("Malformed input")
            || error_msg.contains("Directory does not exist")
            || error_msg.contains("would overwrite its input")
            || error_msg.contains("No clones directory");

        if !is_user_error {
            error!("Application error: {}", error_msg);
        }
        eprintln!("Error: {}", error_msg);
        process::exit(1);
    }
}

fn run() -> Result<()> {
    let args = cli::parse_args();

    cli::validate_args(&args)?;

    let config_manager = app::load_configuration(&args)?;

    let log_config = app::configure_logging(&args, &config_manager)?;
    logging::init_logger(log_config)?;

    app::run_command(&args, &config_manager)
}

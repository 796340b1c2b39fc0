use std::process::ExitCode;

use clap::Parser;
use dotenvy::dotenv;
use gophermart::{cli::Arguments, commands::execute, config::GophermartConfig};
use log::*;

#[tokio::main]
async fn main() -> ExitCode {
    dotenv().ok();
    let args = Arguments::parse();
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(args.log_level.as_str())).init();
    let config = match GophermartConfig::from_args(&args) {
        Ok(config) => config,
        Err(e) => {
            eprintln!("{e}");
            return ExitCode::from(e.exit_code());
        },
    };
    match execute(args.command.unwrap_or_default(), &config).await {
        Ok(Some(output)) => {
            println!("{output}");
            ExitCode::SUCCESS
        },
        Ok(None) => {
            info!("👋️ Bye!");
            ExitCode::SUCCESS
        },
        Err(e) => {
            error!("{e}");
            eprintln!("{e}");
            ExitCode::from(e.exit_code())
        },
    }
}

use aq_collector::cli::{run, Args};
use aq_collector::Settings;
use clap::Parser;
use log::error;
use std::process;

#[tokio::main]
async fn main() {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();
    let args = Args::parse();

    let settings = match Settings::load(args.config.as_deref()) {
        Ok(settings) => settings,
        Err(e) => {
            error!("Failed to read configuration: {}", e);
            process::exit(1);
        }
    };

    if let Err(e) = run(args, settings, reqwest::Client::new()).await {
        error!("{}", e);
        process::exit(1);
    }
}

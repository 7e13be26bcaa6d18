mod api;
mod app;
mod application;
mod config;
mod domain;
mod http;
mod logging;
mod utils;

use clap::Parser;

#[tokio::main]
async fn main() {
    let settings = config::Settings::parse();
    logging::init_logging(settings.log.as_deref());

    if let Err(e) = app::run(settings).await {
        tracing::error!("{}", e);
        std::process::exit(1);
    }
}

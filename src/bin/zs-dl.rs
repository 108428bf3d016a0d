//! zs-dl CLI - download files from share links and `.dlc` containers.

#![warn(clippy::pedantic)]
#![warn(clippy::nursery)]

use std::process;

use env_logger::Env;

#[tokio::main]
async fn main() {
    env_logger::Builder::from_env(Env::default().default_filter_or("zs_dl=info")).init();

    if let Err(e) = zs_dl::cli::run().await {
        log::error!("{e}");
        process::exit(1);
    }
}

mod api;
mod cli;
mod config;
mod execute;
mod filter;
mod model;
mod render;
mod token;

use std::process;

use config::Config;

fn main() {
    let config = match Config::load() {
        Ok(config) => config,
        Err(e) => {
            eprintln!("{e}");
            process::exit(1);
        }
    };

    if let Err(e) = cli::run(&config) {
        eprintln!("Error: {e}");
        process::exit(1);
    }
}

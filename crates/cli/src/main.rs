mod cli;
mod pipeline;

use clap::Parser;
use cli::Cli;
use std::process;

fn main() {
    let cli = Cli::parse();
    let output = cli.output_path();

    if let Err(error) = pipeline::run(&cli.input, &output) {
        eprintln!("error: {}", error);
        process::exit(1);
    }
}

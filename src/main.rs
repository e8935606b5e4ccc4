//! Entry point for the RuSeFo application.
//! Handles CLI parsing, configuration, and runs the batch driver over the
//! input directory.

use clap::Parser;
use ru_se_fo::batch::process_directory;
use ru_se_fo::cli::Args;
use ru_se_fo::config::ProcessingConfig;

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let args = Args::parse();

    println!(
        r#"
------------------------------------------------------------------
            ______      _____      ______
            | ___ \    /  ___|     |  ___|
            | |_/ /   _\ `--.  ___ | |_ ___
            |    / | | |`--. \/ _ \|  _/ _ \
            | |\ \ |_| /\__/ /  __/| || (_) |
            \_| \_\__,_\____/ \___|\_| \___/
                Rust-based seasonal forecast tool
------------------------------------------------------------------
                        "#
    );

    let config = ProcessingConfig::from_args(args)?;
    println!(
        "Processing {} forecasts from {}",
        config.centre,
        config.input_dir.display()
    );
    println!("Start");

    let summary = process_directory(&config)?;
    if summary.files_failed == 0 {
        println!("Successful");
    }

    Ok(())
}

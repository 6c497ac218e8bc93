//! Generator entry point: CLI wiring and config-driven generation.

use std::process;

use clap::Parser;
use tracing::error;

use synth_grid::cli::CliArgs;
use synth_grid::report::GenerationReport;
use synth_grid::telemetry::init_tracing;

fn main() {
    init_tracing();
    let cli = CliArgs::parse();

    let config = match cli.load_config() {
        Ok(cfg) => cfg,
        Err(e) => {
            eprintln!("{e}");
            process::exit(1);
        }
    };

    let errors = config.validate();
    if !errors.is_empty() {
        for e in &errors {
            eprintln!("{e}");
        }
        process::exit(1);
    }

    let built = config
        .generator()
        .and_then(|generator| Ok((generator, config.to_request()?)));
    let (generator, request) = match built {
        Ok(pair) => pair,
        Err(e) => {
            eprintln!("{e}");
            process::exit(1);
        }
    };

    let dataset = match generator.generate(&request) {
        Ok(dataset) => dataset,
        Err(e) => {
            error!(%e, "generation failed");
            eprintln!("error: {e}");
            process::exit(1);
        }
    };

    println!(
        "{}",
        GenerationReport::from_dataset(&dataset, config.output.sample_size)
    );
}

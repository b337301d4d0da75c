use std::env;
use std::process;

use log::{error, info};

use qed_cascade::{RunConfig, RunManager};

fn run(path: &str) -> qed_cascade::Result<()> {
    let config = RunConfig::from_json_file(path)?;
    let output = config.output.clone();
    let results = RunManager::from_config(config).beam_on()?;

    match output {
        Some(output) => {
            results.write_json(&output)?;
            info!("Results written to {}", output);
        }
        None => {
            for histogram in &results.histograms {
                println!("{} ({} entries)", histogram.name(), histogram.entries());
                for (centre, value) in histogram.bin_centres().iter().zip(histogram.normalised()) {
                    println!("{:.6e}\t{:.6e}", centre, value);
                }
            }
        }
    }
    Ok(())
}

/// The config path, or the usage line when the arguments are wrong.
fn config_path(args: &[String]) -> Result<&str, String> {
    match args {
        [_, path] => Ok(path.as_str()),
        _ => {
            let program = args.first().map_or("qed-cascade", String::as_str);
            Err(format!("usage: {} <config.json>", program))
        }
    }
}

fn main() {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let args: Vec<String> = env::args().collect();
    let path = match config_path(&args) {
        Ok(path) => path,
        Err(usage) => {
            eprintln!("{}", usage);
            process::exit(2);
        }
    };

    if let Err(err) = run(path) {
        error!("{}", err);
        process::exit(1);
    }
}

//! # Tale
//!
//! This binary is the command-line front end for the TALE engine. It
//! combines the translator and sandboxed executor behind two subcommands,
//! `run` and `analyze`, and prints the resulting JSON to stdout.
extern crate tale;

mod cli;

use cli::*;

use std::{error::Error, fs};

use log::{error, info};

fn main() -> Result<(), Box<dyn Error>> {
    let args = Cli::init();

    simple_logger::init_with_level(args.verbosity.into()).unwrap();

    match args.command {
        Commands::Run(run_args) => run(run_args),
        Commands::Analyze(analyze_args) => analyze(analyze_args),
    }
}

fn run(args: RunArgs) -> Result<(), Box<dyn Error>> {
    let path = fs::canonicalize(&args.file)?;
    info!("running {}", path.display());

    let code = fs::read_to_string(&path)?;
    let inputs = match &args.inputs {
        Some(path) => fs::read_to_string(path)?.lines().map(str::to_owned).collect(),
        None => Vec::new(),
    };

    let result = tale::run(&code, inputs);
    if !result.ok {
        error!("{}", result.error.as_deref().unwrap_or("run failed"));
    }

    print_json(&result, args.pretty)
}

fn analyze(args: AnalyzeArgs) -> Result<(), Box<dyn Error>> {
    let path = fs::canonicalize(&args.file)?;
    info!("analyzing {}", path.display());

    let code = fs::read_to_string(&path)?;
    let result = tale::analyze(&code);
    if !result.ok {
        error!("found {} diagnostic(s)", result.diagnostics.len());
    }

    print_json(&result, args.pretty)
}

fn print_json(value: &impl serde::Serialize, pretty: bool) -> Result<(), Box<dyn Error>> {
    let text = if pretty {
        serde_json::to_string_pretty(value)?
    } else {
        serde_json::to_string(value)?
    };
    println!("{text}");
    Ok(())
}

use std::path::{Path, PathBuf};

use clap::Parser;
use storyvm::{ExecutionContext, StackConfig, script};

/// Replay a JSON script of stack operations against a fresh execution context.
#[derive(Parser)]
#[command(name = "storyvm", version)]
struct Cli {
    /// Script file: a JSON array of operations
    script: PathBuf,
    /// Stack capacities as JSON (defaults apply to missing fields)
    #[arg(long)]
    config: Option<PathBuf>,
    /// Log snapshot transitions and garbage collection to stderr
    #[arg(short, long)]
    verbose: bool,
}

fn read(path: &Path) -> String {
    match std::fs::read_to_string(path) {
        Ok(s) => s,
        Err(e) => {
            eprintln!("error: reading {}: {}", path.display(), e);
            std::process::exit(1);
        }
    }
}

fn main() {
    let cli = Cli::parse();

    let level = if cli.verbose { log::LevelFilter::Debug } else { log::LevelFilter::Warn };
    if let Err(e) = simple_logger::SimpleLogger::new().with_level(level).init() {
        eprintln!("warning: logger not installed: {}", e);
    }

    let config = match &cli.config {
        Some(path) => match StackConfig::from_json(&read(path)) {
            Ok(c) => c,
            Err(e) => {
                eprintln!("error: {}", e);
                std::process::exit(1);
            }
        },
        None => StackConfig::default(),
    };

    let ops = match script::parse(&read(&cli.script)) {
        Ok(ops) => ops,
        Err(e) => {
            eprintln!("error: {}", e);
            std::process::exit(1);
        }
    };

    let mut ctx = match ExecutionContext::new(&config) {
        Ok(ctx) => ctx,
        Err(e) => {
            eprintln!("error: {}", e);
            std::process::exit(1);
        }
    };

    if let Err(e) = script::run(&mut ctx, &ops, |line| println!("{}", line)) {
        eprintln!("error: {}", e);
        std::process::exit(1);
    }
}

//! ncu-rc CLI
//!
//! Entry point for the `ncu-rc` command-line tool.

use std::io;
use std::process;

use clap::CommandFactory;
use log::{debug, LevelFilter};
use ncu_rc::check::{log_level, open_registry, run_check};
use ncu_rc::cli::{layer_from_matches, Cli};
use ncu_rc::config::{resolve, ResolveContext};
use ncu_rc::output::render_stdout;

fn main() {
    // RUST_LOG, when set, wins over --loglevel (except --silent)
    let env_filter = std::env::var_os("RUST_LOG").is_some();
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("debug")).init();
    if !env_filter {
        log::set_max_level(LevelFilter::Warn);
    }

    if let Err(e) = run(env_filter) {
        eprintln!("Error: {}", e);
        process::exit(1);
    }
}

fn run(env_filter: bool) -> ncu_rc::Result<()> {
    let matches = Cli::command().get_matches();
    let cli = layer_from_matches(&matches);

    let ctx = ResolveContext::from_process()?;
    let options = resolve(&cli, &ctx)?;
    let level = log_level(&options);
    if !env_filter || level == LevelFilter::Off {
        log::set_max_level(level);
    }
    debug!("effective options: {}", options.to_json());

    let registry = open_registry(&options, &ctx)?;
    let reports = run_check(&options, &ctx, io::stdin().lock(), &registry)?;
    println!("{}", render_stdout(&options, &reports)?);
    Ok(())
}

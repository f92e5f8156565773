#![forbid(unsafe_code)]

//! `treegrid`: load a JSON tree, run a command script, print the window.

use std::fs::File;
use std::io::{self, BufReader, Write};
use std::process::ExitCode;

use treegrid_core::{GridHooks, TreeGrid};
use treegrid_harness::cli::Opts;
use treegrid_harness::{HarnessError, JsonFileSource, logging, render_window, run_script};

fn main() -> ExitCode {
    let opts = Opts::parse();
    if let Err(err) = logging::init(opts.log_json) {
        eprintln!("failed to install logger: {err}");
    }
    match run(&opts) {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            tracing::error!(error = %err, "treegrid failed");
            eprintln!("error: {err}");
            ExitCode::FAILURE
        }
    }
}

fn run(opts: &Opts) -> Result<(), HarnessError> {
    let options = opts.grid_options()?;
    let hooks = GridHooks::new()
        .on_delete(|parent| tracing::info!(parent = %parent.id(), "node deleted"))
        .on_click(|node| tracing::info!(node = %node.id(), title = node.payload().title(), "row selected"));
    let mut grid = TreeGrid::new(options, hooks)?;

    // `Opts::parse` guarantees a data path.
    let Some(data) = &opts.data else {
        return Ok(());
    };
    let mut source = JsonFileSource::new(data);
    let rows = grid.load_from(&mut source)?;
    tracing::info!(rows, path = %data.display(), "tree loaded");

    let stdout = io::stdout();
    let mut out = stdout.lock();
    let summary = match &opts.script {
        Some(path) => run_script(&mut grid, &mut source, BufReader::new(File::open(path)?), &mut out)?,
        None => run_script(&mut grid, &mut source, io::stdin().lock(), &mut out)?,
    };
    if summary.errors > 0 {
        tracing::warn!(errors = summary.errors, commands = summary.commands, "script had errors");
    }
    write!(out, "{}", render_window(&grid)?)?;
    out.flush()?;
    Ok(())
}

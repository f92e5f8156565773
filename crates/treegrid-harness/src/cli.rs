//! Command-line argument parsing for the `treegrid` binary.
//!
//! Parses args manually. Environment variables with the `TREEGRID_` prefix
//! override defaults; explicit flags override both.

use std::env;
use std::fs;
use std::path::PathBuf;
use std::process;

use treegrid_core::GridOptions;

use crate::HarnessError;

const VERSION: &str = env!("CARGO_PKG_VERSION");

const HELP_TEXT: &str = "\
treegrid - drive a virtualized tree grid from a command script

USAGE:
    treegrid [OPTIONS] DATA.json

OPTIONS:
    --script=PATH        Read commands from PATH instead of stdin
    --options=PATH       Load grid options from a JSON file
    --window-size=N      Rows per window (default: 15)
    --row-height=N       Row height in pixels (default: 35)
    --paginate           Start in pagination mode
    --lazy-load          Fetch folder children on first expand
    --log-json           Log JSON lines to stderr
    --help, -h           Show this help message
    --version, -V        Show version

COMMANDS (one per line):
    toggle ROW, select ROW, filter [TEXT], range BEGIN, page N, next, prev,
    paginate on|off, size N, scroll OFFSET TOTAL, add PARENT TITLE, folder PARENT TITLE,
    delete ID, move ID PARENT, sort COLUMN asc|desc, show

ENVIRONMENT VARIABLES:
    TREEGRID_DATA            Override DATA.json
    TREEGRID_SCRIPT          Override --script
    TREEGRID_OPTIONS         Override --options
    TREEGRID_WINDOW_SIZE     Override --window-size
    TREEGRID_ROW_HEIGHT      Override --row-height
    TREEGRID_PAGINATE        Set to 1 to paginate
    TREEGRID_LAZY_LOAD       Set to 1 to lazy load
    TREEGRID_LOG_JSON        Set to 1 for JSON logs
    RUST_LOG                 Log filter (default: warn)";

/// Parsed command-line options.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Opts {
    /// JSON file with the tree payloads.
    pub data: Option<PathBuf>,
    /// Command script; stdin when absent.
    pub script: Option<PathBuf>,
    /// JSON options file applied before the flags below.
    pub options: Option<PathBuf>,
    pub window_size: Option<usize>,
    pub row_height: Option<u32>,
    pub paginate: bool,
    pub lazy_load: bool,
    pub log_json: bool,
}

/// What the arguments asked for.
#[derive(Debug, Clone, PartialEq)]
pub enum Parsed {
    Run(Opts),
    Help,
    Version,
}

fn flag_enabled(val: &str) -> bool {
    matches!(val, "1" | "true" | "yes" | "on")
}

fn number<T: std::str::FromStr>(flag: &str, val: &str) -> Result<T, String> {
    val.parse()
        .map_err(|_| format!("Invalid {flag} value: {val}"))
}

impl Opts {
    /// Parse process arguments and environment, exiting on `--help`,
    /// `--version` or a usage error.
    pub fn parse() -> Self {
        match Self::parse_from(env::args().skip(1), |key| env::var(key).ok()) {
            Ok(Parsed::Run(opts)) => opts,
            Ok(Parsed::Help) => {
                println!("{HELP_TEXT}");
                process::exit(0);
            }
            Ok(Parsed::Version) => {
                println!("treegrid {VERSION}");
                process::exit(0);
            }
            Err(message) => {
                eprintln!("{message}");
                eprintln!("Run with --help for usage information.");
                process::exit(2);
            }
        }
    }

    /// Parse `args` with environment lookups through `var`.
    pub fn parse_from(
        args: impl IntoIterator<Item = String>,
        var: impl Fn(&str) -> Option<String>,
    ) -> Result<Parsed, String> {
        let mut opts = Self::default();

        // Environment first; flags below override it.
        opts.data = var("TREEGRID_DATA").map(PathBuf::from);
        opts.script = var("TREEGRID_SCRIPT").map(PathBuf::from);
        opts.options = var("TREEGRID_OPTIONS").map(PathBuf::from);
        if let Some(val) = var("TREEGRID_WINDOW_SIZE")
            && let Ok(n) = val.parse()
        {
            opts.window_size = Some(n);
        }
        if let Some(val) = var("TREEGRID_ROW_HEIGHT")
            && let Ok(n) = val.parse()
        {
            opts.row_height = Some(n);
        }
        opts.paginate = var("TREEGRID_PAGINATE").is_some_and(|v| flag_enabled(&v));
        opts.lazy_load = var("TREEGRID_LAZY_LOAD").is_some_and(|v| flag_enabled(&v));
        opts.log_json = var("TREEGRID_LOG_JSON").is_some_and(|v| flag_enabled(&v));

        for arg in args {
            match arg.as_str() {
                "--help" | "-h" => return Ok(Parsed::Help),
                "--version" | "-V" => return Ok(Parsed::Version),
                "--paginate" => opts.paginate = true,
                "--lazy-load" => opts.lazy_load = true,
                "--log-json" => opts.log_json = true,
                other => {
                    if let Some(val) = other.strip_prefix("--script=") {
                        opts.script = Some(PathBuf::from(val));
                    } else if let Some(val) = other.strip_prefix("--options=") {
                        opts.options = Some(PathBuf::from(val));
                    } else if let Some(val) = other.strip_prefix("--window-size=") {
                        opts.window_size = Some(number("--window-size", val)?);
                    } else if let Some(val) = other.strip_prefix("--row-height=") {
                        opts.row_height = Some(number("--row-height", val)?);
                    } else if other.starts_with('-') {
                        return Err(format!("Unknown argument: {other}"));
                    } else {
                        opts.data = Some(PathBuf::from(other));
                    }
                }
            }
        }

        if opts.data.is_none() {
            return Err("Missing DATA.json argument".into());
        }
        Ok(Parsed::Run(opts))
    }

    /// Grid options: the options file (or defaults) with flags applied.
    pub fn grid_options(&self) -> Result<GridOptions, HarnessError> {
        let mut options = match &self.options {
            Some(path) => GridOptions::from_json_str(&fs::read_to_string(path)?)?,
            None => GridOptions::default(),
        };
        if let Some(n) = self.window_size {
            options = options.with_window_size(n);
        }
        if let Some(n) = self.row_height {
            options = options.with_row_height(n);
        }
        options.paginate |= self.paginate;
        options.lazy_load |= self.lazy_load;
        options.validate()?;
        Ok(options)
    }
}

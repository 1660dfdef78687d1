//! Command line parsing and startup validation.

use std::path::PathBuf;

use chrono::format::{Item, StrftimeItems};
use clap::{App, Arg};

use crate::error::ImportError;

pub const DEFAULT_DATE_FORMAT: &str = "%Y-%m-%d";

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum Verbosity {
    Quiet,
    Verbose,
    SuperVerbose,
}

impl Verbosity {
    pub fn verbose(self) -> bool {
        self >= Verbosity::Verbose
    }

    pub fn super_verbose(self) -> bool {
        self >= Verbosity::SuperVerbose
    }
}

/// Process-scoped settings, built once by args_to_opts() and read-only after.
pub struct Options {
    pub src_dir: PathBuf,
    pub dst_dir: PathBuf,
    pub date_format: String,
    pub verbosity: Verbosity,
    pub force: bool,
    pub skip_videos: bool,
}

pub fn args_to_opts() -> Result<Options, ImportError> {
    let app = App::new("picimport")
        .version(env!("CARGO_PKG_VERSION"))
        .about(
            "picimport copies photo and video files from a camera directory \n\
             into a destination tree organized by capture date",
        )
        .arg(
            Arg::with_name("source")
                .value_name("SOURCE_DIR")
                .help("directory to import from")
                .required(true),
        )
        .arg(
            Arg::with_name("destination")
                .value_name("DEST_DIR")
                .help("destination directory (defaults to ~/Pictures)"),
        )
        .arg(
            Arg::with_name("verbose")
                .short("v")
                .multiple(true)
                .help("Print verbose output (-vv also reports identical files)"),
        )
        .arg(
            Arg::with_name("date_format")
                .short("d")
                .value_name("PATTERN")
                .takes_value(true)
                .help("Date format for directory names (strftime pattern)"),
        )
        .arg(
            Arg::with_name("force")
                .short("f")
                .help("Overwrite existing files when sizes do not match"),
        )
        .arg(
            Arg::with_name("skip_videos")
                .short("s")
                .help("Skip video files"),
        );
    let amats = app.get_matches();

    let verbosity = match amats.occurrences_of("verbose") {
        0 => Verbosity::Quiet,
        1 => Verbosity::Verbose,
        _ => Verbosity::SuperVerbose,
    };

    let src_dir = PathBuf::from(amats.value_of("source").expect("required arg"));
    let dst_dir = match amats.value_of("destination") {
        Some(d) => PathBuf::from(d),
        None => default_destination()?,
    };

    let date_format = amats
        .value_of("date_format")
        .unwrap_or(DEFAULT_DATE_FORMAT)
        .to_string();
    validate_date_format(&date_format)?;

    let opts = Options {
        src_dir,
        dst_dir,
        date_format,
        verbosity,
        force: amats.is_present("force"),
        skip_videos: amats.is_present("skip_videos"),
    };
    validate_dirs(&opts)?;
    Ok(opts)
}

fn default_destination() -> Result<PathBuf, ImportError> {
    let home = dirs::home_dir()
        .ok_or_else(|| ImportError::Config("cannot determine home directory".into()))?;
    Ok(home.join("Pictures"))
}

/// Reject patterns chrono cannot format; a bad pattern would otherwise panic
/// at the first formatted file.
fn validate_date_format(fmt: &str) -> Result<(), ImportError> {
    let bad = StrftimeItems::new(fmt).any(|item| matches!(item, Item::Error));
    if bad {
        return Err(ImportError::Config(format!(
            "invalid date format pattern: {}",
            fmt
        )));
    }
    Ok(())
}

fn validate_dirs(opts: &Options) -> Result<(), ImportError> {
    if !opts.src_dir.is_dir() {
        return Err(ImportError::Config(format!(
            "invalid source: {} is not a directory",
            opts.src_dir.display()
        )));
    }
    if !opts.dst_dir.is_dir() {
        return Err(ImportError::Config(format!(
            "invalid destination: {} is not a directory",
            opts.dst_dir.display()
        )));
    }
    Ok(())
}

use anyhow::{Context, Result};
use clap::{Arg, ArgAction, ArgMatches, Command};
use std::ffi::OsString;
use std::path::PathBuf;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use crate::options::CompileOptions;

#[derive(Debug, Default)]
pub struct CliArgs {
    pub input: Option<PathBuf>,
    pub output: Option<PathBuf>,
    pub name: Option<String>,
    /// `(include name, file)` pairs
    pub headers: Vec<(String, PathBuf)>,
    pub options: CompileOptions,
    pub library_path: Option<PathBuf>,
    pub config_path: Option<PathBuf>,
    pub print_version: bool,
    pub json: bool,
    /// Overrides the configured level when set
    pub log_level: Option<String>,
}

impl CliArgs {
    /// PTX destination: `--output`, or the input with a `.ptx` extension.
    pub fn output_path(&self) -> Option<PathBuf> {
        self.output
            .clone()
            .or_else(|| self.input.as_ref().map(|input| input.with_extension("ptx")))
    }

    /// Program name: `--name`, or the input file name.
    pub fn program_name(&self) -> Option<String> {
        self.name.clone().or_else(|| {
            self.input
                .as_ref()
                .and_then(|input| input.file_name())
                .map(|name| name.to_string_lossy().into_owned())
        })
    }
}

fn command() -> Command {
    Command::new("nvrtcc")
        .version(env!("CARGO_PKG_VERSION"))
        .about("Compile CUDA C++ source to PTX with the NVRTC runtime compiler")
        .arg(
            Arg::new("input")
                .help("CUDA source file")
                .value_name("INPUT")
                .required_unless_present("print-version"),
        )
        .arg(
            Arg::new("output")
                .short('o')
                .long("output")
                .help("PTX output path (default: input with .ptx extension)")
                .value_name("PATH"),
        )
        .arg(
            Arg::new("name")
                .long("name")
                .help("Program name used in diagnostics (default: input file name)")
                .value_name("NAME"),
        )
        .arg(
            Arg::new("header")
                .short('H')
                .long("header")
                .help("Header made includable under NAME, read from PATH")
                .value_name("NAME=PATH")
                .action(ArgAction::Append),
        )
        .arg(
            Arg::new("option")
                .short('X')
                .long("option")
                .help("Raw NVRTC option, passed through verbatim")
                .value_name("FLAG")
                .allow_hyphen_values(true)
                .action(ArgAction::Append),
        )
        .arg(
            Arg::new("arch")
                .long("arch")
                .help("Virtual GPU architecture, e.g. compute_80")
                .value_name("ARCH"),
        )
        .arg(
            Arg::new("define")
                .short('D')
                .long("define")
                .help("Preprocessor definition, NAME or NAME=VALUE")
                .value_name("MACRO")
                .action(ArgAction::Append),
        )
        .arg(
            Arg::new("library")
                .long("library")
                .help("Path to the NVRTC shared library")
                .value_name("PATH"),
        )
        .arg(
            Arg::new("config")
                .long("config")
                .help("TOML configuration file")
                .value_name("PATH"),
        )
        .arg(
            Arg::new("print-version")
                .long("print-version")
                .help("Print the NVRTC version and exit")
                .action(ArgAction::SetTrue),
        )
        .arg(
            Arg::new("json")
                .long("json")
                .help("Print a JSON summary of the compilation")
                .action(ArgAction::SetTrue),
        )
        .arg(
            Arg::new("debug")
                .long("debug")
                .help("Enable debug logging")
                .action(ArgAction::SetTrue),
        )
        .arg(
            Arg::new("log-level")
                .long("log-level")
                .help("Logging level")
                .value_name("LEVEL")
                .value_parser(["error", "warn", "info", "debug", "trace"]),
        )
}

pub fn parse_args() -> Result<CliArgs> {
    from_matches(&command().get_matches())
}

pub fn parse_args_from<I, T>(args: I) -> Result<CliArgs>
where
    I: IntoIterator<Item = T>,
    T: Into<OsString> + Clone,
{
    let matches = command()
        .try_get_matches_from(args)
        .context("Invalid command line")?;
    from_matches(&matches)
}

fn from_matches(matches: &ArgMatches) -> Result<CliArgs> {
    let mut args = CliArgs {
        input: matches.get_one::<String>("input").map(PathBuf::from),
        output: matches.get_one::<String>("output").map(PathBuf::from),
        name: matches.get_one::<String>("name").cloned(),
        library_path: matches.get_one::<String>("library").map(PathBuf::from),
        config_path: matches.get_one::<String>("config").map(PathBuf::from),
        print_version: matches.get_flag("print-version"),
        json: matches.get_flag("json"),
        ..CliArgs::default()
    };

    if let Some(headers) = matches.get_many::<String>("header") {
        for header in headers {
            args.headers.push(parse_header_arg(header)?);
        }
    }

    let mut options = CompileOptions::new();
    if let Some(arch) = matches.get_one::<String>("arch") {
        options = options.gpu_architecture(arch);
    }
    if let Some(defines) = matches.get_many::<String>("define") {
        for define in defines {
            options = match define.split_once('=') {
                Some((name, value)) => options.define_value(name, value),
                None => options.define(define),
            };
        }
    }
    if let Some(raw) = matches.get_many::<String>("option") {
        for option in raw {
            options = options.raw(option);
        }
    }
    args.options = options;

    if matches.get_flag("debug") {
        args.log_level = Some("debug".to_string());
    } else if let Some(level) = matches.get_one::<String>("log-level") {
        args.log_level = Some(level.clone());
    }

    Ok(args)
}

/// Parse `NAME=PATH`.
pub fn parse_header_arg(value: &str) -> Result<(String, PathBuf)> {
    match value.split_once('=') {
        Some((name, path)) if !name.is_empty() && !path.is_empty() => {
            Ok((name.to_string(), PathBuf::from(path)))
        }
        _ => Err(anyhow::anyhow!(
            "Invalid header '{}': expected NAME=PATH",
            value
        )),
    }
}

pub fn setup_logging(level: &str) -> Result<()> {
    let level_filter = match level {
        "error" => tracing::Level::ERROR,
        "warn" => tracing::Level::WARN,
        "info" => tracing::Level::INFO,
        "debug" => tracing::Level::DEBUG,
        "trace" => tracing::Level::TRACE,
        _ => return Err(anyhow::anyhow!("Invalid log level: {}", level)),
    };

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::fmt::layer()
                .with_writer(std::io::stderr)
                .with_level(true)
                .with_target(false)
                .with_ansi(true),
        )
        .with(tracing_subscriber::filter::LevelFilter::from_level(
            level_filter,
        ))
        .init();

    Ok(())
}

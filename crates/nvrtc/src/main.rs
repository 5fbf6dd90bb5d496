use anyhow::{Context, Result};
use std::path::Path;
use tracing::info;

use nvrtc::{
    cli::{parse_args, setup_logging, CliArgs},
    load_config, load_from_file, CompileOutput, CompileRequest, Compiler, CompilerApi, Header,
    NvrtcConfig, NvrtcLibrary, VERSION,
};

fn main() -> Result<()> {
    let args = parse_args()?;

    let mut config = load_configuration(&args)?;
    if let Some(path) = &args.library_path {
        config.library_path = Some(path.clone());
    }

    setup_logging(args.log_level.as_deref().unwrap_or(&config.log_level))?;
    info!("Starting nvrtcc v{}", VERSION);

    let library = NvrtcLibrary::from_config(&config).context("Failed to load NVRTC")?;
    let version = library.version().context("Failed to query NVRTC version")?;
    info!("Using NVRTC {} from {}", version, library.path().display());

    if args.print_version {
        println!("NVRTC {version}");
        return Ok(());
    }

    let request = build_request(&args)?;
    let compiler = Compiler::new(library, config);
    let output = compiler.compile(&request)?;

    if args.json {
        println!("{}", serde_json::to_string_pretty(&output)?);
    } else if output.has_diagnostics() {
        eprintln!("{}", output.log.trim_end());
    }

    ensure_succeeded(&output)?;
    write_ptx(&args, &output)
}

/// Turn a failed compile into the error `main` exits with.
fn ensure_succeeded(output: &CompileOutput) -> Result<()> {
    if output.succeeded() {
        return Ok(());
    }
    Err(anyhow::anyhow!(
        "Compilation of {} failed: {}",
        output.program_name,
        output.status
    ))
}

fn load_configuration(args: &CliArgs) -> Result<NvrtcConfig> {
    let config = match &args.config_path {
        Some(path) => load_from_file(path),
        None => load_config(),
    };
    config.context("Failed to load configuration")
}

fn build_request(args: &CliArgs) -> Result<CompileRequest> {
    let input = args.input.as_ref().context("No input file given")?;
    let source = std::fs::read_to_string(input)
        .with_context(|| format!("Failed to read {}", input.display()))?;

    let mut request = CompileRequest::new(source).with_options(args.options.to_args());
    if let Some(name) = args.program_name() {
        request = request.with_name(name);
    }
    for (include_name, path) in &args.headers {
        let header = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read header {}", path.display()))?;
        request = request.with_header(Header::new(include_name.clone(), header));
    }

    Ok(request)
}

fn write_ptx(args: &CliArgs, output: &CompileOutput) -> Result<()> {
    let (Some(path), Some(ptx)) = (args.output_path(), output.ptx.as_deref()) else {
        return Ok(());
    };

    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        std::fs::create_dir_all(parent)
            .with_context(|| format!("Failed to create {}", parent.display()))?;
    }
    std::fs::write(&path, ptx).with_context(|| format!("Failed to write {}", path.display()))?;

    info!(
        "Wrote {} bytes of PTX to {}",
        ptx.len(),
        display_path(&path)
    );
    Ok(())
}

fn display_path(path: &Path) -> String {
    path.canonicalize()
        .unwrap_or_else(|_| path.to_path_buf())
        .display()
        .to_string()
}

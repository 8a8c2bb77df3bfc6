use std::path::PathBuf;

use clap::Parser;
use schemagen::{CodegenConfig, EmitTargets};

/// OpenAPI 3.1 to Rust schema-compiler
///
/// Reads an OpenAPI 3.1 document and writes one Rust source file per
/// component-schema/endpoint group: typed structs and enums plus their
/// runtime validators.
#[derive(Parser, Debug)]
#[command(name = "schemagen")]
#[command(author, version, about, long_about = None)]
struct Cli {
  /// Path to the OpenAPI JSON specification file
  #[arg(short, long, value_name = "FILE")]
  input: PathBuf,

  /// Directory where the generated Rust source files will be written
  #[arg(short, long, value_name = "DIR")]
  output: PathBuf,

  /// Enable verbose output with detailed progress information
  #[arg(short, long, default_value_t = false)]
  verbose: bool,

  /// Suppress non-essential output (errors only)
  #[arg(short, long, default_value_t = false)]
  quiet: bool,

  /// Emit one file per tag instead of a single flat `api.rs`
  #[arg(long, default_value_t = true)]
  module_per_tag: bool,

  /// Only emit endpoints carrying one of these tags (repeatable)
  #[arg(long = "include-tag", value_name = "TAG")]
  include_tags: Vec<String>,

  /// Drop endpoints carrying one of these tags (repeatable)
  #[arg(long = "exclude-tag", value_name = "TAG")]
  exclude_tags: Vec<String>,

  /// Directory of hand-authored doc overrides, keyed by endpoint hash
  #[arg(long, value_name = "DIR")]
  doc_override_dir: Option<PathBuf>,
}

macro_rules! log_info {
  ($cli:expr, $($arg:tt)*) => {
    if !$cli.quiet {
      println!($($arg)*);
    }
  };
}

macro_rules! log_verbose {
  ($cli:expr, $($arg:tt)*) => {
    if $cli.verbose && !$cli.quiet {
      println!($($arg)*);
    }
  };
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
  let cli = Cli::parse();

  log_info!(cli, "Loading OpenAPI spec from: {}", cli.input.display());
  let file_content = tokio::fs::read_to_string(&cli.input).await?;
  let spec = oas3::from_json(file_content)?;

  log_verbose!(cli, "Building codegen config...");
  let config = CodegenConfig::builder()
    .module_per_tag(cli.module_per_tag)
    .include_tags(cli.include_tags.clone())
    .exclude_tags(cli.exclude_tags.clone())
    .targets(EmitTargets::builder().build())
    .maybe_doc_override_dir(cli.doc_override_dir.clone())
    .build();

  log_info!(cli, "Compiling schemas and endpoints...");
  let output = schemagen::generate(&spec, &config)?;

  log_verbose!(cli, "Creating output directory: {}", cli.output.display());
  tokio::fs::create_dir_all(&cli.output).await?;

  for file in &output.files {
    let path = cli.output.join(&file.name);
    log_verbose!(cli, "Writing {}", path.display());
    tokio::fs::write(&path, &file.contents).await?;
  }

  for warning in &output.warnings {
    eprintln!("warning: {} ({}): {}", warning.kind, warning.path, warning.message);
  }

  log_info!(cli, "\nDone.");
  log_info!(cli, "  Input:   {}", cli.input.display());
  log_info!(cli, "  Output:  {}", cli.output.display());
  log_info!(cli, "  Files:   {}", output.files.len());
  log_info!(cli, "  Warnings: {}", output.warnings.len());

  Ok(())
}

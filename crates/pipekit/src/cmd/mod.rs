use std::io::Read;
use std::path::{Path, PathBuf};

use clap::{Args, Subcommand, ValueEnum};

use crate::exit::{io_error, CliResult};
use crate::output::OutputFormat;

pub mod normalize;
pub mod provider;
pub mod schemas;
pub mod stamp;
pub mod validate;
pub mod version;

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Validate a catalog document against a schema.
    Validate(ValidateArgs),
    /// Normalize ISRC or UPC identifiers.
    Normalize(NormalizeArgs),
    /// Stamp an envelope as if it passed through a stage.
    Stamp(StampArgs),
    /// List the available document schemas.
    Schemas(SchemasArgs),
    /// Check a provider against include/exclude lists.
    Provider(ProviderArgs),
    /// Show version information.
    Version(VersionArgs),
}

pub fn run(command: Command, format: OutputFormat) -> CliResult<i32> {
    match command {
        Command::Validate(args) => validate::run(args, format),
        Command::Normalize(args) => normalize::run(args, format),
        Command::Stamp(args) => stamp::run(args, format),
        Command::Schemas(args) => schemas::run(args, format),
        Command::Provider(args) => provider::run(args, format),
        Command::Version(args) => version::run(args),
    }
}

#[derive(Args, Debug)]
pub struct ValidateArgs {
    /// Document kind (see `pipekit schemas`).
    pub kind: String,
    /// JSON document to validate (`-` reads stdin).
    pub file: PathBuf,
    /// Load `<kind>.schema.json` files from this directory instead of the
    /// built-in catalog.
    #[arg(long, value_name = "DIR", env = "PIPEKIT_SCHEMA_DIR")]
    pub schema_dir: Option<PathBuf>,
    /// Treat the input as an envelope and validate its `message`.
    #[arg(long)]
    pub envelope: bool,
}

#[derive(Copy, Clone, Debug, PartialEq, Eq, ValueEnum)]
pub enum IdentifierKind {
    Isrc,
    Upc,
}

#[derive(Args, Debug)]
pub struct NormalizeArgs {
    /// Identifier type.
    pub kind: IdentifierKind,
    /// Values to normalize.
    #[arg(required = true)]
    pub values: Vec<String>,
}

#[derive(Args, Debug)]
pub struct StampArgs {
    /// Envelope JSON (`-` reads stdin).
    pub file: PathBuf,
    /// Stage name recorded on the new event.
    #[arg(long, value_name = "NAME", env = "PIPEKIT_APP")]
    pub app: String,
    /// Treat the input as a bare message and wrap it in a new envelope.
    #[arg(long)]
    pub wrap: bool,
    /// Emit a fanned-out child instead of the stamped envelope.
    #[arg(long)]
    pub fanout: bool,
    /// Print the envelope exactly as `send` would hand it to a destination.
    #[arg(long)]
    pub outgoing: bool,
}

#[derive(Args, Debug)]
pub struct SchemasArgs {
    /// Print the JSON Schema for one kind.
    #[arg(long, value_name = "KIND")]
    pub show: Option<String>,
}

#[derive(Args, Debug)]
pub struct ProviderArgs {
    /// Provider name.
    pub name: String,
    /// Providers to keep; when set, everything else is ignored.
    #[arg(long, value_delimiter = ',', env = "INCLUDED_PROVIDERS")]
    pub include: Vec<String>,
    /// Providers to ignore when no include list is set.
    #[arg(long, value_delimiter = ',', env = "EXCLUDED_PROVIDERS")]
    pub exclude: Vec<String>,
}

#[derive(Args, Debug)]
pub struct VersionArgs {
    /// Show extended build provenance.
    #[arg(long)]
    pub extended: bool,
}

/// Read a file, or stdin for `-`.
pub fn read_input(path: &Path) -> CliResult<Vec<u8>> {
    if path == Path::new("-") {
        let mut buf = Vec::new();
        std::io::stdin()
            .read_to_end(&mut buf)
            .map_err(|err| io_error("read stdin", err))?;
        return Ok(buf);
    }
    std::fs::read(path).map_err(|err| io_error(&format!("read {}", path.display()), err))
}

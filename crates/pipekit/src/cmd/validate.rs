use std::path::Path;

use pipekit::envelope::{decode, Envelope};
use pipekit::schema::{RegistryConfig, SchemaError, SchemaRegistry, ValidationError};
use serde::Serialize;
use serde_json::Value;

use crate::cmd::{read_input, ValidateArgs};
use crate::exit::{
    envelope_error, schema_error, CliError, CliResult, DATA_INVALID, SUCCESS, USAGE,
};
use crate::output::{print_json, print_table, OutputFormat};

#[derive(Serialize)]
struct ValidateOutput<'a> {
    kind: &'a str,
    valid: bool,
    errors: Vec<ValidationError>,
}

pub fn run(args: ValidateArgs, format: OutputFormat) -> CliResult<i32> {
    let registry = load_registry(args.schema_dir.as_deref())?;
    if !registry.has_schema(&args.kind) {
        return Err(schema_error("validate", SchemaError::NoSchema(args.kind)));
    }
    let input = read_input(&args.file)?;

    let document: Value = if args.envelope {
        let envelope: Envelope = decode(&input).map_err(|err| envelope_error("decode envelope", err))?;
        envelope.message
    } else {
        serde_json::from_slice(&input)
            .map_err(|err| schema_error("parse document", SchemaError::InvalidJson(err)))?
    };

    let errors = match registry.validate_value(&args.kind, document) {
        Ok(_) => Vec::new(),
        Err(SchemaError::Invalid(invalid)) => invalid.errors().collect(),
        Err(err) => return Err(schema_error("validate", err)),
    };
    let valid = errors.is_empty();
    tracing::debug!(kind = %args.kind, valid, errors = errors.len(), "validated document");

    let output = ValidateOutput {
        kind: &args.kind,
        valid,
        errors,
    };
    match format {
        OutputFormat::Json => print_json(&output)?,
        OutputFormat::Table => print_table(
            &["ERROR", "PATH", "MESSAGE"],
            output
                .errors
                .iter()
                .map(|err| vec![err.error.code().to_string(), err.path.clone(), err.message.clone()])
                .collect(),
        ),
        OutputFormat::Pretty => {
            if valid {
                println!("{}: valid", output.kind);
            } else {
                println!("{}: {} error(s)", output.kind, output.errors.len());
                for err in &output.errors {
                    let path = if err.path.is_empty() { "/" } else { &err.path };
                    println!("  {path}: {} ({})", err.message, err.error.code());
                }
            }
        }
    }

    Ok(if valid { SUCCESS } else { DATA_INVALID })
}

/// Built-in catalog, or `<kind>.schema.json` files from `dir`.
///
/// Errors are reported through the command output, so the registry does
/// not log them as well.
pub fn load_registry(dir: Option<&Path>) -> CliResult<SchemaRegistry> {
    let config = RegistryConfig {
        log_errors: false,
        ..RegistryConfig::catalog()
    };
    let registry = match dir {
        Some(dir) => SchemaRegistry::from_directory_with_config(dir, config)
            .map_err(|err| schema_error(&format!("load schemas from {}", dir.display()), err))?,
        None => SchemaRegistry::with_builtin_config(config)
            .map_err(|err| schema_error("load built-in schemas", err))?,
    };
    if registry.kinds().is_empty() {
        return Err(CliError::new(USAGE, "no schemas available; check --schema-dir"));
    }
    Ok(registry)
}

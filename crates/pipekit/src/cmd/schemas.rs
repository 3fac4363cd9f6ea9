use pipekit::schema::{Schema, SchemaError};
use serde::Serialize;
use serde_json::Value;

use crate::cmd::validate::load_registry;
use crate::cmd::SchemasArgs;
use crate::exit::{schema_error, CliResult, SUCCESS};
use crate::output::{print_json, print_json_pretty, print_table, OutputFormat};

#[derive(Serialize)]
struct SchemaSummary<'a> {
    kind: &'a str,
    #[serde(rename = "type")]
    schema_type: &'static str,
    required: usize,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    alternatives: Vec<&'a str>,
}

impl<'a> SchemaSummary<'a> {
    fn of(kind: &'a str, schema: &'a Schema) -> Self {
        let alternatives: Vec<&str> = schema.alternatives().iter().map(Schema::name).collect();
        let required = schema
            .source()
            .and_then(|source| source.get("required"))
            .and_then(Value::as_array)
            .map_or(0, Vec::len);
        Self {
            kind,
            schema_type: if alternatives.is_empty() { "object" } else { "any-of" },
            required,
            alternatives,
        }
    }
}

pub fn run(args: SchemasArgs, format: OutputFormat) -> CliResult<i32> {
    let registry = load_registry(None)?;

    if let Some(kind) = args.show.as_deref() {
        let schema = registry
            .get(kind)
            .ok_or_else(|| schema_error("show", SchemaError::NoSchema(kind.to_string())))?;
        match schema.source() {
            Some(source) => print_json_pretty(source)?,
            None => {
                let sources: Vec<&Value> = schema
                    .alternatives()
                    .iter()
                    .filter_map(Schema::source)
                    .collect();
                print_json_pretty(&serde_json::json!({ "anyOf": sources }))?;
            }
        }
        return Ok(SUCCESS);
    }

    let summaries: Vec<SchemaSummary<'_>> = registry
        .kinds()
        .into_iter()
        .filter_map(|kind| registry.get(kind).map(|schema| SchemaSummary::of(kind, schema)))
        .collect();

    match format {
        OutputFormat::Json => print_json(&summaries)?,
        OutputFormat::Table => print_table(
            &["KIND", "TYPE", "REQUIRED", "ALTERNATIVES"],
            summaries
                .iter()
                .map(|summary| {
                    vec![
                        summary.kind.to_string(),
                        summary.schema_type.to_string(),
                        summary.required.to_string(),
                        summary.alternatives.join(", "),
                    ]
                })
                .collect(),
        ),
        OutputFormat::Pretty => {
            for summary in &summaries {
                println!("{}", summary.kind);
            }
        }
    }
    Ok(SUCCESS)
}

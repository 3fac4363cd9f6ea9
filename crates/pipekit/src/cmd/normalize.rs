use pipekit::{normalize_isrc, normalize_upc};
use serde::Serialize;

use crate::cmd::{IdentifierKind, NormalizeArgs};
use crate::exit::{CliResult, SUCCESS};
use crate::output::{print_json, print_table, OutputFormat};

#[derive(Serialize)]
struct Normalized<'a> {
    input: &'a str,
    normalized: String,
}

pub fn run(args: NormalizeArgs, format: OutputFormat) -> CliResult<i32> {
    let normalize = match args.kind {
        IdentifierKind::Isrc => normalize_isrc,
        IdentifierKind::Upc => normalize_upc,
    };
    let results: Vec<Normalized<'_>> = args
        .values
        .iter()
        .map(|input| Normalized {
            input,
            normalized: normalize(input),
        })
        .collect();

    match format {
        OutputFormat::Json => print_json(&results)?,
        OutputFormat::Table => print_table(
            &["INPUT", "NORMALIZED"],
            results
                .iter()
                .map(|r| vec![r.input.to_string(), r.normalized.clone()])
                .collect(),
        ),
        OutputFormat::Pretty => {
            for result in &results {
                println!("{}", result.normalized);
            }
        }
    }
    Ok(SUCCESS)
}

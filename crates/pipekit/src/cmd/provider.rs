use pipekit::ProviderFilter;
use serde::Serialize;

use crate::cmd::ProviderArgs;
use crate::exit::{CliResult, FAILURE, SUCCESS};
use crate::output::{print_json, print_table, OutputFormat};

#[derive(Serialize)]
struct ProviderOutput<'a> {
    provider: &'a str,
    ignored: bool,
    included: &'a [String],
    excluded: &'a [String],
}

/// Exit status is `SUCCESS` when the provider is kept, `FAILURE` when ignored.
pub fn run(args: ProviderArgs, format: OutputFormat) -> CliResult<i32> {
    let filter = ProviderFilter::new(args.include, args.exclude);
    let ignored = filter.should_ignore(&args.name);

    match format {
        OutputFormat::Json => print_json(&ProviderOutput {
            provider: &args.name,
            ignored,
            included: &filter.included,
            excluded: &filter.excluded,
        })?,
        OutputFormat::Table => print_table(
            &["PROVIDER", "IGNORED", "INCLUDED", "EXCLUDED"],
            vec![vec![
                args.name.clone(),
                ignored.to_string(),
                filter.included.join(","),
                filter.excluded.join(","),
            ]],
        ),
        OutputFormat::Pretty => {
            let verdict = if ignored { "ignored" } else { "kept" };
            println!("{}: {verdict}", args.name);
        }
    }

    Ok(if ignored { FAILURE } else { SUCCESS })
}

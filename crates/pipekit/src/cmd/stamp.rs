use pipekit::envelope::{decode, EnvelopeConfig, MemoryDestination, SendError, Stamper};
use pipekit::schema::SchemaError;
use serde_json::Value;

use crate::cmd::{read_input, StampArgs};
use crate::exit::{envelope_error, schema_error, CliResult, SUCCESS};
use crate::output::{print_json, print_json_pretty, OutputFormat};

pub fn run(args: StampArgs, format: OutputFormat) -> CliResult<i32> {
    let stamper = Stamper::new(EnvelopeConfig::new(args.app));
    let input = read_input(&args.file)?;

    let mut envelope = if args.wrap {
        let message: Value = serde_json::from_slice(&input)
            .map_err(|err| schema_error("parse message", SchemaError::InvalidJson(err)))?;
        stamper.wrap(message)
    } else {
        stamper
            .receive(&input)
            .map_err(|err| envelope_error("decode envelope", err))?
    };

    if args.fanout {
        envelope = stamper.fanout(&envelope);
    }

    let output: Value = if args.outgoing {
        let mut destination = MemoryDestination::new();
        stamper
            .send(envelope, &mut destination, None)
            .map_err(|err| match err {
                SendError::Envelope(err) => envelope_error("send", err),
                SendError::Destination(never) => match never {},
            })?;
        let (sent, _) = destination.take();
        let payload = sent.last().map(|sent| sent.payload.clone()).unwrap_or_default();
        decode(&payload).map_err(|err| envelope_error("decode sent envelope", err))?
    } else {
        serde_json::to_value(&envelope)
            .map_err(|err| envelope_error("encode envelope", err.into()))?
    };

    match format {
        OutputFormat::Pretty | OutputFormat::Table => print_json_pretty(&output)?,
        OutputFormat::Json => print_json(&output)?,
    }
    Ok(SUCCESS)
}

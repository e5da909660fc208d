//! Stream commands: build a one-stage pipeline over the input and print it

use std::io::Write;

use serde_json::Value;

use super::{CliError, pair_to_record};
use crate::{EvalConfig, Evaluator, Expr, Hedge, Stream, output::JsonPrinter};

/// The stage a stream command adds.
#[derive(Debug, Clone)]
pub enum Operation {
    Filter(Expr),
    Map(Expr),
    And,
    Or,
    Not,
    Hedge(Hedge),
    Threshold(f64),
    Top(usize),
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, clap::ValueEnum)]
pub enum OutputFormat {
    /// One `{"doc", "membership"}` record per line
    #[default]
    Jsonl,
    /// A single pretty-printed array of records
    Json,
    /// Membership degrees only, one per line
    Membership,
}

/// Options for a stream command
#[derive(Debug, Clone)]
pub struct PipelineOptions {
    pub operation: Operation,
    /// Alpha-cut applied after the operation when above zero
    pub threshold: f64,
    pub config: EvalConfig,
}

/// Build the pipeline for `options` over `input` (and `other` for `and`/`or`).
pub fn build_pipeline(
    input: Stream,
    other: Option<Stream>,
    options: &PipelineOptions,
) -> Result<Stream, CliError> {
    let input = input.with_evaluator(Evaluator::with_config(options.config.clone()));
    let stream = match (&options.operation, other) {
        (Operation::And, Some(other)) => input.intersect(&other),
        (Operation::Or, Some(other)) => input.union(&other),
        (Operation::And | Operation::Or, None) => return Err(CliError::NoInput),
        (Operation::Filter(query), _) => input.filter(query.clone()),
        (Operation::Map(expr), _) => input.transform(expr.clone()),
        (Operation::Not, _) => input.complement(),
        (Operation::Hedge(hedge), _) => input.hedge(*hedge),
        (Operation::Threshold(t), _) => input.threshold(*t),
        (Operation::Top(k), _) => input.top_k(*k),
    };
    Ok(if options.threshold > 0.0 {
        stream.threshold(options.threshold)
    } else {
        stream
    })
}

/// Evaluate `stream` and print its pairs; returns how many were written.
pub fn write_results<W: Write>(
    stream: &Stream,
    format: OutputFormat,
    show_membership: bool,
    out: &mut W,
) -> Result<usize, CliError> {
    let record = |doc: Value, m: f64| -> Value {
        if show_membership {
            pair_to_record(doc, m)
        } else {
            doc
        }
    };

    let mut written = 0;
    match format {
        OutputFormat::Jsonl => {
            let printer = JsonPrinter::new(false);
            for item in stream.evaluate() {
                let (doc, m) = item?;
                writeln!(out, "{}", printer.print(&record(doc, m)))?;
                written += 1;
            }
        }
        OutputFormat::Json => {
            let records: Vec<_> = stream
                .collect()?
                .into_iter()
                .map(|(doc, m)| record(doc, m))
                .collect();
            written = records.len();
            writeln!(out, "{}", JsonPrinter::new(true).print(&Value::Array(records)))?;
        }
        OutputFormat::Membership => {
            for item in stream.evaluate() {
                let (_, m) = item?;
                writeln!(out, "{:.4}", m)?;
                written += 1;
            }
        }
    }
    Ok(written)
}

use std::{fmt, sync::Arc};

use tracing::warn;

use super::{Pairs, Stage};
use crate::{error::StreamError, value::Value};

type Producer = dyn Fn() -> Box<dyn Iterator<Item = Value>> + Send + Sync;

/// Where a pipeline's documents come from. Every document enters with
/// membership 1.0, except in `Weighted` which carries its own.
#[derive(Clone)]
pub enum Source {
    Memory(Arc<Vec<Value>>),
    Weighted(Arc<Vec<(Value, f64)>>),
    JsonLines(Arc<str>),
    Json(Arc<Value>),
    Producer { name: String, produce: Arc<Producer> },
}

impl Source {
    pub fn producer<F, I>(name: &str, produce: F) -> Self
    where
        F: Fn() -> I + Send + Sync + 'static,
        I: Iterator<Item = Value> + 'static,
    {
        Source::Producer {
            name: name.to_string(),
            produce: Arc::new(move || Box::new(produce()) as Box<dyn Iterator<Item = Value>>),
        }
    }
}

fn parse_line(index: usize, line: &str) -> Result<(Value, f64), StreamError> {
    serde_json::from_str(line)
        .map(|doc| (doc, 1.0))
        .map_err(|e| {
            let err = StreamError::Json {
                line: index + 1,
                message: e.to_string(),
            };
            warn!(line = index + 1, error = %e, "malformed JSON record");
            err
        })
}

impl Stage for Source {
    fn evaluate(&self) -> Pairs<'_> {
        match self {
            Source::Memory(docs) => Box::new(docs.iter().map(|doc| Ok((doc.clone(), 1.0)))),
            Source::Weighted(pairs) => Box::new(pairs.iter().map(|(doc, m)| Ok((doc.clone(), *m)))),
            Source::JsonLines(text) => Box::new(
                text.lines()
                    .enumerate()
                    .filter(|(_, line)| !line.trim().is_empty())
                    .map(|(i, line)| parse_line(i, line).map_err(Into::into)),
            ),
            Source::Json(value) => match value.as_ref() {
                Value::Array(items) => Box::new(items.iter().map(|doc| Ok((doc.clone(), 1.0)))),
                single => Box::new(std::iter::once(Ok((single.clone(), 1.0)))),
            },
            Source::Producer { produce, .. } => Box::new(produce().map(|doc| Ok((doc, 1.0)))),
        }
    }

    fn describe(&self) -> String {
        match self {
            Source::Memory(docs) => format!("memory[{}]", docs.len()),
            Source::Weighted(pairs) => format!("weighted[{}]", pairs.len()),
            Source::JsonLines(text) => format!("json-lines[{} bytes]", text.len()),
            Source::Json(value) => match value.as_ref() {
                Value::Array(items) => format!("json[{}]", items.len()),
                _ => "json[1]".to_string(),
            },
            Source::Producer { name, .. } => format!("producer({})", name),
        }
    }
}

impl fmt::Debug for Source {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.describe())
    }
}

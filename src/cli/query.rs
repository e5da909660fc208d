//! Query arguments: parsing, validation and formatting

use serde_json::Value;

use super::CliError;
use crate::{
    Expr, FieldRef, ast::expressions::is_path_text, format_pretty, format_query,
    output::JsonPrinter, parse_query,
};

/// Interpret a command-line query argument.
///
/// A JSON array is taken as an AST, a parenthesized string as an
/// S-expression, and a bare `:field`/`@path` as an existence test.
pub fn parse_query_arg(arg: &str) -> Result<Expr, CliError> {
    let arg = arg.trim();
    if let Ok(value @ Value::Array(_)) = serde_json::from_str::<Value>(arg) {
        return Ok(Expr::from_json(&value)?);
    }
    if arg.starts_with('(') {
        return Ok(parse_query(arg)?);
    }
    if let Some(field) = FieldRef::parse(arg) {
        return Ok(Expr::apply("exists?", vec![Expr::Field(field)]));
    }
    Err(CliError::InvalidQuery(arg.to_string()))
}

/// Interpret a `map` expression: a bare path or field reference selects
/// that value, `$` the whole document, anything else is a query whose
/// membership becomes the value.
pub fn parse_map_arg(arg: &str) -> Result<Expr, CliError> {
    let arg = arg.trim();
    if arg == "$" {
        return Ok(Expr::Context);
    }
    if let Some(field) = FieldRef::parse(arg) {
        return Ok(Expr::Field(field));
    }
    if is_path_text(arg) {
        return Ok(Expr::field(arg));
    }
    parse_query_arg(arg)
}

/// Parse an S-expression and return its JSON AST.
pub fn execute_parse(query: &str, pretty: bool) -> Result<String, CliError> {
    let expr = parse_query(query)?;
    Ok(JsonPrinter::new(pretty).print(&expr.to_json()))
}

/// Render a JSON AST as an S-expression.
pub fn execute_format(ast: &str, pretty: bool) -> Result<String, CliError> {
    let value: Value = serde_json::from_str(ast)?;
    let expr = Expr::from_json(&value)?;
    Ok(if pretty {
        format_pretty(&expr)
    } else {
        format_query(&expr)
    })
}

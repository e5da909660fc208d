//! Dotted field paths with `*` and `**` wildcards.
//!
//! A path resolves against a document root to zero or more values:
//!
//! - a literal segment descends into a mapping key; on a sequence it
//!   descends into every element that is a mapping holding the key
//!   (other elements are skipped);
//! - `*` descends into every immediate child;
//! - `**` matches the remaining path at the current value (zero depth) and
//!   at every descendant.
//!
//! Results come back in document order and are deduplicated by canonical
//! JSON, so structurally equal values collapse into one entry. An
//! unresolvable path yields an empty `Vec`, never an error.
//!
//! ```
//! use fuzzy_query::path::resolve;
//! use serde_json::json;
//!
//! let doc = json!({"a": {"x": {"c": 1}, "y": {"c": 2}, "z": {"d": 3}}});
//! assert_eq!(resolve(&doc, "a.*.c"), vec![&json!(1), &json!(2)]);
//! ```

use std::collections::HashSet;
use std::fmt;
use std::str::FromStr;

use crate::{error::ParseError, value::Value, value::canonical_key};

/// A segment in a field path.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Segment {
    /// Mapping key
    Key(String),
    /// `*`, any immediate child
    Wildcard,
    /// `**`, any depth including zero
    DeepWildcard,
}

impl fmt::Display for Segment {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Segment::Key(k) => f.write_str(k),
            Segment::Wildcard => f.write_str("*"),
            Segment::DeepWildcard => f.write_str("**"),
        }
    }
}

/// A parsed field path. The empty path addresses the root itself.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Default)]
pub struct FieldPath {
    segments: Vec<Segment>,
}

/// Child position along the walk, used to order results by document position.
type Location = Vec<usize>;

impl FieldPath {
    pub fn parse(path: &str) -> Result<FieldPath, ParseError> {
        if path.is_empty() {
            return Ok(FieldPath::default());
        }
        let segments = path
            .split('.')
            .enumerate()
            .map(|(i, seg)| match seg {
                "" => Err(ParseError::new(format!(
                    "empty segment {} in field path '{}'",
                    i, path
                ))),
                "*" => Ok(Segment::Wildcard),
                "**" => Ok(Segment::DeepWildcard),
                key => Ok(Segment::Key(key.to_string())),
            })
            .collect::<Result<Vec<_>, _>>()?;
        Ok(FieldPath { segments })
    }

    pub fn segments(&self) -> &[Segment] {
        &self.segments
    }

    pub fn has_wildcards(&self) -> bool {
        self.segments
            .iter()
            .any(|s| !matches!(s, Segment::Key(_)))
    }

    /// Resolve against `root`, returning matches in document order without
    /// structural duplicates.
    pub fn resolve<'a>(&self, root: &'a Value) -> Vec<&'a Value> {
        let mut hits = Vec::new();
        let mut ancestors = Vec::new();
        walk(
            root,
            &self.segments,
            &mut Vec::new(),
            &mut ancestors,
            &mut hits,
        );
        hits.sort_by(|a, b| a.0.cmp(&b.0));

        let mut seen = HashSet::new();
        hits.into_iter()
            .filter(|(_, v)| seen.insert(canonical_key(v)))
            .map(|(_, v)| v)
            .collect()
    }

    pub fn exists(&self, root: &Value) -> bool {
        !self.resolve(root).is_empty()
    }
}

fn walk<'a>(
    current: &'a Value,
    segments: &[Segment],
    location: &mut Location,
    ancestors: &mut Vec<*const Value>,
    hits: &mut Vec<(Location, &'a Value)>,
) {
    let Some((segment, rest)) = segments.split_first() else {
        hits.push((location.clone(), current));
        return;
    };

    match segment {
        Segment::Key(key) => match current {
            Value::Object(obj) => {
                if let Some((i, (_, child))) =
                    obj.iter().enumerate().find(|(_, (k, _))| *k == key)
                {
                    location.push(i);
                    walk(child, rest, location, ancestors, hits);
                    location.pop();
                }
            }
            Value::Array(items) => {
                for (i, item) in items.iter().enumerate() {
                    let Value::Object(obj) = item else { continue };
                    if let Some((j, (_, child))) =
                        obj.iter().enumerate().find(|(_, (k, _))| *k == key)
                    {
                        location.push(i);
                        location.push(j);
                        walk(child, rest, location, ancestors, hits);
                        location.pop();
                        location.pop();
                    }
                }
            }
            _ => {}
        },
        Segment::Wildcard => {
            for (i, child) in children(current).enumerate() {
                location.push(i);
                walk(child, rest, location, ancestors, hits);
                location.pop();
            }
        }
        Segment::DeepWildcard => {
            walk(current, rest, location, ancestors, hits);

            // Identities are tracked along the current branch only and
            // released when backtracking.
            let id = std::ptr::from_ref(current);
            if ancestors.contains(&id) {
                return;
            }
            ancestors.push(id);
            for (i, child) in children(current).enumerate() {
                location.push(i);
                walk(child, segments, location, ancestors, hits);
                location.pop();
            }
            ancestors.pop();
        }
    }
}

fn children(value: &Value) -> Box<dyn Iterator<Item = &Value> + '_> {
    match value {
        Value::Object(obj) => Box::new(obj.values()),
        Value::Array(items) => Box::new(items.iter()),
        _ => Box::new(std::iter::empty()),
    }
}

impl FromStr for FieldPath {
    type Err = ParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        FieldPath::parse(s)
    }
}

impl fmt::Display for FieldPath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (i, seg) in self.segments.iter().enumerate() {
            if i > 0 {
                f.write_str(".")?;
            }
            write!(f, "{}", seg)?;
        }
        Ok(())
    }
}

/// Resolve a dotted path string against `root`. A malformed path (empty
/// segment) resolves to nothing.
pub fn resolve<'a>(root: &'a Value, path: &str) -> Vec<&'a Value> {
    match FieldPath::parse(path) {
        Ok(p) => p.resolve(root),
        Err(_) => Vec::new(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn literal_path() {
        let doc = json!({"user": {"profile": {"name": "Ann"}}});
        assert_eq!(resolve(&doc, "user.profile.name"), vec![&json!("Ann")]);
        assert!(resolve(&doc, "user.missing").is_empty());
    }

    #[test]
    fn empty_path_is_root() {
        let doc = json!({"a": 1});
        assert_eq!(resolve(&doc, ""), vec![&doc]);
    }

    #[test]
    fn literal_through_heterogeneous_sequence() {
        let doc = json!({"items": [{"id": 1}, 7, {"name": "x"}, {"id": 2}]});
        assert_eq!(resolve(&doc, "items.id"), vec![&json!(1), &json!(2)]);
    }

    #[test]
    fn single_wildcard_over_sequence() {
        let doc = json!({"a": [{"b": 1}, {"b": 2}, {"c": 3}]});
        assert_eq!(resolve(&doc, "a.*.b"), vec![&json!(1), &json!(2)]);
    }

    #[test]
    fn multiple_single_wildcards() {
        let doc = json!({"a": {"x": {"y": {"c": 1}, "z": {"c": 2}}, "w": {"v": {"c": 3}}}});
        assert_eq!(
            resolve(&doc, "a.*.*.c"),
            vec![&json!(1), &json!(2), &json!(3)]
        );
    }

    #[test]
    fn deep_wildcard_in_middle() {
        let doc = json!({"a": {"b": {"c": 1, "d": {"c": 2}}, "e": {"f": {"c": 3}}}, "c": 9});
        assert_eq!(
            resolve(&doc, "a.**.c"),
            vec![&json!(1), &json!(2), &json!(3)]
        );
    }

    #[test]
    fn deep_wildcard_with_trailing_fields() {
        let doc = json!({"a": {"b": {"c": 1}, "x": {"b": {"c": 2}}}, "b": {"c": 3}});
        assert_eq!(
            resolve(&doc, "**.b.c"),
            vec![&json!(1), &json!(2), &json!(3)]
        );
    }

    #[test]
    fn deep_wildcard_through_nested_lists() {
        let doc = json!({"a": [[{"c": 1}], [{"d": {"c": 2}}]]});
        assert_eq!(resolve(&doc, "**.c"), vec![&json!(1), &json!(2)]);
    }

    #[test]
    fn duplicates_collapse_in_first_seen_order() {
        let doc = json!({"a": {"x": 1, "y": 1, "z": 2}});
        assert_eq!(resolve(&doc, "a.*"), vec![&json!(1), &json!(2)]);
        let objs = json!([{"k": {"p": 1, "q": 2}}, {"k": {"q": 2, "p": 1}}]);
        assert_eq!(resolve(&objs, "k").len(), 1);
    }

    #[test]
    fn wildcards_on_scalars_resolve_to_nothing() {
        assert!(resolve(&json!(5), "*").is_empty());
        assert!(resolve(&json!("text"), "**.a").is_empty());
        assert!(resolve(&json!(null), "a").is_empty());
    }

    #[test]
    fn malformed_path_resolves_to_nothing() {
        assert!(FieldPath::parse("a..b").is_err());
        assert!(resolve(&json!({"a": {"b": 1}}), "a..b").is_empty());
    }

    #[test]
    fn display_round_trips() {
        let p: FieldPath = "a.**.b.*".parse().unwrap();
        assert_eq!(p.to_string(), "a.**.b.*");
        assert!(p.has_wildcards());
        assert_eq!(p.segments()[1], Segment::DeepWildcard);
    }
}

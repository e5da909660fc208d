use fuzzy_query::{
    EvalConfig, EvalError, Evaluator, FuzzyError, FuzzySet, Quantifier, Stream, parse_query,
    predicates::PredicateCall,
};
use serde_json::{Value, json};
use std::sync::Arc;

fn eval(query: &str, doc: &Value) -> Result<f64, EvalError> {
    Evaluator::new().evaluate(&parse_query(query).unwrap(), doc)
}

fn eval_with(evaluator: &Evaluator, query: &str, doc: &Value) -> f64 {
    evaluator.evaluate(&parse_query(query).unwrap(), doc).unwrap()
}

fn person() -> Value {
    json!({
        "name": "John Smith",
        "age": 40,
        "email": "john@example.com",
        "tags": ["admin", "ops"],
        "address": {"city": "Springfield", "zip": "12345"},
        "orders": [
            {"id": 1, "total": 25.5},
            {"id": 2, "total": 400.0}
        ]
    })
}

fn people() -> Vec<Value> {
    vec![
        json!({"name": "Alice", "age": 25, "score": 85}),
        json!({"name": "Bob", "age": 30, "score": 92}),
        json!({"name": "Charlie", "age": 35, "score": 78}),
        json!({"name": "David", "age": 28, "score": 88}),
        json!({"name": "Eve", "age": 22, "score": 95}),
    ]
}

// ============================================================================
// Single-document evaluation
// ============================================================================

#[test]
fn test_compound_query() {
    let doc = person();
    let m = eval(
        "(and (>= :age 25) (contains? :name \"Smith\") (== @address.city Springfield))",
        &doc,
    )
    .unwrap();
    assert_eq!(m, 1.0);

    let m = eval("(or (< :age 18) (in? admin :tags))", &doc).unwrap();
    assert_eq!(m, 1.0);
}

#[test]
fn test_near_miss_gets_partial_credit() {
    let doc = json!({"price": 101});
    let m = eval("(<= :price 100)", &doc).unwrap();
    assert!(m > 0.0 && m < 0.5, "got {}", m);
    let hedged = eval("(very (<= :price 100))", &doc).unwrap();
    assert!(hedged < m);
    let diluted = eval("(somewhat (<= :price 100))", &doc).unwrap();
    assert!(diluted > m);
}

#[test]
fn test_bare_strings_search_the_whole_document() {
    let doc = person();
    assert_eq!(eval("springfield", &doc).unwrap(), 1.0);
    assert_eq!(eval("(and john ops)", &doc).unwrap(), 1.0);
    assert_eq!(eval("(not shelbyville)", &doc).unwrap(), 1.0);
}

#[test]
fn test_wildcard_operands_are_existential() {
    let doc = person();
    assert_eq!(eval("(> @orders.*.total 300)", &doc).unwrap(), 1.0);
    assert_eq!(eval("(> @orders.*.total 1000)", &doc).unwrap(), 0.0);
    assert_eq!(eval("(all @orders.*.total (> $ 20))", &doc).unwrap(), 1.0);
    assert_eq!(eval("(none @orders.*.total (> $ 1000))", &doc).unwrap(), 1.0);
    assert_eq!(eval("(== @**.zip \"12345\")", &doc).unwrap(), 1.0);
}

#[test]
fn test_string_predicates() {
    let doc = person();
    assert_eq!(eval("(starts-with? :email john)", &doc).unwrap(), 1.0);
    assert_eq!(eval("(ends-with? :email \".org\")", &doc).unwrap(), 0.0);
    assert_eq!(eval("(regex? :email \"^[a-z]+@example\\\\.com$\")", &doc).unwrap(), 1.0);
    assert_eq!(eval("(contains? :tags ops)", &doc).unwrap(), 1.0);
    assert_eq!(eval("(contains? :name smith)", &doc).unwrap(), 0.0);
}

#[test]
fn test_shape_predicates() {
    let doc = json!({"temp": 21.5});
    assert_eq!(eval("(between? :temp 18 24)", &doc).unwrap(), 1.0);
    assert_eq!(eval("(close-to? :temp 21.5)", &doc).unwrap(), 1.0);
    let m = eval("(approx? :temp 20 1.5)", &doc).unwrap();
    assert!((m - 0.5).abs() < 1e-12);
}

#[test]
fn test_operator_names_are_case_insensitive() {
    let doc = json!({"a": 5});
    assert_eq!(
        eval("(AND (GT? :a 1) (Very 1.0))", &doc).unwrap(),
        eval("(and (gt? :a 1) (very 1.0))", &doc).unwrap()
    );
}

#[test]
fn test_evaluation_errors() {
    let doc = json!({"a": 1});
    assert_eq!(
        eval("(launch :a)", &doc),
        Err(EvalError::UnknownOperator("launch".to_string()))
    );
    assert!(matches!(eval("(not 1 2)", &doc), Err(EvalError::Arity { .. })));
    assert!(matches!(
        eval("(any :a (> $ 0) extra)", &doc),
        Err(EvalError::Arity { .. })
    ));
    assert!(matches!(
        eval("(field :a (> $ 0) sometimes)", &doc),
        Err(EvalError::InvalidQuantifier(_))
    ));
    assert!(matches!(eval("(1 2 3)", &doc), Err(EvalError::InvalidOperand(_))));
}

#[test]
fn test_error_kinds_are_distinguishable() {
    let syntax: FuzzyError = parse_query("(and").unwrap_err().into();
    assert!(syntax.is_syntax());
    assert!(!syntax.is_domain());

    let domain: FuzzyError = FuzzySet::new(vec![2.0]).unwrap_err().into();
    assert!(domain.is_domain());
    assert!(!domain.is_syntax());
}

// ============================================================================
// Configuration and custom predicates
// ============================================================================

#[test]
fn test_tolerance_widens_the_curves() {
    let doc = json!({"x": 81});
    let narrow = Evaluator::new();
    let wide = Evaluator::with_config(EvalConfig::default().with_tolerance(0.1));
    let a = eval_with(&narrow, "(> :x 80)", &doc);
    let b = eval_with(&wide, "(> :x 80)", &doc);
    assert!(a > b && b > 0.5, "narrow {} wide {}", a, b);
}

#[test]
fn test_default_quantifier() {
    let doc = json!({"items": [{"price": 5}, {"price": 50}]});
    let any = Evaluator::new();
    let all = Evaluator::with_config(EvalConfig::default().with_default_quantifier(Quantifier::All));
    assert_eq!(eval_with(&any, "(field items.*.price (> $ 20))", &doc), 1.0);
    assert_eq!(eval_with(&all, "(field items.*.price (> $ 20))", &doc), 0.0);
}

#[test]
fn test_case_insensitive_strings() {
    let doc = json!({"city": "Paris"});
    let folded = Evaluator::with_config(EvalConfig::default().with_case_insensitive_strings(true));
    assert_eq!(eval("(== :city paris)", &doc).unwrap(), 0.0);
    assert_eq!(eval_with(&folded, "(== :city paris)", &doc), 1.0);
    assert_eq!(eval_with(&folded, "(regex? :city \"^PAR\")", &doc), 1.0);
}

#[test]
fn test_custom_predicate() {
    let evaluator = Evaluator::new().with_predicate("long?", |call: &PredicateCall<'_>| {
        call.arity(1, Some(1))?;
        let len = call.text(0).map(|s| s.chars().count()).unwrap_or(0);
        Ok((len as f64 / 10.0).min(1.0))
    });
    let doc = json!({"word": "hello"});
    assert_eq!(eval_with(&evaluator, "(long? :word)", &doc), 0.5);
    assert!(evaluator.predicates().contains("LONG?"));
    assert!(Evaluator::new().evaluate(&parse_query("(long? :word)").unwrap(), &doc).is_err());
}

#[test]
fn test_overriding_a_builtin_predicate() {
    let crisp_gt = |call: &PredicateCall<'_>| -> Result<f64, EvalError> {
        call.arity(2, Some(2))?;
        Ok(match (call.number(0), call.number(1)) {
            (Some(a), Some(b)) if a > b => 1.0,
            _ => 0.0,
        })
    };
    let evaluator = Evaluator::new().with_predicate_object(">", Arc::new(crisp_gt));
    let doc = json!({"x": 80});
    assert_eq!(eval_with(&evaluator, "(> :x 80)", &doc), 0.0);
    assert_eq!(eval("(> :x 80)", &doc).unwrap(), 0.5);
}

// ============================================================================
// Batch evaluation
// ============================================================================

#[test]
fn test_batch_preserves_order() {
    let docs = people();
    let set = Evaluator::new().evaluate_batch(&parse_query("(>= :age 30)").unwrap(), &docs);
    assert_eq!(set.len(), 5);
    assert_eq!(set[1], 0.5);
    assert_eq!(set[2], 1.0);
    assert_eq!(set[4], 0.0);
}

#[test]
fn test_batch_maps_errors_to_zero() {
    let docs = vec![
        json!({"text": "abc123", "pattern": "\\d+"}),
        json!({"text": "abc123", "pattern": "("}),
        json!({"text": "abc", "pattern": "\\d+"}),
    ];
    let query = parse_query("(regex? :text :pattern)").unwrap();
    let set = Evaluator::new().evaluate_batch(&query, &docs);
    assert_eq!(set.into_memberships(), vec![1.0, 0.0, 0.0]);
    assert!(matches!(
        Evaluator::new().evaluate(&query, &docs[1]),
        Err(EvalError::InvalidRegex(_))
    ));
}

#[test]
fn test_batch_results_combine_with_set_algebra() {
    let docs = people();
    let evaluator = Evaluator::new();
    let young = evaluator.evaluate_batch(&parse_query("(< :age 30)").unwrap(), &docs);
    let strong = evaluator.evaluate_batch(&parse_query("(> :score 90)").unwrap(), &docs);
    let both = (&young & &strong).unwrap();
    assert_eq!(both.alpha_cut(0.9).support(), vec![4]);
    assert_eq!(both[1], 0.5);
    let either = (&young | &strong).unwrap();
    assert!(either.cardinality() >= both.cardinality());
}

// ============================================================================
// Streams
// ============================================================================

#[test]
fn test_json_lines_pipeline() {
    let text = people()
        .iter()
        .map(|doc| doc.to_string())
        .collect::<Vec<_>>()
        .join("\n");
    let stream = Stream::from_json_lines(text)
        .filter_query("(> :score 80)")
        .unwrap()
        .very()
        .top_k(2);
    let names: Vec<Value> = stream
        .collect()
        .unwrap()
        .into_iter()
        .map(|(doc, _)| doc["name"].clone())
        .collect();
    assert_eq!(names, vec![json!("Bob"), json!("David")]);
}

#[test]
fn test_stream_with_custom_evaluator() {
    let folded = Evaluator::with_config(EvalConfig::default().with_case_insensitive_strings(true));
    let stream = Stream::from_documents(people())
        .with_evaluator(folded)
        .filter_query("(starts-with? :name al)")
        .unwrap();
    assert_eq!(stream.collect().unwrap().len(), 1);
}

#[test]
fn test_transform_keeps_membership() {
    let stream = Stream::from_documents(people())
        .filter_query("(>= :age 25)")
        .unwrap()
        .transform(parse_query(":name").unwrap());
    let pairs = stream.collect().unwrap();
    assert_eq!(pairs[0], (json!("Alice"), 0.5));
    assert_eq!(pairs.len(), 4);
}

#[test]
fn test_stream_defuzzify_and_best() {
    let stream = Stream::from_json(json!([{"m": 0.1}, {"m": 0.9}, {"m": 0.3}]))
        .filter_query("(field m $)")
        .unwrap();
    assert_eq!(
        stream.defuzzify(fuzzy_query::Defuzzifier::LargestOfMaxima).unwrap(),
        1.0
    );
    let (best, m) = stream.best().unwrap().unwrap();
    assert_eq!(best, json!({"m": 0.9}));
    assert_eq!(m, 0.9);
}

#[test]
fn test_malformed_json_line_surfaces_as_stream_error() {
    let stream = Stream::from_json_lines("{\"a\": 1}\n{oops\n")
        .filter_query(":a")
        .unwrap();
    let err = stream.collect().unwrap_err();
    assert!(err.is_domain());
    assert!(err.to_string().contains("line 2"));
}

#[test]
fn test_weighted_mean_of_transformed_stream() {
    let stream = Stream::from_json(json!([{"p": 10}, {"p": 100}, {"p": 1000}]))
        .filter_query("(> :p 50)")
        .unwrap()
        .transform(parse_query(":p").unwrap());
    assert_eq!(stream.weighted_mean().unwrap(), Some(550.0));
    assert_eq!(stream.closest_to_mean().unwrap(), Some((json!(100), 1.0)));
}

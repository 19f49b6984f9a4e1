//! The iteration pipeline.
//!
//! A single pass of filter/map/foreach/collect stages over a
//! sequence-valued target. Each stage's body is an ordinary chain run with
//! the element as target, so stages share the enclosing request's locals
//! and can themselves contain member calls, lookups, and nested chains.
//!
//! The pipeline is realized eagerly over a working sequence; stages stay
//! independently composable and evaluate in list order either way. Exactly
//! one terminal stage (foreach or collect) must end the list: foreach runs
//! its body per element for side effects and yields null, collect yields
//! the sequence accumulated so far.

use chaincall_core::Value;

use crate::error::{ChainError, ChainResult};
use crate::interp::Interp;
use crate::step::{Chain, IterOp, OpKind};

/// Run an operation list over a sequence-valued target.
pub(crate) fn iterate(
    interp: &mut Interp<'_>,
    target: &Value,
    ops: &[IterOp],
) -> ChainResult<Value> {
    let mut working = match target {
        Value::Null => return Err(ChainError::NullIteration),
        Value::Seq(items) => items.clone(),
        other => return Err(ChainError::NotIterable(other.kind_name())),
    };

    for op in ops {
        match op.kind {
            OpKind::Filter => {
                let body = expect_body(op)?;
                let mut kept = Vec::with_capacity(working.len());
                for element in working {
                    // Only boolean true keeps the element; null or any
                    // other value excludes it.
                    if interp.run(element.clone(), body)? == Value::Bool(true) {
                        kept.push(element);
                    }
                }
                working = kept;
            }
            OpKind::Map => {
                let body = expect_body(op)?;
                let mut mapped = Vec::with_capacity(working.len());
                for element in working {
                    // Null results are kept; map never filters.
                    mapped.push(interp.run(element, body)?);
                }
                working = mapped;
            }
            OpKind::Foreach => {
                let body = expect_body(op)?;
                for element in working {
                    interp.run(element, body)?;
                }
                return Ok(Value::Null);
            }
            OpKind::Collect => return Ok(Value::Seq(working)),
        }
    }
    Err(ChainError::MissingTerminal)
}

fn expect_body(op: &IterOp) -> ChainResult<&Chain> {
    op.body
        .as_ref()
        .ok_or_else(|| ChainError::MalformedStep(format!("{:?} operation carries no body", op.kind)))
}

#[cfg(test)]
mod tests {
    use super::*;
    use chaincall_registry::TypeRegistry;
    use serde_json::json;

    fn run_iter(target: Value, ops_doc: serde_json::Value) -> ChainResult<Value> {
        let registry = TypeRegistry::with_prelude();
        let chain = crate::step::Chain::parse(&json!({"type": "iter", "ref": ops_doc}))?;
        let mut interp = Interp::new(&registry);
        interp.run(target, &chain)
    }

    fn ints(values: impl IntoIterator<Item = i64>) -> Value {
        Value::seq(values.into_iter().map(Value::Int))
    }

    #[test]
    fn identity_collect() {
        let input = ints([1, 2, 3]);
        let out = run_iter(input.clone(), json!([{"type": "collect"}]));
        assert_eq!(out.unwrap(), input);
    }

    #[test]
    fn filter_map_collect_composition() {
        let out = run_iter(
            ints([1, 2, 3, 4]),
            json!([
                {"type": "filter", "method": "gt", "args": [2]},
                {"type": "map", "method": "times", "args": [10]},
                {"type": "collect"},
            ]),
        );
        assert_eq!(out.unwrap(), ints([30, 40]));
    }

    #[test]
    fn filter_excludes_non_true_results() {
        // `get` against maps yields values that are not boolean true
        // (including null for the absent key); none survive the filter.
        let element = Value::Map(Default::default());
        let out = run_iter(
            Value::seq([element]),
            json!([
                {"type": "filter", "method": "get", "args": ["missing"]},
                {"type": "collect"},
            ]),
        );
        assert_eq!(out.unwrap(), Value::Seq(vec![]));
    }

    #[test]
    fn map_keeps_null_results() {
        let element = Value::Map(Default::default());
        let out = run_iter(
            Value::seq([element.clone(), element]),
            json!([
                {"type": "map", "method": "get", "args": ["missing"]},
                {"type": "collect"},
            ]),
        );
        assert_eq!(out.unwrap(), Value::seq([Value::Null, Value::Null]));
    }

    #[test]
    fn foreach_runs_in_order_and_yields_null() {
        // Each body run rebinds the shared local; after the pipeline the
        // binding holds the last element, proving in-order execution.
        let registry = TypeRegistry::with_prelude();
        let chain = crate::step::Chain::parse(&json!({
            "type": "iter",
            "ref": [{"type": "foreach", "method": "to_string", "local": "seen"}]
        }))
        .unwrap();
        let mut interp = Interp::new(&registry);
        let out = interp.run(ints([1, 2, 3]), &chain).unwrap();
        assert_eq!(out, Value::Null);
        assert_eq!(interp.locals().get(Some("seen")), Value::Str("3".into()));
    }

    #[test]
    fn null_source_fails() {
        let err = run_iter(Value::Null, json!([{"type": "collect"}])).unwrap_err();
        assert_eq!(err, ChainError::NullIteration);
    }

    #[test]
    fn non_sequence_source_fails() {
        let err = run_iter(Value::Int(3), json!([{"type": "collect"}])).unwrap_err();
        assert_eq!(err, ChainError::NotIterable("int"));
    }

    #[test]
    fn missing_terminal_fails() {
        let err = run_iter(
            ints([1]),
            json!([{"type": "map", "method": "to_string"}]),
        )
        .unwrap_err();
        assert_eq!(err, ChainError::MissingTerminal);
    }

    #[test]
    fn stage_body_errors_propagate() {
        let err = run_iter(
            ints([1, 2]),
            json!([
                {"type": "map", "method": "frobnicate"},
                {"type": "collect"},
            ]),
        )
        .unwrap_err();
        assert!(matches!(err, ChainError::MemberNotFound { .. }));
    }

    #[test]
    fn iterate_result_binds_like_any_step() {
        let registry = TypeRegistry::with_prelude();
        let chain = crate::step::Chain::parse(&json!({
            "chains": [
                {"type": "iter", "local": "picked", "ref": [
                    {"type": "filter", "method": "gt", "args": [1]},
                    {"type": "collect"},
                ]},
                {"method": "length"},
            ]
        }))
        .unwrap();
        let mut interp = Interp::new(&registry);
        let out = interp.run(ints([1, 2, 3]), &chain).unwrap();
        assert_eq!(out, Value::Int(2));
        assert_eq!(interp.locals().get(Some("picked")), ints([2, 3]));
    }
}

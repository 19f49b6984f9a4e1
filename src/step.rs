//! Request-document parsing.
//!
//! An invocation document is either a single step mapping or a mapping with
//! a `chains` key holding an ordered sequence of step mappings. This module
//! parses `serde_json` documents into the immutable [`Chain`] / [`Step`] /
//! [`IterOp`] structures the interpreter walks. The document shape is
//! dynamic (tag-dispatched, mappings double as nested chains), so parsing
//! is hand-rolled matching rather than derived deserialization.

use serde_json::Value as JsonValue;

use chaincall_core::Value;

use crate::error::{ChainError, ChainResult};

/// What a step does.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StepKind {
    /// Yield the current target unchanged (`"type": "self"`).
    SelfRef,
    /// Read a named local (`"type": "local"`).
    LocalRef,
    /// Resolve a type handle by name (`"type": "class"`).
    TypeRef,
    /// Invoke a member on the current target (no `type` tag).
    Call,
    /// Run an iteration pipeline over the current target (`"type": "iter"`).
    Iterate,
}

/// One argument position of a member call.
#[derive(Debug, Clone, PartialEq)]
pub enum Argument {
    /// A plain value.
    Literal(Value),
    /// A nested invocation chain, evaluated against the caller's target.
    /// Every mapping-shaped argument parses as one of these.
    Nested(Chain),
}

/// One instruction in an invocation chain. Immutable once parsed.
#[derive(Debug, Clone, PartialEq)]
pub struct Step {
    /// What the step does.
    pub kind: StepKind,
    /// Member name, for [`StepKind::Call`].
    pub method: Option<String>,
    /// Ordered arguments, for [`StepKind::Call`].
    pub args: Vec<Argument>,
    /// Name to bind the step's result under, if any.
    pub binding: Option<String>,
    /// Referenced name, for [`StepKind::LocalRef`] / [`StepKind::TypeRef`].
    pub reference: Option<String>,
    /// Pipeline operations, for [`StepKind::Iterate`].
    pub ops: Vec<IterOp>,
}

/// Tag of one iteration operation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OpKind {
    /// Keep elements whose body yields boolean true.
    Filter,
    /// Replace each element with its body's result.
    Map,
    /// Run the body per element for side effects; terminal, yields null.
    Foreach,
    /// Materialize the pipeline; terminal, yields a sequence.
    Collect,
}

/// One stage of an iteration pipeline.
#[derive(Debug, Clone, PartialEq)]
pub struct IterOp {
    /// Stage tag.
    pub kind: OpKind,
    /// Body chain, run with each element as target. Absent for collect.
    pub body: Option<Chain>,
}

/// An ordered sequence of steps sharing one local variable store.
#[derive(Debug, Clone, PartialEq)]
pub struct Chain {
    steps: Vec<Step>,
}

impl Chain {
    /// Parse an invocation document: a single step mapping, or a mapping
    /// with `chains` holding an ordered sequence of step mappings.
    pub fn parse(doc: &JsonValue) -> ChainResult<Chain> {
        let Some(mapping) = doc.as_object() else {
            return Err(ChainError::MalformedStep(format!(
                "invocation document must be a mapping, got {doc}"
            )));
        };
        match mapping.get("chains") {
            Some(JsonValue::Array(items)) => {
                let steps = items
                    .iter()
                    .map(Step::parse)
                    .collect::<ChainResult<Vec<_>>>()?;
                Ok(Chain { steps })
            }
            Some(other) => Err(ChainError::MalformedStep(format!(
                "chains must be an ordered sequence, got {other}"
            ))),
            None => Ok(Chain {
                steps: vec![Step::parse(doc)?],
            }),
        }
    }

    /// The steps in execution order.
    pub fn steps(&self) -> &[Step] {
        &self.steps
    }
}

impl Step {
    /// Parse one step mapping.
    pub fn parse(doc: &JsonValue) -> ChainResult<Step> {
        let Some(mapping) = doc.as_object() else {
            return Err(ChainError::MalformedStep(format!(
                "step must be a mapping, got {doc}"
            )));
        };

        let binding = optional_string(mapping, "local")?;
        match mapping.get("type") {
            None | Some(JsonValue::Null) => Self::parse_call(doc, mapping, binding),
            Some(JsonValue::String(tag)) => match tag.as_str() {
                "self" => Ok(Step::plain(StepKind::SelfRef, binding)),
                "local" => Ok(Step {
                    reference: optional_string(mapping, "ref")?,
                    ..Step::plain(StepKind::LocalRef, binding)
                }),
                "class" => {
                    let reference = optional_string(mapping, "ref")?.ok_or_else(|| {
                        ChainError::MalformedStep("class step is missing ref".into())
                    })?;
                    Ok(Step {
                        reference: Some(reference),
                        ..Step::plain(StepKind::TypeRef, binding)
                    })
                }
                "iter" => {
                    let Some(JsonValue::Array(raw_ops)) = mapping.get("ref") else {
                        return Err(ChainError::MalformedStep(
                            "iter step needs ref holding the operation sequence".into(),
                        ));
                    };
                    let ops = raw_ops
                        .iter()
                        .map(IterOp::parse)
                        .collect::<ChainResult<Vec<_>>>()?;
                    Ok(Step {
                        ops,
                        ..Step::plain(StepKind::Iterate, binding)
                    })
                }
                other => Err(ChainError::UnknownStepKind(other.to_owned())),
            },
            Some(other) => Err(ChainError::UnknownStepKind(other.to_string())),
        }
    }

    /// Parse a member-call step (the tagless form).
    fn parse_call(
        doc: &JsonValue,
        mapping: &serde_json::Map<String, JsonValue>,
        binding: Option<String>,
    ) -> ChainResult<Step> {
        let method = match optional_string(mapping, "method")? {
            Some(name) if !name.is_empty() => name,
            _ => {
                return Err(ChainError::MalformedStep(format!(
                    "member call is missing a method name: {doc}"
                )));
            }
        };
        let args = match mapping.get("args") {
            None | Some(JsonValue::Null) => Vec::new(),
            Some(JsonValue::Array(items)) => items
                .iter()
                .map(Argument::parse)
                .collect::<ChainResult<Vec<_>>>()?,
            Some(other) => {
                return Err(ChainError::MalformedStep(format!(
                    "args must be an ordered sequence, got {other}"
                )));
            }
        };
        Ok(Step {
            method: Some(method),
            args,
            ..Step::plain(StepKind::Call, binding)
        })
    }

    fn plain(kind: StepKind, binding: Option<String>) -> Step {
        Step {
            kind,
            method: None,
            args: Vec::new(),
            binding,
            reference: None,
            ops: Vec::new(),
        }
    }

    /// Short label for this step in error messages: the method name for
    /// member calls, the step tag otherwise.
    pub fn describe(&self) -> &str {
        match self.kind {
            StepKind::Call => self.method.as_deref().unwrap_or("<call>"),
            StepKind::SelfRef => "self",
            StepKind::LocalRef => "local",
            StepKind::TypeRef => "class",
            StepKind::Iterate => "iter",
        }
    }

    /// Render this step's argument list for error messages.
    pub fn render_args(&self) -> String {
        let parts: Vec<String> = self
            .args
            .iter()
            .map(|arg| match arg {
                Argument::Literal(value) => value.to_string(),
                Argument::Nested(_) => "{..}".to_owned(),
            })
            .collect();
        parts.join(", ")
    }
}

impl Argument {
    fn parse(doc: &JsonValue) -> ChainResult<Argument> {
        if doc.is_object() {
            Ok(Argument::Nested(Chain::parse(doc)?))
        } else {
            Ok(Argument::Literal(Value::from_json(doc)))
        }
    }
}

impl IterOp {
    fn parse(doc: &JsonValue) -> ChainResult<IterOp> {
        let Some(mapping) = doc.as_object() else {
            return Err(ChainError::MalformedStep(format!(
                "iteration operation must be a mapping, got {doc}"
            )));
        };
        let kind = match mapping.get("type").and_then(JsonValue::as_str) {
            Some("filter") => OpKind::Filter,
            Some("map") => OpKind::Map,
            Some("foreach") => OpKind::Foreach,
            Some("collect") => return Ok(IterOp { kind: OpKind::Collect, body: None }),
            Some(other) => return Err(ChainError::UnknownIterOp(other.to_owned())),
            None => return Err(ChainError::UnknownIterOp(doc.to_string())),
        };

        // The operation mapping doubles as its body: either an explicit
        // sub-chain under `chains`, or a bare single member call.
        let body = if mapping.contains_key("chains") {
            Chain::parse(doc)?
        } else if mapping.contains_key("method") {
            let binding = optional_string(mapping, "local")?;
            Chain {
                steps: vec![Step::parse_call(doc, mapping, binding)?],
            }
        } else {
            return Err(ChainError::MalformedStep(format!(
                "{doc} carries no operation body"
            )));
        };
        Ok(IterOp {
            kind,
            body: Some(body),
        })
    }
}

fn optional_string(
    mapping: &serde_json::Map<String, JsonValue>,
    key: &str,
) -> ChainResult<Option<String>> {
    match mapping.get(key) {
        None | Some(JsonValue::Null) => Ok(None),
        Some(JsonValue::String(s)) => Ok(Some(s.clone())),
        Some(other) => Err(ChainError::MalformedStep(format!(
            "{key} must be a string, got {other}"
        ))),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn tagless_step_is_member_call() {
        let chain = Chain::parse(&json!({"method": "length", "args": []})).unwrap();
        let step = &chain.steps()[0];
        assert_eq!(step.kind, StepKind::Call);
        assert_eq!(step.method.as_deref(), Some("length"));
        assert!(step.args.is_empty());
    }

    #[test]
    fn missing_method_rejected() {
        assert!(matches!(
            Chain::parse(&json!({"args": [1]})),
            Err(ChainError::MalformedStep(_))
        ));
        assert!(matches!(
            Chain::parse(&json!({"method": ""})),
            Err(ChainError::MalformedStep(_))
        ));
    }

    #[test]
    fn unknown_tag_rejected() {
        assert!(matches!(
            Chain::parse(&json!({"type": "eval"})),
            Err(ChainError::UnknownStepKind(tag)) if tag == "eval"
        ));
    }

    #[test]
    fn chains_sequence() {
        let chain = Chain::parse(&json!({
            "chains": [
                {"type": "class", "ref": "string", "local": "s"},
                {"type": "local", "ref": "s"},
            ]
        }))
        .unwrap();
        assert_eq!(chain.steps().len(), 2);
        assert_eq!(chain.steps()[0].kind, StepKind::TypeRef);
        assert_eq!(chain.steps()[0].binding.as_deref(), Some("s"));
        assert_eq!(chain.steps()[1].reference.as_deref(), Some("s"));
    }

    #[test]
    fn mapping_argument_parses_as_nested_chain() {
        let chain = Chain::parse(&json!({
            "method": "plus",
            "args": [{"method": "length"}]
        }))
        .unwrap();
        match &chain.steps()[0].args[0] {
            Argument::Nested(nested) => {
                assert_eq!(nested.steps()[0].method.as_deref(), Some("length"));
            }
            other => panic!("expected a nested chain, got {other:?}"),
        }
    }

    #[test]
    fn scalar_arguments_stay_literal() {
        let chain = Chain::parse(&json!({"method": "plus", "args": [1, "a", null]})).unwrap();
        let args = &chain.steps()[0].args;
        assert_eq!(args[0], Argument::Literal(Value::Int(1)));
        assert_eq!(args[1], Argument::Literal(Value::Str("a".into())));
        assert_eq!(args[2], Argument::Literal(Value::Null));
    }

    #[test]
    fn iter_ops_parse() {
        let chain = Chain::parse(&json!({
            "type": "iter",
            "ref": [
                {"type": "filter", "method": "gt", "args": [2]},
                {"type": "map", "chains": [{"method": "times", "args": [10]}]},
                {"type": "collect"},
            ]
        }))
        .unwrap();
        let ops = &chain.steps()[0].ops;
        assert_eq!(ops.len(), 3);
        assert_eq!(ops[0].kind, OpKind::Filter);
        assert!(ops[0].body.is_some());
        assert_eq!(ops[2].kind, OpKind::Collect);
        assert!(ops[2].body.is_none());
    }

    #[test]
    fn iter_op_without_body_rejected() {
        let result = Chain::parse(&json!({
            "type": "iter",
            "ref": [{"type": "filter"}]
        }));
        assert!(matches!(result, Err(ChainError::MalformedStep(_))));
    }

    #[test]
    fn bad_iter_tag_rejected() {
        let result = Chain::parse(&json!({
            "type": "iter",
            "ref": [{"type": "reduce", "method": "plus"}]
        }));
        assert!(matches!(result, Err(ChainError::UnknownIterOp(tag)) if tag == "reduce"));
    }
}

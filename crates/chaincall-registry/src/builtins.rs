//! Built-in prelude types.
//!
//! Registers the engine's plain-data types (`string`, `int`, `float`,
//! `bool`, `seq`, `map`), the `type` type backing type handles, and the
//! `null` pseudo-type, each with a practical member library. Hosts layer
//! their own object types on top with [`TypeBuilder`].

use std::collections::BTreeMap;

use chaincall_core::{CallContext, MemberDef, NativeError, ParamType, Value};

use crate::registry::{RegistryError, TypeBuilder, TypeRegistry};

/// Register the full prelude into a registry.
pub fn register_prelude(registry: &mut TypeRegistry) -> Result<(), RegistryError> {
    registry.register(null_type())?;
    registry.register(bool_type())?;
    registry.register(int_type())?;
    registry.register(float_type())?;
    registry.register(string_type())?;
    registry.register(seq_type())?;
    registry.register(map_type())?;
    registry.register(type_type())?;
    Ok(())
}

// ============================================================================
// Receiver helpers
// ============================================================================

fn string_receiver<'a>(ctx: &'a CallContext<'_>) -> Result<&'a str, NativeError> {
    match ctx.receiver()? {
        Value::Str(s) => Ok(s),
        other => Err(NativeError::invalid_receiver(format!(
            "expected a string receiver, got {}",
            other.kind_name()
        ))),
    }
}

fn int_receiver(ctx: &CallContext<'_>) -> Result<i64, NativeError> {
    match ctx.receiver()? {
        Value::Int(v) => Ok(*v),
        other => Err(NativeError::invalid_receiver(format!(
            "expected an int receiver, got {}",
            other.kind_name()
        ))),
    }
}

fn float_receiver(ctx: &CallContext<'_>) -> Result<f64, NativeError> {
    match ctx.receiver()? {
        Value::Float(v) => Ok(*v),
        other => Err(NativeError::invalid_receiver(format!(
            "expected a float receiver, got {}",
            other.kind_name()
        ))),
    }
}

fn bool_receiver(ctx: &CallContext<'_>) -> Result<bool, NativeError> {
    match ctx.receiver()? {
        Value::Bool(v) => Ok(*v),
        other => Err(NativeError::invalid_receiver(format!(
            "expected a bool receiver, got {}",
            other.kind_name()
        ))),
    }
}

fn seq_receiver<'a>(ctx: &'a CallContext<'_>) -> Result<&'a [Value], NativeError> {
    match ctx.receiver()? {
        Value::Seq(items) => Ok(items),
        other => Err(NativeError::invalid_receiver(format!(
            "expected a seq receiver, got {}",
            other.kind_name()
        ))),
    }
}

fn map_receiver<'a>(ctx: &'a CallContext<'_>) -> Result<&'a BTreeMap<String, Value>, NativeError> {
    match ctx.receiver()? {
        Value::Map(entries) => Ok(entries),
        other => Err(NativeError::invalid_receiver(format!(
            "expected a map receiver, got {}",
            other.kind_name()
        ))),
    }
}

/// Render a value as plain text: strings verbatim, everything else in its
/// display form.
fn render_plain(value: &Value) -> String {
    match value {
        Value::Str(s) => s.clone(),
        other => other.to_string(),
    }
}

// ============================================================================
// Type definitions
// ============================================================================

fn null_type() -> TypeBuilder {
    TypeBuilder::new("null")
}

fn bool_type() -> TypeBuilder {
    TypeBuilder::new("bool")
        .with_member(MemberDef::new("not", vec![]), |ctx| {
            let v = bool_receiver(ctx)?;
            ctx.set_return(!v);
            Ok(())
        })
        .with_member(MemberDef::new("and", vec![ParamType::Bool]), |ctx| {
            let out = bool_receiver(ctx)? && ctx.arg::<bool>(0)?;
            ctx.set_return(out);
            Ok(())
        })
        .with_member(MemberDef::new("or", vec![ParamType::Bool]), |ctx| {
            let out = bool_receiver(ctx)? || ctx.arg::<bool>(0)?;
            ctx.set_return(out);
            Ok(())
        })
        .with_member(MemberDef::new("to_string", vec![]), |ctx| {
            let out = bool_receiver(ctx)?.to_string();
            ctx.set_return(out);
            Ok(())
        })
}

fn int_type() -> TypeBuilder {
    TypeBuilder::new("int")
        .with_member(MemberDef::new("plus", vec![ParamType::I64]), |ctx| {
            let out = int_receiver(ctx)?
                .checked_add(ctx.arg(0)?)
                .ok_or_else(|| NativeError::message("integer overflow"))?;
            ctx.set_return(out);
            Ok(())
        })
        .with_member(MemberDef::new("minus", vec![ParamType::I64]), |ctx| {
            let out = int_receiver(ctx)?
                .checked_sub(ctx.arg(0)?)
                .ok_or_else(|| NativeError::message("integer overflow"))?;
            ctx.set_return(out);
            Ok(())
        })
        .with_member(MemberDef::new("times", vec![ParamType::I64]), |ctx| {
            let out = int_receiver(ctx)?
                .checked_mul(ctx.arg(0)?)
                .ok_or_else(|| NativeError::message("integer overflow"))?;
            ctx.set_return(out);
            Ok(())
        })
        .with_member(MemberDef::new("abs", vec![]), |ctx| {
            let out = int_receiver(ctx)?
                .checked_abs()
                .ok_or_else(|| NativeError::message("integer overflow"))?;
            ctx.set_return(out);
            Ok(())
        })
        .with_member(MemberDef::new("gt", vec![ParamType::I64]), |ctx| {
            let out = int_receiver(ctx)? > ctx.arg(0)?;
            ctx.set_return(out);
            Ok(())
        })
        .with_member(MemberDef::new("lt", vec![ParamType::I64]), |ctx| {
            let out = int_receiver(ctx)? < ctx.arg(0)?;
            ctx.set_return(out);
            Ok(())
        })
        .with_member(MemberDef::new("ge", vec![ParamType::I64]), |ctx| {
            let out = int_receiver(ctx)? >= ctx.arg(0)?;
            ctx.set_return(out);
            Ok(())
        })
        .with_member(MemberDef::new("le", vec![ParamType::I64]), |ctx| {
            let out = int_receiver(ctx)? <= ctx.arg(0)?;
            ctx.set_return(out);
            Ok(())
        })
        .with_member(MemberDef::new("eq", vec![ParamType::Any]), |ctx| {
            let v = int_receiver(ctx)?;
            let out = *ctx.arg_value(0)? == Value::Int(v);
            ctx.set_return(out);
            Ok(())
        })
        .with_member(MemberDef::new("to_string", vec![]), |ctx| {
            let out = int_receiver(ctx)?.to_string();
            ctx.set_return(out);
            Ok(())
        })
        .with_member(MemberDef::new("to_float", vec![]), |ctx| {
            let out = int_receiver(ctx)? as f64;
            ctx.set_return(out);
            Ok(())
        })
        .with_member(MemberDef::new_static("parse", vec![ParamType::Str]), |ctx| {
            let s: String = ctx.arg(0)?;
            let out = s.trim().parse::<i64>().map_err(|e| {
                NativeError::message(format!("cannot parse {s:?} as int: {e}"))
            })?;
            ctx.set_return(out);
            Ok(())
        })
}

fn float_type() -> TypeBuilder {
    TypeBuilder::new("float")
        .with_member(MemberDef::new("plus", vec![ParamType::Num]), |ctx| {
            let out = float_receiver(ctx)? + ctx.arg::<f64>(0)?;
            ctx.set_return(out);
            Ok(())
        })
        .with_member(MemberDef::new("times", vec![ParamType::Num]), |ctx| {
            let out = float_receiver(ctx)? * ctx.arg::<f64>(0)?;
            ctx.set_return(out);
            Ok(())
        })
        .with_member(MemberDef::new("abs", vec![]), |ctx| {
            let out = float_receiver(ctx)?.abs();
            ctx.set_return(out);
            Ok(())
        })
        .with_member(MemberDef::new("floor", vec![]), |ctx| {
            let out = float_receiver(ctx)?.floor();
            ctx.set_return(out);
            Ok(())
        })
        .with_member(MemberDef::new("round", vec![]), |ctx| {
            let out = float_receiver(ctx)?.round() as i64;
            ctx.set_return(out);
            Ok(())
        })
        .with_member(MemberDef::new("gt", vec![ParamType::Num]), |ctx| {
            let out = float_receiver(ctx)? > ctx.arg::<f64>(0)?;
            ctx.set_return(out);
            Ok(())
        })
        .with_member(MemberDef::new("lt", vec![ParamType::Num]), |ctx| {
            let out = float_receiver(ctx)? < ctx.arg::<f64>(0)?;
            ctx.set_return(out);
            Ok(())
        })
        .with_member(MemberDef::new("to_string", vec![]), |ctx| {
            let out = float_receiver(ctx)?.to_string();
            ctx.set_return(out);
            Ok(())
        })
        .with_member(MemberDef::new("to_int", vec![]), |ctx| {
            let out = float_receiver(ctx)? as i64;
            ctx.set_return(out);
            Ok(())
        })
        .with_member(MemberDef::new_static("parse", vec![ParamType::Str]), |ctx| {
            let s: String = ctx.arg(0)?;
            let out = s.trim().parse::<f64>().map_err(|e| {
                NativeError::message(format!("cannot parse {s:?} as float: {e}"))
            })?;
            ctx.set_return(out);
            Ok(())
        })
}

fn string_type() -> TypeBuilder {
    TypeBuilder::new("string")
        .with_member(MemberDef::new("length", vec![]), |ctx| {
            let out = string_receiver(ctx)?.chars().count() as i64;
            ctx.set_return(out);
            Ok(())
        })
        .with_member(MemberDef::new("is_empty", vec![]), |ctx| {
            let out = string_receiver(ctx)?.is_empty();
            ctx.set_return(out);
            Ok(())
        })
        .with_member(MemberDef::new("to_upper", vec![]), |ctx| {
            let out = string_receiver(ctx)?.to_uppercase();
            ctx.set_return(out);
            Ok(())
        })
        .with_member(MemberDef::new("to_lower", vec![]), |ctx| {
            let out = string_receiver(ctx)?.to_lowercase();
            ctx.set_return(out);
            Ok(())
        })
        .with_member(MemberDef::new("trim", vec![]), |ctx| {
            let out = string_receiver(ctx)?.trim().to_owned();
            ctx.set_return(out);
            Ok(())
        })
        .with_member(MemberDef::new("contains", vec![ParamType::Str]), |ctx| {
            let needle: String = ctx.arg(0)?;
            let out = string_receiver(ctx)?.contains(&needle);
            ctx.set_return(out);
            Ok(())
        })
        .with_member(MemberDef::new("starts_with", vec![ParamType::Str]), |ctx| {
            let prefix: String = ctx.arg(0)?;
            let out = string_receiver(ctx)?.starts_with(&prefix);
            ctx.set_return(out);
            Ok(())
        })
        .with_member(MemberDef::new("ends_with", vec![ParamType::Str]), |ctx| {
            let suffix: String = ctx.arg(0)?;
            let out = string_receiver(ctx)?.ends_with(&suffix);
            ctx.set_return(out);
            Ok(())
        })
        .with_member(MemberDef::new("split", vec![ParamType::Str]), |ctx| {
            let sep: String = ctx.arg(0)?;
            let out: Vec<Value> = string_receiver(ctx)?
                .split(sep.as_str())
                .map(|part| Value::Str(part.to_owned()))
                .collect();
            ctx.set_return(out);
            Ok(())
        })
        .with_member(
            MemberDef::new("replace", vec![ParamType::Str, ParamType::Str]),
            |ctx| {
                let from: String = ctx.arg(0)?;
                let to: String = ctx.arg(1)?;
                let out = string_receiver(ctx)?.replace(&from, &to);
                ctx.set_return(out);
                Ok(())
            },
        )
        .with_member(MemberDef::new("repeat", vec![ParamType::I64]), |ctx| {
            let count: i64 = ctx.arg(0)?;
            let count = usize::try_from(count)
                .map_err(|_| NativeError::message(format!("negative repeat count {count}")))?;
            let out = string_receiver(ctx)?.repeat(count);
            ctx.set_return(out);
            Ok(())
        })
        .with_member(MemberDef::new("substring", vec![ParamType::I64]), |ctx| {
            let start: i64 = ctx.arg(0)?;
            let out = substring(string_receiver(ctx)?, start, i64::MAX);
            ctx.set_return(out);
            Ok(())
        })
        .with_member(
            MemberDef::new("substring", vec![ParamType::I64, ParamType::I64]),
            |ctx| {
                let start: i64 = ctx.arg(0)?;
                let end: i64 = ctx.arg(1)?;
                let out = substring(string_receiver(ctx)?, start, end);
                ctx.set_return(out);
                Ok(())
            },
        )
        .with_member(
            MemberDef::new("concat", vec![ParamType::Str]).variadic(),
            |ctx| {
                let parts: Vec<Value> = ctx.arg(0)?;
                let mut out = string_receiver(ctx)?.to_owned();
                for part in &parts {
                    out.push_str(&render_plain(part));
                }
                ctx.set_return(out);
                Ok(())
            },
        )
        .with_member(MemberDef::new_static("from", vec![ParamType::Any]), |ctx| {
            let out = render_plain(ctx.arg_value(0)?);
            ctx.set_return(out);
            Ok(())
        })
}

/// Char-indexed substring with clamped bounds.
fn substring(s: &str, start: i64, end: i64) -> String {
    let start = start.max(0) as usize;
    let end = end.max(0) as usize;
    if end <= start {
        return String::new();
    }
    s.chars().skip(start).take(end - start).collect()
}

fn seq_type() -> TypeBuilder {
    TypeBuilder::new("seq")
        .with_member(MemberDef::new("length", vec![]), |ctx| {
            let out = seq_receiver(ctx)?.len() as i64;
            ctx.set_return(out);
            Ok(())
        })
        .with_member(MemberDef::new("is_empty", vec![]), |ctx| {
            let out = seq_receiver(ctx)?.is_empty();
            ctx.set_return(out);
            Ok(())
        })
        .with_member(MemberDef::new("get", vec![ParamType::I64]), |ctx| {
            let index: i64 = ctx.arg(0)?;
            let items = seq_receiver(ctx)?;
            let out = usize::try_from(index)
                .ok()
                .and_then(|i| items.get(i))
                .cloned()
                .ok_or_else(|| {
                    NativeError::message(format!(
                        "index {index} out of bounds for seq of length {}",
                        items.len()
                    ))
                })?;
            ctx.set_return_value(out);
            Ok(())
        })
        .with_member(MemberDef::new("first", vec![]), |ctx| {
            let out = seq_receiver(ctx)?.first().cloned().unwrap_or(Value::Null);
            ctx.set_return_value(out);
            Ok(())
        })
        .with_member(MemberDef::new("last", vec![]), |ctx| {
            let out = seq_receiver(ctx)?.last().cloned().unwrap_or(Value::Null);
            ctx.set_return_value(out);
            Ok(())
        })
        .with_member(MemberDef::new("contains", vec![ParamType::Any]), |ctx| {
            let needle = ctx.arg_value(0)?;
            let out = seq_receiver(ctx)?.contains(needle);
            ctx.set_return(out);
            Ok(())
        })
        .with_member(MemberDef::new("with", vec![ParamType::Any]), |ctx| {
            let extra = ctx.arg_value(0)?.clone();
            let mut out = seq_receiver(ctx)?.to_vec();
            out.push(extra);
            ctx.set_return(out);
            Ok(())
        })
        .with_member(MemberDef::new("reverse", vec![]), |ctx| {
            let mut out = seq_receiver(ctx)?.to_vec();
            out.reverse();
            ctx.set_return(out);
            Ok(())
        })
        .with_member(MemberDef::new("join", vec![ParamType::Str]), |ctx| {
            let sep: String = ctx.arg(0)?;
            let out = seq_receiver(ctx)?
                .iter()
                .map(render_plain)
                .collect::<Vec<_>>()
                .join(&sep);
            ctx.set_return(out);
            Ok(())
        })
        .with_member(
            MemberDef::new_static("of", vec![ParamType::Any]).variadic(),
            |ctx| {
                let items: Vec<Value> = ctx.arg(0)?;
                ctx.set_return(items);
                Ok(())
            },
        )
}

fn map_type() -> TypeBuilder {
    TypeBuilder::new("map")
        .with_member(MemberDef::new("length", vec![]), |ctx| {
            let out = map_receiver(ctx)?.len() as i64;
            ctx.set_return(out);
            Ok(())
        })
        .with_member(MemberDef::new("is_empty", vec![]), |ctx| {
            let out = map_receiver(ctx)?.is_empty();
            ctx.set_return(out);
            Ok(())
        })
        .with_member(MemberDef::new("get", vec![ParamType::Str]), |ctx| {
            let key: String = ctx.arg(0)?;
            let out = map_receiver(ctx)?.get(&key).cloned().unwrap_or(Value::Null);
            ctx.set_return_value(out);
            Ok(())
        })
        .with_member(MemberDef::new("contains_key", vec![ParamType::Str]), |ctx| {
            let key: String = ctx.arg(0)?;
            let out = map_receiver(ctx)?.contains_key(&key);
            ctx.set_return(out);
            Ok(())
        })
        .with_member(MemberDef::new("keys", vec![]), |ctx| {
            let out: Vec<Value> = map_receiver(ctx)?
                .keys()
                .map(|k| Value::Str(k.clone()))
                .collect();
            ctx.set_return(out);
            Ok(())
        })
        .with_member(MemberDef::new("values", vec![]), |ctx| {
            let out: Vec<Value> = map_receiver(ctx)?.values().cloned().collect();
            ctx.set_return(out);
            Ok(())
        })
}

fn type_type() -> TypeBuilder {
    TypeBuilder::new("type").with_member(MemberDef::new("name", vec![]), |ctx| {
        match ctx.receiver()? {
            Value::Type(handle) => {
                let out = handle.name().to_owned();
                ctx.set_return(out);
                Ok(())
            }
            other => Err(NativeError::invalid_receiver(format!(
                "expected a type receiver, got {}",
                other.kind_name()
            ))),
        }
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use chaincall_core::wellknown;

    fn invoke(
        registry: &TypeRegistry,
        receiver: &Value,
        name: &str,
        args: Vec<Value>,
    ) -> Result<Value, NativeError> {
        let ty = registry.type_of(receiver);
        let members = registry.members_named(ty, name);
        let member = members
            .iter()
            .find(|m| m.def.accepts_arity(args.len()))
            .unwrap_or_else(|| panic!("no member {name}/{}", args.len()));
        let mut ctx = CallContext::instance(receiver, &args);
        member.invoke(&mut ctx)?;
        Ok(ctx.into_return())
    }

    #[test]
    fn string_members() {
        let registry = TypeRegistry::with_prelude();
        let hello = Value::Str("hello".into());

        assert_eq!(
            invoke(&registry, &hello, "length", vec![]).unwrap(),
            Value::Int(5)
        );
        assert_eq!(
            invoke(&registry, &hello, "to_upper", vec![]).unwrap(),
            Value::Str("HELLO".into())
        );
        assert_eq!(
            invoke(&registry, &hello, "substring", vec![Value::Int(1), Value::Int(3)]).unwrap(),
            Value::Str("el".into())
        );
    }

    #[test]
    fn int_members() {
        let registry = TypeRegistry::with_prelude();
        let five = Value::Int(5);

        assert_eq!(
            invoke(&registry, &five, "plus", vec![Value::Int(3)]).unwrap(),
            Value::Int(8)
        );
        assert_eq!(
            invoke(&registry, &five, "gt", vec![Value::Int(2)]).unwrap(),
            Value::Bool(true)
        );
        assert!(
            invoke(&registry, &Value::Int(i64::MAX), "plus", vec![Value::Int(1)]).is_err()
        );
    }

    #[test]
    fn seq_members() {
        let registry = TypeRegistry::with_prelude();
        let seq = Value::seq([Value::Int(1), Value::Int(2)]);

        assert_eq!(
            invoke(&registry, &seq, "length", vec![]).unwrap(),
            Value::Int(2)
        );
        assert_eq!(
            invoke(&registry, &seq, "with", vec![Value::Int(3)]).unwrap(),
            Value::seq([Value::Int(1), Value::Int(2), Value::Int(3)])
        );
        assert!(invoke(&registry, &seq, "get", vec![Value::Int(9)]).is_err());
    }

    #[test]
    fn map_get_absent_is_null() {
        let registry = TypeRegistry::with_prelude();
        let map = Value::Map(BTreeMap::from([(String::from("a"), Value::Int(1))]));

        assert_eq!(
            invoke(&registry, &map, "get", vec![Value::Str("a".into())]).unwrap(),
            Value::Int(1)
        );
        assert_eq!(
            invoke(&registry, &map, "get", vec![Value::Str("b".into())]).unwrap(),
            Value::Null
        );
    }

    #[test]
    fn type_handle_name() {
        let registry = TypeRegistry::with_prelude();
        let handle = Value::Type(registry.resolve_type("string").unwrap().handle());
        assert_eq!(
            invoke(&registry, &handle, "name", vec![]).unwrap(),
            Value::Str("string".into())
        );
        assert_eq!(registry.type_of(&handle), wellknown::TYPE);
    }

    #[test]
    fn prelude_registers_all_builtins() {
        let registry = TypeRegistry::with_prelude();
        for name in ["null", "bool", "int", "float", "string", "seq", "map", "type"] {
            assert!(registry.resolve_type(name).is_some(), "missing {name}");
        }
    }
}

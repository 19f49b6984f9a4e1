use std::sync::Arc;
use std::thread;

use serde_json::json;

use chaincall::{
    Engine, DispatchError, MemberDef, NativeError, ParamType, TypeBuilder, TypeHash, TypeRegistry,
    Value,
};

fn counter_hash() -> TypeHash {
    TypeHash::from_name("Counter")
}

/// Registry with the prelude plus a small host type hierarchy.
fn host_registry() -> TypeRegistry {
    let mut registry = TypeRegistry::with_prelude();

    registry
        .register(
            TypeBuilder::new("Counter")
                .with_member(MemberDef::new("value", vec![]), |ctx| {
                    let n = *ctx.this::<i64>()?;
                    ctx.set_return(n);
                    Ok(())
                })
                .with_member(MemberDef::new("bump", vec![]), |ctx| {
                    let n = *ctx.this::<i64>()?;
                    ctx.set_return_value(Value::object(counter_hash(), n + 1));
                    Ok(())
                })
                .with_member(
                    MemberDef::new_static("starting_at", vec![ParamType::I64]),
                    |ctx| {
                        let n: i64 = ctx.arg(0)?;
                        ctx.set_return_value(Value::object(counter_hash(), n));
                        Ok(())
                    },
                ),
        )
        .unwrap();

    registry
        .register(TypeBuilder::new("TallyCounter").with_base("Counter"))
        .unwrap();

    registry
}

#[test]
fn end_to_end_length() {
    let engine = Engine::with_prelude();
    let out = engine
        .dispatch_on(
            Value::Str("hello".into()),
            &json!({"json": {"method": "length", "args": []}}),
        )
        .unwrap();
    assert_eq!(out, Value::Int(5));
}

#[test]
fn unresolvable_member_returns_error_response() {
    let engine = Engine::with_prelude();
    let err = engine
        .dispatch_on(
            Value::Str("hello".into()),
            &json!({"json": {"method": "shout", "args": [1]}}),
        )
        .unwrap_err();
    let message = err.to_string();
    assert!(message.contains("string"));
    assert!(message.contains("shout"));
    assert!(message.contains("does not exist"));
}

#[test]
fn host_objects_chain_through_members() {
    let engine = Engine::new(Arc::new(host_registry()));
    let start = Value::object(counter_hash(), 0i64);
    let out = engine
        .dispatch_on(
            start,
            &json!({"json": {"chains": [
                {"method": "bump"},
                {"method": "bump"},
                {"method": "value"},
            ]}}),
        )
        .unwrap();
    assert_eq!(out, Value::Int(2));
}

#[test]
fn statics_resolve_through_class_step() {
    let engine = Engine::new(Arc::new(host_registry()));
    let out = engine
        .dispatch(&json!({"json": {"chains": [
            {"type": "class", "ref": "Counter"},
            {"method": "starting_at", "args": [41]},
            {"method": "bump"},
            {"method": "value"},
        ]}}))
        .unwrap();
    assert_eq!(out, Value::Int(42));
}

#[test]
fn inherited_members_reachable_on_derived_objects() {
    let registry = host_registry();
    let derived = registry.resolve_type("TallyCounter").unwrap().type_hash();
    let engine = Engine::new(Arc::new(registry));

    let out = engine
        .dispatch_on(
            Value::object(derived, 9i64),
            &json!({"json": {"chains": [{"method": "bump"}, {"method": "value"}]}}),
        )
        .unwrap();
    assert_eq!(out, Value::Int(10));
}

#[test]
fn locals_thread_across_steps_and_nested_arguments() {
    let engine = Engine::with_prelude();
    // Bind the length, keep chaining, then pull the binding back out and
    // feed it to a member call as a nested argument.
    let out = engine
        .dispatch_on(
            Value::Str("hello".into()),
            &json!({"json": {"chains": [
                {"method": "length", "local": "n"},
                {"method": "to_string"},
                {"method": "repeat", "args": [
                    {"type": "local", "ref": "n"},
                ]},
            ]}}),
        )
        .unwrap();
    assert_eq!(out, Value::Str("55555".into()));
}

#[test]
fn iteration_pipeline_end_to_end() {
    let engine = Engine::with_prelude();
    let input = Value::seq([1, 2, 3, 4].map(Value::Int));
    let out = engine
        .dispatch_on(
            input,
            &json!({"json": {"type": "iter", "ref": [
                {"type": "filter", "method": "gt", "args": [2]},
                {"type": "map", "method": "times", "args": [10]},
                {"type": "collect"},
            ]}}),
        )
        .unwrap();
    assert_eq!(out, Value::seq([30, 40].map(Value::Int)));
}

#[test]
fn identity_collect_round_trips() {
    let engine = Engine::with_prelude();
    let input = Value::seq([Value::Int(1), Value::Str("two".into()), Value::Null]);
    let out = engine
        .dispatch_on(
            input.clone(),
            &json!({"json": {"type": "iter", "ref": [{"type": "collect"}]}}),
        )
        .unwrap();
    assert_eq!(out, input);
}

#[test]
fn foreach_terminates_with_null_and_null_rule_applies() {
    let engine = Engine::with_prelude();
    let input = Value::seq([1, 2].map(Value::Int));

    let out = engine
        .dispatch_on(
            input.clone(),
            &json!({"json": {"type": "iter", "ref": [
                {"type": "foreach", "method": "to_string"},
            ]}}),
        )
        .unwrap();
    assert_eq!(out, Value::Null);

    // The null result threads into the next step, so anything but a
    // local/class lookup must fail fast.
    let err = engine
        .dispatch_on(
            input,
            &json!({"json": {"chains": [
                {"type": "iter", "ref": [{"type": "foreach", "method": "to_string"}]},
                {"method": "length"},
            ]}}),
        )
        .unwrap_err();
    assert!(err.to_string().contains("null"));
}

#[test]
fn ambiguous_overloads_resolve_deterministically() {
    let mut registry = TypeRegistry::with_prelude();
    let ty = registry
        .register(
            TypeBuilder::new("Picker")
                .with_member(
                    MemberDef::new("pick", vec![ParamType::I32, ParamType::I64]),
                    |ctx| {
                        ctx.set_return("first");
                        Ok(())
                    },
                )
                .with_member(
                    MemberDef::new("pick", vec![ParamType::I64, ParamType::I32]),
                    |ctx| {
                        ctx.set_return("second");
                        Ok(())
                    },
                ),
        )
        .unwrap();
    let engine = Engine::new(Arc::new(registry));

    // Both overloads score one widening; the tie is reported, never fatal,
    // and always lands on the first declared.
    for _ in 0..8 {
        let out = engine
            .dispatch_on(
                Value::object(ty, ()),
                &json!({"json": {"method": "pick", "args": [1, 2]}}),
            )
            .unwrap();
        assert_eq!(out, Value::Str("first".into()));
    }
}

#[test]
fn overload_tiers_drive_selection_through_dispatch() {
    let mut registry = TypeRegistry::with_prelude();
    let ty = registry
        .register(
            TypeBuilder::new("Scales")
                .with_member(MemberDef::new("weigh", vec![ParamType::Num]), |ctx| {
                    ctx.set_return("numeric");
                    Ok(())
                })
                .with_member(MemberDef::new("weigh", vec![ParamType::Any]), |ctx| {
                    ctx.set_return("any");
                    Ok(())
                })
                .with_member(MemberDef::new("weigh", vec![ParamType::I64]), |ctx| {
                    ctx.set_return("exact");
                    Ok(())
                }),
        )
        .unwrap();
    let engine = Engine::new(Arc::new(registry));
    let target = Value::object(ty, ());

    let pick = |args: serde_json::Value| {
        engine
            .dispatch_on(target.clone(), &json!({"json": {"method": "weigh", "args": args}}))
            .unwrap()
    };
    // Exact beats supertype beats numeric coercion.
    assert_eq!(pick(json!([7])), Value::Str("exact".into()));
    assert_eq!(pick(json!(["s"])), Value::Str("any".into()));
    assert_eq!(pick(json!([1.5])), Value::Str("any".into()));
}

#[test]
fn concurrent_requests_have_isolated_locals() {
    let engine = Engine::with_prelude();

    thread::scope(|scope| {
        let mut handles = Vec::new();
        for i in 0..8i64 {
            let engine = engine.clone();
            handles.push(scope.spawn(move || {
                for _ in 0..100 {
                    let out = engine
                        .dispatch_on(
                            Value::Int(i),
                            &json!({"json": {"chains": [
                                {"method": "plus", "args": [0], "local": "mine"},
                                {"method": "times", "args": [1000]},
                                {"type": "local", "ref": "mine"},
                            ]}}),
                        )
                        .unwrap();
                    // Each request only ever sees its own binding.
                    assert_eq!(out, Value::Int(i));
                }
            }));
        }
        for handle in handles {
            handle.join().unwrap();
        }
    });
}

#[test]
fn deep_nesting_reports_instead_of_overflowing() {
    let engine = Engine::with_prelude();
    let mut doc = json!({"method": "length"});
    for _ in 0..200 {
        doc = json!({"method": "plus", "args": [doc]});
    }
    let err = engine
        .dispatch_on(Value::Str("x".into()), &json!({"json": doc}))
        .unwrap_err();
    assert!(matches!(err, DispatchError::Chain(_)));
    assert!(err.to_string().contains("nest"));
}

#[test]
fn malformed_envelope_fails_before_execution() {
    let engine = Engine::with_prelude();
    let err = engine.dispatch(&json!({"data": 1})).unwrap_err();
    assert!(matches!(err, DispatchError::Invalid(_)));

    let err = engine
        .dispatch(&json!({"json": {"type": "warp"}}))
        .unwrap_err();
    assert!(matches!(err, DispatchError::Chain(_)));
}

#[test]
fn invocation_fault_surfaces_member_context() {
    let mut registry = TypeRegistry::with_prelude();
    let ty = registry
        .register(TypeBuilder::new("Vault").with_member(
            MemberDef::new("open", vec![ParamType::Str]),
            |ctx| {
                let code: String = ctx.arg(0)?;
                if code == "sesame" {
                    ctx.set_return(true);
                    Ok(())
                } else {
                    Err(NativeError::message("wrong code"))
                }
            },
        ))
        .unwrap();
    let engine = Engine::new(Arc::new(registry));
    let target = Value::object(ty, ());

    let ok = engine
        .dispatch_on(
            target.clone(),
            &json!({"json": {"method": "open", "args": ["sesame"]}}),
        )
        .unwrap();
    assert_eq!(ok, Value::Bool(true));

    let err = engine
        .dispatch_on(
            target,
            &json!({"json": {"method": "open", "args": ["mayonnaise"]}}),
        )
        .unwrap_err();
    let message = err.to_string();
    assert!(message.contains("Vault"));
    assert!(message.contains("open"));
    assert!(message.contains("wrong code"));
}

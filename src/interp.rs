//! The chain interpreter.
//!
//! Walks a (possibly singleton) step sequence, threading a current target
//! value through every step: resolve the step's result (self-reference,
//! local lookup, type lookup, member call, or iteration sub-chain), bind
//! it under the step's name if one is given, and carry it forward as the
//! next step's implicit target.
//!
//! One [`Interp`] exists per request. It owns the request's
//! [`LocalScope`], so dropping it - on success or any error path -
//! releases every binding; nothing outlives the request.

use chaincall_core::{CallContext, MemberEntry, Value, wellknown};
use chaincall_registry::TypeRegistry;

use crate::error::{ChainError, ChainResult};
use crate::iter;
use crate::locals::LocalScope;
use crate::resolver::{self, DispatchMode};
use crate::step::{Argument, Chain, Step, StepKind};

/// Bound on nested-argument recursion. Arguments may themselves be chains,
/// so a hostile or cyclic document must become a reported error instead of
/// unbounded stack growth.
pub(crate) const MAX_DEPTH: usize = 64;

/// Per-request interpreter state.
pub(crate) struct Interp<'e> {
    registry: &'e TypeRegistry,
    locals: LocalScope,
    depth: usize,
}

impl<'e> Interp<'e> {
    pub(crate) fn new(registry: &'e TypeRegistry) -> Self {
        Self {
            registry,
            locals: LocalScope::new(),
            depth: 0,
        }
    }

    /// Execute a chain with the given target value. Nested argument chains
    /// and iteration bodies re-enter here and share this request's locals.
    pub(crate) fn run(&mut self, target: Value, chain: &Chain) -> ChainResult<Value> {
        if self.depth == MAX_DEPTH {
            return Err(ChainError::DepthExceeded(MAX_DEPTH));
        }
        self.depth += 1;
        let out = self.run_steps(target, chain);
        self.depth -= 1;
        out
    }

    fn run_steps(&mut self, mut target: Value, chain: &Chain) -> ChainResult<Value> {
        let steps = chain.steps();
        for (index, step) in steps.iter().enumerate() {
            let result = self.eval_step(&target, step)?;

            // Fail fast when null threads into a step that reads its
            // target: member calls and iteration cannot run against null,
            // only local and class lookups may follow.
            if result.is_null() && index + 1 != steps.len() {
                let next = &steps[index + 1];
                if !matches!(next.kind, StepKind::LocalRef | StepKind::TypeRef) {
                    return Err(ChainError::NullReturn {
                        type_name: self.type_name_of(&target).to_owned(),
                        member: step.describe().to_owned(),
                        args: step.render_args(),
                    });
                }
            }

            target = self.locals.bind(step.binding.as_deref(), result);
        }
        Ok(target)
    }

    fn eval_step(&mut self, target: &Value, step: &Step) -> ChainResult<Value> {
        match step.kind {
            StepKind::SelfRef => Ok(target.clone()),
            StepKind::LocalRef => Ok(self.locals.get(step.reference.as_deref())),
            StepKind::TypeRef => {
                let name = step.reference.as_deref().unwrap_or_default();
                self.registry
                    .resolve_type(name)
                    .map(|entry| Value::Type(entry.handle()))
                    .ok_or_else(|| ChainError::UnknownType(name.to_owned()))
            }
            StepKind::Iterate => iter::iterate(self, target, &step.ops),
            StepKind::Call => self.member_call(target, step),
        }
    }

    fn member_call(&mut self, target: &Value, step: &Step) -> ChainResult<Value> {
        let Some(method) = step.method.as_deref() else {
            return Err(ChainError::MalformedStep(
                "member call is missing a method name".into(),
            ));
        };

        // Arguments may themselves be chains; evaluate them left-to-right
        // against the current target before resolving the enclosing call.
        let mut argv = Vec::with_capacity(step.args.len());
        for arg in &step.args {
            match arg {
                Argument::Literal(value) => argv.push(value.clone()),
                Argument::Nested(chain) => argv.push(self.run(target.clone(), chain)?),
            }
        }

        if let Value::Type(handle) = target {
            // Type-handle policy: statics of the referenced type first,
            // then instance dispatch against the handle value itself.
            if let Some(member) =
                resolver::resolve(self.registry, handle.hash(), method, &argv, DispatchMode::Static)
            {
                return self.invoke(handle.name(), method, member, None, argv);
            }
            if let Some(member) =
                resolver::resolve(self.registry, wellknown::TYPE, method, &argv, DispatchMode::Instance)
            {
                return self.invoke(handle.name(), method, member, Some(target), argv);
            }
            return Err(ChainError::MemberNotFound {
                type_name: handle.name().to_owned(),
                member: method.to_owned(),
                args: render_values(&argv),
            });
        }

        let ty = self.registry.type_of(target);
        let Some(member) = resolver::resolve(self.registry, ty, method, &argv, DispatchMode::Instance)
        else {
            return Err(ChainError::MemberNotFound {
                type_name: self.registry.type_name(ty).to_owned(),
                member: method.to_owned(),
                args: render_values(&argv),
            });
        };
        self.invoke(self.registry.type_name(ty), method, member, Some(target), argv)
    }

    /// Coerce arguments to the resolved signature, pack a variadic tail,
    /// and execute the member's thunk.
    fn invoke(
        &self,
        type_name: &str,
        method: &str,
        member: &MemberEntry,
        receiver: Option<&Value>,
        argv: Vec<Value>,
    ) -> ChainResult<Value> {
        let def = &member.def;
        let rendered = render_values(&argv);

        let mut coerced = Vec::with_capacity(argv.len());
        for (index, value) in argv.into_iter().enumerate() {
            let coerced_value = def.param_at(index).coerce(value).map_err(|e| {
                ChainError::Invocation {
                    type_name: type_name.to_owned(),
                    member: method.to_owned(),
                    args: rendered.clone(),
                    detail: e.to_string(),
                }
            })?;
            coerced.push(coerced_value);
        }
        if def.is_variadic() {
            let tail = coerced.split_off(def.fixed_arity());
            coerced.push(Value::Seq(tail));
        }

        let mut ctx = match receiver {
            Some(value) => CallContext::instance(value, &coerced),
            None => CallContext::statics(&coerced),
        };
        member.invoke(&mut ctx).map_err(|e| ChainError::Invocation {
            type_name: type_name.to_owned(),
            member: method.to_owned(),
            args: rendered,
            detail: e.to_string(),
        })?;
        Ok(ctx.into_return())
    }

    fn type_name_of<'a>(&'a self, value: &'a Value) -> &'a str {
        match value {
            Value::Type(handle) => handle.name(),
            other => self.registry.type_name(self.registry.type_of(other)),
        }
    }

    #[cfg(test)]
    pub(crate) fn locals(&self) -> &LocalScope {
        &self.locals
    }
}

/// Render an argument list for error messages.
pub(crate) fn render_values(values: &[Value]) -> String {
    values
        .iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join(", ")
}

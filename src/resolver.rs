//! Overload resolution.
//!
//! Given a member name, an ordered untyped argument list, and a target
//! type, pick exactly one best-matching member from the registry - a
//! best-effort approximation of static overload resolution run against
//! dynamic arguments.
//!
//! Candidates are enumerated over the type's own members and its base
//! chain, filtered by arity, then scored per argument position. Lower is
//! better; zero is an exact match. The three nonzero tiers are weighted so
//! far apart that accumulation can never promote a candidate across a
//! tier boundary: a candidate needing one supertype match loses to any
//! candidate needing only primitive widenings, and a candidate needing one
//! cross-kind numeric coercion loses to any candidate needing only
//! supertype matches.

use chaincall_core::{MemberDef, MemberEntry, ParamType, TypeHash, Value};
use chaincall_registry::TypeRegistry;

/// Penalty for a same-kind primitive widening (i32/i64 or f32/f64).
pub(crate) const EASY_NUMERIC: u64 = 1;
/// Penalty for satisfying a declared supertype.
pub(crate) const SUBCLASS: u64 = 1 << 16;
/// Penalty for a cross-kind numeric coercion.
pub(crate) const NUMERIC: u64 = 1 << 32;

/// Which members of the target type are eligible.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum DispatchMode {
    /// Instance dispatch: every member is eligible.
    Instance,
    /// Type-handle dispatch: only static members are eligible.
    Static,
}

/// Select the best member named `name` on `ty` for the given arguments.
///
/// Returns `None` when nothing matches; the caller turns that into a chain
/// error with full context. An ambiguous minimum is reported as a warning
/// and resolved deterministically to the first candidate in enumeration
/// order (own members before inherited, declaration order within a type).
pub(crate) fn resolve<'r>(
    registry: &'r TypeRegistry,
    ty: TypeHash,
    name: &str,
    args: &[Value],
    mode: DispatchMode,
) -> Option<&'r MemberEntry> {
    let mut candidates: Vec<(&MemberEntry, u64)> = Vec::new();
    let mut seen: Vec<&MemberDef> = Vec::new();

    for member in registry.members_named(ty, name) {
        if mode == DispatchMode::Static && !member.def.is_static() {
            continue;
        }
        if !member.def.accepts_arity(args.len()) {
            continue;
        }
        // An override re-declared along the base chain with an identical
        // signature is the same member; keep the most-derived occurrence.
        if seen.iter().any(|def| **def == member.def) {
            continue;
        }
        seen.push(&member.def);
        if let Some(score) = score_candidate(registry, &member.def, args) {
            candidates.push((member, score));
        }
    }

    let best = candidates.iter().map(|(_, score)| *score).min()?;
    let mut winners = candidates
        .iter()
        .filter(|(_, score)| *score == best)
        .map(|(member, _)| *member);
    let winner = winners.next()?;
    let runners_up: Vec<String> = winners.map(|m| m.def.to_string()).collect();
    if !runners_up.is_empty() {
        tracing::warn!(
            type_name = registry.type_name(ty),
            member = name,
            chosen = %winner.def,
            also_matching = %runners_up.join(", "),
            "ambiguous member resolution, keeping the first declared"
        );
    }
    Some(winner)
}

/// Accumulated score of one candidate, or `None` if any argument
/// eliminates it.
fn score_candidate(registry: &TypeRegistry, def: &MemberDef, args: &[Value]) -> Option<u64> {
    let mut score = 0u64;
    for (index, arg) in args.iter().enumerate() {
        score += score_argument(registry, def.param_at(index), arg)?;
    }
    Some(score)
}

/// Score one argument against a declared parameter tag.
fn score_argument(registry: &TypeRegistry, declared: ParamType, arg: &Value) -> Option<u64> {
    let Some(natural) = ParamType::natural_of(arg) else {
        // Null satisfies every parameter and never contributes to the score.
        return Some(0);
    };
    score_tags(registry, declared, natural)
}

fn score_tags(registry: &TypeRegistry, declared: ParamType, natural: ParamType) -> Option<u64> {
    if declared == natural {
        return Some(0);
    }
    if matches!(
        (declared, natural),
        (ParamType::I32, ParamType::I64) | (ParamType::F32, ParamType::F64)
    ) {
        return Some(EASY_NUMERIC);
    }
    if declared.is_primitive() && natural.is_primitive() {
        // Cross-kind primitives have no conversion path.
        return None;
    }
    if declared == ParamType::Any {
        return Some(SUBCLASS);
    }
    if let (ParamType::Object(base), ParamType::Object(actual)) = (declared, natural) {
        return registry.is_subtype(actual, base).then_some(SUBCLASS);
    }
    if declared.is_numeric() && natural.is_numeric() {
        return Some(NUMERIC);
    }
    None
}

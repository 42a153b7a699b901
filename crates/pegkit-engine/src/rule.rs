//! Named, recursively referenceable grammar rules.

use crate::context::{LrPhase, ParseContext};
use crate::defs::ParseDefs;
use crate::outcome::Outcome;
use crate::parser::{Parser, ParserKind};
use pegkit_span::Pos;
use std::cell::RefCell;
use std::fmt;
use std::rc::Rc;
use std::sync::atomic::{AtomicU64, Ordering as AtomicOrdering};

static NEXT_RULE_ID: AtomicU64 = AtomicU64::new(1);

/// Stable identity of a rule, assigned at construction.
///
/// Parse contexts key their recursion records on this id, and the
/// left-recursion signal carries it so the owning rule invocation can
/// recognize its own recursion.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct RuleId(u64);

impl RuleId {
    pub(crate) fn fresh() -> Self {
        RuleId(NEXT_RULE_ID.fetch_add(1, AtomicOrdering::Relaxed))
    }
}

impl fmt::Display for RuleId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "rule#{}", self.0)
    }
}

/// Shared storage behind a rule: identity plus the owned body.
pub struct RuleSlot<D: ParseDefs> {
    id: RuleId,
    name: RefCell<Option<String>>,
    body: RefCell<Option<Parser<D>>>,
}

impl<D: ParseDefs> RuleSlot<D> {
    pub(crate) fn id(&self) -> RuleId {
        self.id
    }
}

/// A named, recursively referenceable parser.
///
/// A rule is the one grammar construct that may refer to itself. It is
/// created empty, referenced freely through [`parser`](Rule::parser) (also
/// from its own body), and given its body once with
/// [`define`](Rule::define):
///
/// ```ignore
/// let expr = Rule::new();
/// expr.define(
///     (expr.parser() >> terminal('+') >> term.parser()).matched(Add)
///         | term.parser(),
/// );
/// ```
///
/// Cloning a rule clones a handle to the same rule. The rule owns its body;
/// parser trees hold non-owning references, so the `Rule` value (or a clone)
/// must outlive every parse that reaches it; grammars normally keep their
/// rules together in one struct.
///
/// # Direct left recursion
///
/// A rule whose body refers to itself before consuming input is resolved in
/// two phases rather than recursing forever:
///
/// 1. **Seed.** The body is re-run with same-position re-entries rejecting,
///    so a non-recursive alternative establishes a first match.
/// 2. **Grow.** The body is re-run repeatedly with same-position re-entries
///    accepting at zero width, standing in for everything accumulated so
///    far; each iteration that consumes more input wraps the previous
///    result as the first child of its capture. The loop stops on the
///    first iteration that fails or stands still.
///
/// A grammar like `add = add '+' mul | mul` therefore yields the expected
/// left-leaning match tree in a single pass. Recursion across *several*
/// rules is not resolved: the signal escapes to the top of the parse and
/// aborts it.
pub struct Rule<D: ParseDefs> {
    slot: Rc<RuleSlot<D>>,
}

impl<D: ParseDefs> Rule<D> {
    /// Creates an empty rule.
    pub fn new() -> Self {
        Self {
            slot: Rc::new(RuleSlot {
                id: RuleId::fresh(),
                name: RefCell::new(None),
                body: RefCell::new(None),
            }),
        }
    }

    /// Creates an empty rule with a diagnostic name.
    pub fn named(name: impl Into<String>) -> Self {
        let rule = Self::new();
        *rule.slot.name.borrow_mut() = Some(name.into());
        rule
    }

    /// This rule's stable identity.
    #[inline]
    pub fn id(&self) -> RuleId {
        self.slot.id
    }

    /// The diagnostic name, if one was given.
    pub fn name(&self) -> Option<String> {
        self.slot.name.borrow().clone()
    }

    /// Sets (or replaces) the rule body.
    pub fn define(&self, body: Parser<D>) {
        *self.slot.body.borrow_mut() = Some(body);
    }

    /// True once the rule has a body.
    pub fn is_defined(&self) -> bool {
        self.slot.body.borrow().is_some()
    }

    /// A parser value referencing this rule.
    ///
    /// The reference is non-owning; call sites share the one body the rule
    /// owns.
    pub fn parser(&self) -> Parser<D> {
        Parser::from_kind(ParserKind::RuleRef(Rc::downgrade(&self.slot)))
    }

    /// Parses this rule against a context.
    pub fn parse(&self, ctx: &mut ParseContext<'_, D>) -> Outcome {
        enter(&self.slot, ctx)
    }
}

impl<D: ParseDefs> Default for Rule<D> {
    fn default() -> Self {
        Self::new()
    }
}

impl<D: ParseDefs> Clone for Rule<D> {
    fn clone(&self) -> Self {
        Self { slot: Rc::clone(&self.slot) }
    }
}

impl<D: ParseDefs> From<&Rule<D>> for Parser<D> {
    fn from(rule: &Rule<D>) -> Self {
        rule.parser()
    }
}

impl<D: ParseDefs> fmt::Debug for Rule<D> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Rule")
            .field("id", &self.slot.id)
            .field("name", &*self.slot.name.borrow())
            .field("defined", &self.is_defined())
            .finish()
    }
}

/// Entry point for a rule invocation, shared by `Rule::parse` and rule
/// references inside parser trees.
pub(crate) fn enter<D: ParseDefs>(
    slot: &Rc<RuleSlot<D>>,
    ctx: &mut ParseContext<'_, D>,
) -> Outcome {
    let pos0 = ctx.pos();

    // Re-entry at the position already being parsed: answer per phase
    // instead of descending again.
    if let Some(phase) = ctx.active_rule_phase(slot.id, pos0.index) {
        return match phase {
            LrPhase::Normal => Outcome::LeftRecursion(slot.id),
            LrPhase::Reject => Outcome::Rejected,
            LrPhase::Accept => Outcome::Accepted,
        };
    }

    let body = slot.body.borrow();
    let Some(body) = body.as_ref() else {
        debug_assert!(false, "parsing undefined {}", slot.id);
        return Outcome::Rejected;
    };

    ctx.push_rule_frame(slot.id, pos0.index, LrPhase::Normal);
    let outcome = body.run(ctx);
    ctx.pop_rule_frame(slot.id);

    let outcome = match outcome {
        Outcome::LeftRecursion(id) if id == slot.id && !ctx.recursion_unresolvable() => {
            resolve(slot, body, ctx, pos0)
        }
        other => other,
    };

    // A signal leaving a whole rule invocation unclaimed has crossed a rule
    // boundary: the recursion runs through more than one rule and the
    // protocol cannot resolve it. Poison it so no outer invocation claims
    // it; the top of the parse reports the fatal failure.
    if let Outcome::LeftRecursion(id) = outcome {
        tracing::debug!(target: "pegkit::rule", signal = %id, at = %slot.id, "left recursion crossed a rule boundary");
        ctx.mark_recursion_unresolvable();
    }

    outcome
}

/// Continuation-mode entry, used on the leftmost spine of a grow
/// iteration.
///
/// Only the rule under resolution may stand in for the accumulated input
/// (its grow-phase frame is registered at the current position). Any other
/// rule reference in that position rejects: letting it parse fresh input
/// would accept a second, unrelated derivation after the seed.
pub(crate) fn enter_continuation<D: ParseDefs>(
    slot: &Rc<RuleSlot<D>>,
    ctx: &mut ParseContext<'_, D>,
) -> Outcome {
    match ctx.active_rule_phase(slot.id, ctx.pos().index) {
        Some(LrPhase::Accept) => Outcome::Accepted,
        Some(LrPhase::Reject) => Outcome::Rejected,
        Some(LrPhase::Normal) => Outcome::LeftRecursion(slot.id),
        None => Outcome::Rejected,
    }
}

/// Seed/grow resolution for a directly left-recursive rule.
fn resolve<D: ParseDefs>(
    slot: &Rc<RuleSlot<D>>,
    body: &Parser<D>,
    ctx: &mut ParseContext<'_, D>,
    pos0: Pos,
) -> Outcome {
    let id = slot.id;
    tracing::trace!(target: "pegkit::rule", rule = %id, position = pos0.index, "resolving left recursion");
    ctx.begin_lr_resolution();

    // Seed phase: the recursive alternatives reject, a base alternative
    // must establish a first match past `pos0`.
    let start = ctx.state();
    ctx.push_rule_frame(id, pos0.index, LrPhase::Reject);
    let seed = body.run(ctx);
    ctx.pop_rule_frame(id);
    match seed {
        Outcome::Accepted => {}
        Outcome::Rejected => {
            ctx.set_state(start);
            ctx.end_lr_resolution();
            return Outcome::Rejected;
        }
        other => {
            ctx.end_lr_resolution();
            return other;
        }
    }

    // Grow phase: re-entries at the iteration's start position accept at
    // zero width; each accepted iteration wraps everything parsed so far.
    loop {
        let before = ctx.state();
        ctx.push_rule_frame(id, before.pos().index, LrPhase::Accept);
        let outcome = body.run_continuation(ctx, &start);
        ctx.pop_rule_frame(id);
        match outcome {
            Outcome::Accepted => {
                if ctx.pos().index == before.pos().index {
                    // Zero progress: keep nothing from this iteration.
                    ctx.set_state(before);
                    break;
                }
            }
            Outcome::Rejected => {
                ctx.set_state(before);
                break;
            }
            other => {
                ctx.end_lr_resolution();
                return other;
            }
        }
    }

    ctx.end_lr_resolution();
    tracing::trace!(target: "pegkit::rule", rule = %id, end = ctx.pos().index, "left recursion resolved");
    Outcome::Accepted
}

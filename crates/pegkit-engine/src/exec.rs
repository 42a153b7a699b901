//! Outcome dispatch: how each parser variant drives the context.

use crate::context::{MemoEntry, ParseContext, State};
use crate::defs::ParseDefs;
use crate::outcome::Outcome;
use crate::parser::{Parser, ParserKind};
use crate::rule;
use std::cmp::Ordering;

impl<D: ParseDefs> Parser<D> {
    /// Parses against a context, returning the outcome.
    ///
    /// On [`Outcome::Rejected`] the context state is exactly as it was
    /// before the call; every combinator restores on all failure paths.
    pub fn parse(&self, ctx: &mut ParseContext<'_, D>) -> Outcome {
        self.run(ctx)
    }

    pub(crate) fn run(&self, ctx: &mut ParseContext<'_, D>) -> Outcome {
        match &self.kind {
            ParserKind::Terminal(expected) => {
                if ctx.symbol().is_some_and(|sym| D::compare(sym, expected) == Ordering::Equal) {
                    ctx.advance();
                    Outcome::Accepted
                } else {
                    Outcome::Rejected
                }
            }

            ParserKind::TerminalSeq(expected) => {
                let source = ctx.source();
                let rest = &source[ctx.pos().index.min(source.len())..];
                let matches = rest.len() >= expected.len()
                    && expected
                        .iter()
                        .zip(rest)
                        .all(|(want, have)| D::compare(have, want) == Ordering::Equal);
                if matches {
                    ctx.advance_by(expected.len());
                    Outcome::Accepted
                } else {
                    Outcome::Rejected
                }
            }

            ParserKind::OneOf(set) => {
                let found = ctx
                    .symbol()
                    .is_some_and(|sym| set.binary_search_by(|probe| D::compare(probe, sym)).is_ok());
                if found {
                    ctx.advance();
                    Outcome::Accepted
                } else {
                    Outcome::Rejected
                }
            }

            ParserKind::Range { min, max } => {
                let in_range = ctx.symbol().is_some_and(|sym| {
                    D::compare(sym, min) != Ordering::Less && D::compare(sym, max) != Ordering::Greater
                });
                if in_range {
                    ctx.advance();
                    Outcome::Accepted
                } else {
                    Outcome::Rejected
                }
            }

            ParserKind::End => Outcome::from(ctx.is_end()),

            ParserKind::Any => {
                if ctx.is_valid() {
                    ctx.advance();
                    Outcome::Accepted
                } else {
                    Outcome::Rejected
                }
            }

            ParserKind::Always(value) => Outcome::from(*value),

            ParserKind::Function(f) => {
                if !ctx.is_valid() {
                    return Outcome::Rejected;
                }
                let snapshot = ctx.state();
                if f(ctx) {
                    Outcome::Accepted
                } else {
                    ctx.set_state(snapshot);
                    Outcome::Rejected
                }
            }

            ParserKind::Sequence(children) => {
                let initial = ctx.state();
                for child in children {
                    let outcome = child.run(ctx);
                    match outcome {
                        Outcome::Accepted => {}
                        Outcome::Break(_) => return outcome,
                        Outcome::Rejected | Outcome::LeftRecursion(_) => {
                            ctx.set_state(initial);
                            return outcome;
                        }
                    }
                }
                Outcome::Accepted
            }

            ParserKind::Choice(children) => {
                let initial = ctx.state();
                for child in children {
                    let outcome = child.run(ctx);
                    match outcome {
                        Outcome::Rejected => ctx.set_state(initial),
                        other => return other,
                    }
                }
                ctx.set_state(initial);
                Outcome::Rejected
            }

            ParserKind::ZeroOrMore(child) => run_loop(ctx, |ctx| child.run(ctx), false),

            ParserKind::OneOrMore(child) => run_loop(ctx, |ctx| child.run(ctx), true),

            ParserKind::Optional(child) => match child.run(ctx) {
                Outcome::Accepted | Outcome::Rejected => Outcome::Accepted,
                other => other,
            },

            ParserKind::AndPredicate(child) => {
                let snapshot = ctx.state();
                let outcome = child.run(ctx);
                ctx.set_state(snapshot);
                outcome
            }

            ParserKind::NotPredicate(child) => {
                let snapshot = ctx.state();
                let outcome = child.run(ctx);
                ctx.set_state(snapshot);
                match outcome {
                    Outcome::Accepted => Outcome::Rejected,
                    Outcome::Rejected => Outcome::Accepted,
                    other => other,
                }
            }

            ParserKind::Capture { inner, id } => {
                let start = ctx.state();
                let outcome = inner.run(ctx);
                if outcome.is_accepted() {
                    ctx.add_match(*id, start.pos(), ctx.pos(), start.match_count());
                }
                outcome
            }

            ParserKind::RuleRef(slot) => match slot.upgrade() {
                Some(slot) => rule::enter(&slot, ctx),
                None => {
                    debug_assert!(false, "rule dropped while still referenced");
                    Outcome::Rejected
                }
            },

            ParserKind::Memoize { inner, key } => run_memoized(ctx, inner, *key),

            ParserKind::ErrorRecover { id, skip } => {
                if !ctx.is_valid() {
                    return Outcome::Rejected;
                }
                let begin = ctx.pos();
                skip.run(ctx);
                ctx.add_error(*id, begin, ctx.pos());
                Outcome::Accepted
            }

            ParserKind::ErrorMatch { id, skip } => {
                if !ctx.is_valid() {
                    return Outcome::Rejected;
                }
                let begin = ctx.pos();
                skip.run(ctx);
                let first_child = ctx.matches().len();
                ctx.add_match(*id, begin, ctx.pos(), first_child);
                Outcome::Accepted
            }

            ParserKind::LoopBreak(levels) => Outcome::Break(*levels),

            ParserKind::Newline(inner) => {
                let outcome = inner.run(ctx);
                if outcome.is_accepted() {
                    ctx.advance_line();
                }
                outcome
            }

            ParserKind::Labeled { inner, label } => {
                let depth = ctx.enter_trace();
                tracing::trace!(
                    target: "pegkit::trace",
                    "{:indent$}> {} @{}",
                    "",
                    label,
                    ctx.pos().index,
                    indent = depth * 2
                );
                let outcome = inner.run(ctx);
                tracing::trace!(
                    target: "pegkit::trace",
                    "{:indent$}< {} {:?} @{}",
                    "",
                    label,
                    outcome,
                    ctx.pos().index,
                    indent = depth * 2
                );
                ctx.exit_trace();
                outcome
            }

            ParserKind::Debugged(inner) => {
                let depth = ctx.enter_trace();
                tracing::trace!(
                    target: "pegkit::trace",
                    "{:indent$}> debug @{}",
                    "",
                    ctx.pos().index,
                    indent = depth * 2
                );
                let outcome = inner.run(ctx);
                tracing::trace!(
                    target: "pegkit::trace",
                    "{:indent$}< debug {:?} @{}",
                    "",
                    outcome,
                    ctx.pos().index,
                    indent = depth * 2
                );
                ctx.exit_trace();
                outcome
            }
        }
    }

    /// Left-recursion grow-phase dispatch.
    ///
    /// Runs like [`run`](Self::run) except along the leftmost spine: the
    /// first element of a sequence, every branch of a choice, and the first
    /// iteration of a loop stay in continuation mode, and a capture on that
    /// spine records its match from `seed` (the state at the start of the
    /// resolution) so it adopts the already-parsed seed as its first
    /// child. Terminals and the error combinators cannot stand in for the
    /// seed and reject.
    pub(crate) fn run_continuation(
        &self,
        ctx: &mut ParseContext<'_, D>,
        seed: &State,
    ) -> Outcome {
        match &self.kind {
            ParserKind::Terminal(_)
            | ParserKind::TerminalSeq(_)
            | ParserKind::OneOf(_)
            | ParserKind::Range { .. }
            | ParserKind::Any
            | ParserKind::Function(_)
            | ParserKind::ErrorRecover { .. }
            | ParserKind::ErrorMatch { .. } => Outcome::Rejected,

            ParserKind::End => Outcome::from(ctx.is_end()),

            ParserKind::Always(value) => Outcome::from(*value),

            ParserKind::Sequence(children) => {
                let initial = ctx.state();
                let mut children = children.iter();
                let Some(first) = children.next() else {
                    return Outcome::Accepted;
                };
                let fresh = ctx.state();
                match first.run_continuation(ctx, &fresh) {
                    Outcome::Accepted => {}
                    Outcome::Break(levels) => return Outcome::Break(levels),
                    other => {
                        ctx.set_state(initial);
                        return other;
                    }
                }
                for child in children {
                    let outcome = child.run(ctx);
                    match outcome {
                        Outcome::Accepted => {}
                        Outcome::Break(_) => return outcome,
                        Outcome::Rejected | Outcome::LeftRecursion(_) => {
                            ctx.set_state(initial);
                            return outcome;
                        }
                    }
                }
                Outcome::Accepted
            }

            ParserKind::Choice(children) => {
                let initial = ctx.state();
                for child in children {
                    let outcome = child.run_continuation(ctx, seed);
                    match outcome {
                        Outcome::Rejected => ctx.set_state(initial),
                        other => return other,
                    }
                }
                ctx.set_state(initial);
                Outcome::Rejected
            }

            ParserKind::ZeroOrMore(child) => {
                match child.run_continuation(ctx, seed) {
                    Outcome::Accepted => {}
                    Outcome::Rejected => return Outcome::Accepted,
                    Outcome::Break(levels) => return absorb_break(levels),
                    other => return other,
                }
                run_loop(ctx, |ctx| child.run(ctx), false)
            }

            ParserKind::OneOrMore(child) => {
                match child.run_continuation(ctx, seed) {
                    Outcome::Accepted => {}
                    Outcome::Break(levels) => return absorb_break(levels),
                    other => return other,
                }
                run_loop(ctx, |ctx| child.run(ctx), false)
            }

            ParserKind::Optional(child) => match child.run_continuation(ctx, seed) {
                Outcome::Accepted | Outcome::Rejected => Outcome::Accepted,
                other => other,
            },

            ParserKind::AndPredicate(child) => {
                let snapshot = ctx.state();
                let outcome = child.run_continuation(ctx, seed);
                ctx.set_state(snapshot);
                outcome
            }

            ParserKind::NotPredicate(child) => {
                let snapshot = ctx.state();
                let outcome = child.run_continuation(ctx, seed);
                ctx.set_state(snapshot);
                match outcome {
                    Outcome::Accepted => Outcome::Rejected,
                    Outcome::Rejected => Outcome::Accepted,
                    other => other,
                }
            }

            ParserKind::Capture { inner, id } => {
                let fresh = ctx.state();
                let outcome = inner.run_continuation(ctx, &fresh);
                if outcome.is_accepted() {
                    ctx.add_match(*id, seed.pos(), ctx.pos(), seed.match_count());
                }
                outcome
            }

            ParserKind::RuleRef(slot) => match slot.upgrade() {
                Some(slot) => rule::enter_continuation(&slot, ctx),
                None => {
                    debug_assert!(false, "rule dropped while still referenced");
                    Outcome::Rejected
                }
            },

            // The memo table records ordinary-mode results only; inside a
            // resolution the child runs directly.
            ParserKind::Memoize { inner, .. } => inner.run_continuation(ctx, seed),

            ParserKind::LoopBreak(levels) => Outcome::Break(*levels),

            ParserKind::Newline(inner) => {
                let outcome = inner.run_continuation(ctx, seed);
                if outcome.is_accepted() {
                    ctx.advance_line();
                }
                outcome
            }

            ParserKind::Labeled { inner, .. } | ParserKind::Debugged(inner) => {
                inner.run_continuation(ctx, seed)
            }
        }
    }
}

/// Shared loop driver for `zero_or_more` / `one_or_more`.
///
/// An iteration that accepts without consuming ends the loop (its effects
/// are kept); a `Break(1)` from the body ends the loop; deeper breaks
/// propagate with one level consumed.
fn run_loop<D: ParseDefs>(
    ctx: &mut ParseContext<'_, D>,
    mut step: impl FnMut(&mut ParseContext<'_, D>) -> Outcome,
    first_required: bool,
) -> Outcome {
    if first_required {
        match step(ctx) {
            Outcome::Accepted => {}
            Outcome::Rejected => return Outcome::Rejected,
            Outcome::Break(levels) => return absorb_break(levels),
            other => return other,
        }
    }
    loop {
        let before = ctx.pos();
        match step(ctx) {
            Outcome::Accepted => {
                if ctx.pos().index == before.index {
                    return Outcome::Accepted;
                }
            }
            Outcome::Rejected => return Outcome::Accepted,
            Outcome::Break(levels) => return absorb_break(levels),
            other => return other,
        }
    }
}

/// A loop consuming one break level: level one is caught here, deeper
/// levels continue outward.
fn absorb_break(levels: u32) -> Outcome {
    if levels <= 1 { Outcome::Accepted } else { Outcome::Break(levels - 1) }
}

/// Memoization: replay a recorded result or run and record one.
fn run_memoized<D: ParseDefs>(
    ctx: &mut ParseContext<'_, D>,
    inner: &Parser<D>,
    key: u64,
) -> Outcome {
    // Results produced under an active seed/grow resolution depend on the
    // phase and must not be recorded or replayed.
    if ctx.lr_resolution_active() {
        return inner.run(ctx);
    }

    let index = ctx.pos().index;
    if let Some(entry) = ctx.memo_get(key, index) {
        let outcome = entry.outcome;
        let end = entry.end;
        let matches = entry.matches.clone();
        let errors = entry.errors.clone();
        ctx.replay_memo(end, matches, errors);
        return outcome;
    }

    let start = ctx.state();
    let outcome = inner.run(ctx);
    match outcome {
        Outcome::Accepted | Outcome::Rejected => {
            let entry = MemoEntry {
                outcome,
                end: ctx.pos(),
                matches: ctx.matches()[start.match_count()..].to_vec(),
                errors: ctx.errors()[start.error_count()..].to_vec(),
            };
            ctx.memo_put(key, index, entry);
        }
        // Signals are control flow, not results; never cached.
        Outcome::LeftRecursion(_) | Outcome::Break(_) => {}
    }
    outcome
}

//! Skip policies for the error-recovery combinators.

use crate::context::ParseContext;
use crate::defs::ParseDefs;
use crate::parser::Parser;
use std::fmt;

/// How an error combinator advances the cursor past unrecognized input.
///
/// A skip policy only ever moves the cursor. Probing is done under a state
/// snapshot, so matches and errors a probe produces are discarded, and a
/// policy as a whole never fails.
///
/// Constructed with [`skip_nothing`], [`skip_until`], [`skip_until_after`],
/// [`skip_while`], [`skip_count`], or [`skip_current`].
pub struct Skip<D: ParseDefs> {
    kind: SkipKind<D>,
}

enum SkipKind<D: ParseDefs> {
    /// Leave the cursor where it is.
    Nothing,
    /// Advance until the probe accepts; stop at the first symbol of the
    /// probed range.
    Until(Box<Parser<D>>),
    /// Advance until the probe accepts; stop at the first symbol after the
    /// probed range.
    UntilAfter(Box<Parser<D>>),
    /// Advance one symbol at a time while the probe accepts at the cursor.
    While(Box<Parser<D>>),
    /// Advance up to `n` symbols or until end of input.
    Count(usize),
}

/// A policy that leaves the cursor untouched.
///
/// An error recorded with this policy relies on the context's one-symbol
/// widening to stay visible.
pub fn skip_nothing<D: ParseDefs>() -> Skip<D> {
    Skip { kind: SkipKind::Nothing }
}

/// Advances until `probe` would accept, stopping just before the probed
/// symbols. Reaches end of input if the probe never accepts.
pub fn skip_until<D: ParseDefs>(probe: Parser<D>) -> Skip<D> {
    Skip { kind: SkipKind::Until(Box::new(probe)) }
}

/// Advances until `probe` accepts, stopping at the first symbol after the
/// probed range. Reaches end of input if the probe never accepts.
pub fn skip_until_after<D: ParseDefs>(probe: Parser<D>) -> Skip<D> {
    Skip { kind: SkipKind::UntilAfter(Box::new(probe)) }
}

/// Advances one symbol at a time for as long as `probe` accepts at the
/// cursor.
pub fn skip_while<D: ParseDefs>(probe: Parser<D>) -> Skip<D> {
    Skip { kind: SkipKind::While(Box::new(probe)) }
}

/// Advances up to `count` symbols, stopping early at end of input.
pub fn skip_count<D: ParseDefs>(count: usize) -> Skip<D> {
    Skip { kind: SkipKind::Count(count) }
}

/// Advances past the current symbol; shorthand for `skip_count(1)`.
pub fn skip_current<D: ParseDefs>() -> Skip<D> {
    skip_count(1)
}

impl<D: ParseDefs> Skip<D> {
    /// Runs the policy, advancing the cursor and keeping no other effects.
    pub(crate) fn run(&self, ctx: &mut ParseContext<'_, D>) {
        match &self.kind {
            SkipKind::Nothing => {}
            SkipKind::Until(probe) => {
                while ctx.is_valid() {
                    if Self::probe_accepts(probe, ctx) {
                        break;
                    }
                    ctx.advance();
                }
            }
            SkipKind::UntilAfter(probe) => {
                while ctx.is_valid() {
                    if let Some(after) = Self::probe_end(probe, ctx) {
                        ctx.set_pos(after);
                        break;
                    }
                    ctx.advance();
                }
            }
            SkipKind::While(probe) => {
                while ctx.is_valid() {
                    if !Self::probe_accepts(probe, ctx) {
                        break;
                    }
                    ctx.advance();
                }
            }
            SkipKind::Count(count) => {
                for _ in 0..*count {
                    if !ctx.is_valid() {
                        break;
                    }
                    ctx.advance();
                }
            }
        }
    }

    /// Probes without keeping any effect, reporting acceptance.
    fn probe_accepts(probe: &Parser<D>, ctx: &mut ParseContext<'_, D>) -> bool {
        Self::probe_end(probe, ctx).is_some()
    }

    /// Probes without keeping any effect, reporting where an accepting
    /// probe ended.
    fn probe_end(probe: &Parser<D>, ctx: &mut ParseContext<'_, D>) -> Option<pegkit_span::Pos> {
        let snapshot = ctx.state();
        let accepted = probe.run(ctx).is_accepted();
        let end = ctx.pos();
        ctx.set_state(snapshot);
        // Probing must be invisible; even errors an accepting probe
        // recorded are dropped.
        ctx.truncate_errors(snapshot.error_count());
        accepted.then_some(end)
    }
}

impl<D: ParseDefs> Clone for Skip<D> {
    fn clone(&self) -> Self {
        let kind = match &self.kind {
            SkipKind::Nothing => SkipKind::Nothing,
            SkipKind::Until(p) => SkipKind::Until(p.clone()),
            SkipKind::UntilAfter(p) => SkipKind::UntilAfter(p.clone()),
            SkipKind::While(p) => SkipKind::While(p.clone()),
            SkipKind::Count(n) => SkipKind::Count(*n),
        };
        Skip { kind }
    }
}

impl<D: ParseDefs> fmt::Debug for Skip<D> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.kind {
            SkipKind::Nothing => f.write_str("skip_nothing"),
            SkipKind::Until(p) => f.debug_tuple("skip_until").field(p).finish(),
            SkipKind::UntilAfter(p) => f.debug_tuple("skip_until_after").field(p).finish(),
            SkipKind::While(p) => f.debug_tuple("skip_while").field(p).finish(),
            SkipKind::Count(n) => f.debug_tuple("skip_count").field(n).finish(),
        }
    }
}

//! Top-level parse entry point and its result surface.

use crate::context::{ErrorRecord, Match, ParseContext};
use crate::defs::ParseDefs;
use crate::failure::ParseFailure;
use crate::outcome::Outcome;
use crate::parser::Parser;
use pegkit_span::Pos;
use std::fmt;

/// Everything a finished parse produced.
pub struct ParseOutput<D: ParseDefs> {
    /// Whether the grammar accepted.
    pub accepted: bool,
    /// Whether the cursor reached the end of input.
    pub fully_consumed: bool,
    /// Where the cursor ended up.
    pub end: Pos,
    /// Top-level matches, in source order.
    pub matches: Vec<Match<D>>,
    /// Errors recorded by the error combinators, in discovery order.
    pub errors: Vec<ErrorRecord<D>>,
}

impl<D: ParseDefs> ParseOutput<D> {
    /// Accepted and consumed all input.
    ///
    /// Recovered errors do not make a parse unsuccessful by themselves;
    /// recovery exists so parsing can continue past them. Use
    /// [`is_clean`](Self::is_clean) when errors should count as failure.
    #[inline]
    pub fn success(&self) -> bool {
        self.accepted && self.fully_consumed
    }

    /// Successful and free of recorded errors.
    #[inline]
    pub fn is_clean(&self) -> bool {
        self.success() && self.errors.is_empty()
    }
}

impl<D: ParseDefs> fmt::Debug for ParseOutput<D> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ParseOutput")
            .field("accepted", &self.accepted)
            .field("fully_consumed", &self.fully_consumed)
            .field("end", &self.end)
            .field("matches", &self.matches)
            .field("errors", &self.errors)
            .finish()
    }
}

/// Parses `source` with `grammar` on a fresh context.
///
/// Returns the collected matches and errors; [`ParseFailure`] is reserved
/// for grammars the engine cannot execute (unresolved left recursion, a
/// stray loop break); ordinary rejection is reported through
/// [`ParseOutput::accepted`].
pub fn parse<D: ParseDefs>(
    source: &[D::Symbol],
    grammar: &Parser<D>,
) -> Result<ParseOutput<D>, ParseFailure> {
    let mut ctx = ParseContext::<D>::new(source);
    let outcome = grammar.parse(&mut ctx);
    debug_assert!(ctx.no_active_rules(), "rule registrations leaked past the parse");
    finish(ctx, outcome)
}

/// Like [`parse`], for a grammar rooted at a rule.
pub fn parse_rule<D: ParseDefs>(
    source: &[D::Symbol],
    grammar: &crate::rule::Rule<D>,
) -> Result<ParseOutput<D>, ParseFailure> {
    let mut ctx = ParseContext::<D>::new(source);
    let outcome = grammar.parse(&mut ctx);
    debug_assert!(ctx.no_active_rules(), "rule registrations leaked past the parse");
    finish(ctx, outcome)
}

fn finish<D: ParseDefs>(
    mut ctx: ParseContext<'_, D>,
    outcome: Outcome,
) -> Result<ParseOutput<D>, ParseFailure> {
    match outcome {
        Outcome::Accepted | Outcome::Rejected => {
            let output = ParseOutput {
                accepted: outcome.is_accepted(),
                fully_consumed: ctx.is_end(),
                end: ctx.pos(),
                matches: ctx.take_matches(),
                errors: ctx.take_errors(),
            };
            tracing::debug!(
                target: "pegkit",
                accepted = output.accepted,
                fully_consumed = output.fully_consumed,
                matches = output.matches.len(),
                errors = output.errors.len(),
                "parse finished"
            );
            Ok(output)
        }
        Outcome::LeftRecursion(rule) => Err(ParseFailure::UnresolvedLeftRecursion { rule }),
        Outcome::Break(levels) => Err(ParseFailure::StrayLoopBreak { levels }),
    }
}

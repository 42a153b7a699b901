//! The three-valued parse result.

use crate::rule::RuleId;

/// Result of invoking a parser against a context.
///
/// `Accepted` and `Rejected` are the ordinary PEG outcomes. The other two
/// variants are in-band control flow, replacing the exceptions the problem
/// is traditionally solved with:
///
/// - [`LeftRecursion`](Outcome::LeftRecursion) travels up the combinator
///   tree from a rule re-entered at its own start position, until it reaches
///   the invocation of that same rule, which resolves it (see
///   [`Rule`](crate::Rule)). If it reaches the top of the parse instead, the
///   recursion was not directly resolvable and the parse aborts.
/// - [`Break`](Outcome::Break) unwinds loop levels; each enclosing loop
///   decrements the counter and the loop that receives a count of one stops
///   iterating.
///
/// Combinators that do not understand a variant pass it through unchanged.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Outcome {
    /// The parser consumed (possibly zero) input and succeeded.
    Accepted,
    /// The parser failed; the context state is as it was before the call.
    Rejected,
    /// A rule was re-entered at the position it is already being parsed at.
    LeftRecursion(RuleId),
    /// A loop break unwinding the given number of loop levels.
    Break(u32),
}

impl Outcome {
    /// True for [`Outcome::Accepted`].
    #[inline]
    pub fn is_accepted(self) -> bool {
        matches!(self, Outcome::Accepted)
    }

    /// True for [`Outcome::Rejected`].
    #[inline]
    pub fn is_rejected(self) -> bool {
        matches!(self, Outcome::Rejected)
    }
}

impl From<bool> for Outcome {
    #[inline]
    fn from(accepted: bool) -> Self {
        if accepted { Outcome::Accepted } else { Outcome::Rejected }
    }
}

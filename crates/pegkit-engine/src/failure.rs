//! Fatal parse failures.

use crate::rule::RuleId;
use thiserror::Error;

/// Conditions that abort a parse outright.
///
/// Ordinary rejection and grammar-reported errors are data in the parse
/// output; these are not. They indicate a grammar the engine cannot
/// execute: recursion it cannot resolve, or control flow escaping its
/// scope.
#[derive(Error, Debug, Clone, Copy, PartialEq, Eq)]
pub enum ParseFailure {
    /// A left-recursion signal reached the top of the parse.
    ///
    /// Direct recursion is resolved by the rule that owns it; a signal
    /// escaping means recursion through more than one rule (or a recursive
    /// reference outside any rule), which the engine does not support.
    #[error("unresolved left recursion involving {rule}")]
    UnresolvedLeftRecursion {
        /// The rule whose re-entry went unresolved.
        rule: RuleId,
    },

    /// A loop break unwound past the outermost loop.
    #[error("loop break escaped {levels} level(s) past the outermost loop")]
    StrayLoopBreak {
        /// Levels still unconsumed when the break reached the top.
        levels: u32,
    },
}

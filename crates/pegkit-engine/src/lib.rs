//! PEG combinator engine with direct left recursion.
//!
//! This crate is the core of pegkit: grammars are plain values composed
//! from primitives and combinators, executed over a borrowed symbol slice
//! by a mutable [`ParseContext`], producing a tree of [`Match`]es and a
//! flat list of [`ErrorRecord`]s.
//!
//! # Architecture
//!
//! The engine is organized around a few key pieces:
//!
//! - **Definition bundles**: a [`ParseDefs`] marker type fixes the symbol
//!   type, the match/error id types, and the symbol comparison policy for a
//!   grammar family. [`CharDefs`] and [`CaseInsensitiveCharDefs`] cover
//!   text; the front-end crate adds a token-stream bundle.
//! - **Parsers as values**: [`Parser`] is a cloneable expression tree.
//!   Sequences and choices flatten on construction; operators (`>>`, `|`,
//!   `-`, `!`, unary `-`) mirror the usual PEG notation.
//! - **One mutable context per parse**: [`ParseContext`] holds the cursor,
//!   the match/error vectors, rule-recursion records, and the memo table.
//!   Failed alternatives roll back through [`ParseContext::state`] /
//!   [`ParseContext::set_state`] snapshots.
//! - **Rules**: [`Rule`] is the recursion point. Direct left recursion is
//!   resolved with a seed/grow protocol instead of diverging, so grammars
//!   like `add = add '+' mul | mul` parse left-associatively in one pass.
//! - **Error recovery**: [`error`]/[`error_match`] with the skip policies
//!   ([`skip_until`], [`skip_until_after`], [`skip_while`], [`skip_count`],
//!   [`skip_nothing`]) record diagnostics and resynchronize instead of
//!   failing.
//! - **Memoization**: [`Parser::memoized`] caches outcomes per position,
//!   trading memory for a bound on backtracking.
//!
//! # Usage
//!
//! ```ignore
//! use pegkit_engine::{parse, range, terminal, CharDefs, Rule};
//!
//! #[derive(Debug, Clone, Copy, PartialEq, Eq)]
//! enum CalcMatch { Num, Add }
//! #[derive(Debug, Clone, Copy, PartialEq, Eq)]
//! enum CalcError {}
//! type Calc = CharDefs<CalcMatch, CalcError>;
//!
//! let add = Rule::<Calc>::named("add");
//! let num = range::<Calc>('0', '9').one_or_more().matched(CalcMatch::Num);
//! add.define(
//!     (add.parser() >> terminal('+') >> num.clone()).matched(CalcMatch::Add)
//!         | num,
//! );
//!
//! let source: Vec<char> = "1+2+3".chars().collect();
//! let output = parse(&source, &add.parser())?;
//! assert!(output.is_clean());
//! # Ok::<(), pegkit_engine::ParseFailure>(())
//! ```
//!
//! # Concurrency
//!
//! A parse is a single-threaded recursive traversal of the grammar tree. A
//! context must never be driven from two threads; grammar values are
//! immutable after construction and may be shared across any number of
//! parses over disjoint contexts.
//!
//! # Tracing
//!
//! [`Parser::labeled`] and [`Parser::debugged`] are transparent wrappers
//! that emit `tracing` events at trace level under the `pegkit::trace`
//! target, indented by grammar depth. Install a `tracing` subscriber to see
//! them; without one they cost almost nothing.

mod context;
mod defs;
mod exec;
mod failure;
mod ops;
mod outcome;
mod output;
mod parser;
mod rule;
mod skip;

pub use context::{ErrorRecord, Match, ParseContext, State};
pub use defs::{CaseInsensitiveCharDefs, CharDefs, Id, ParseDefs};
pub use failure::ParseFailure;
pub use outcome::Outcome;
pub use output::{parse, parse_rule, ParseOutput};
pub use parser::{
    always, any, boolean, end, error, error_match, error_match_with, error_with, function,
    loop_break, never, newline, one_of, range, terminal, terminal_seq, text, Parser,
};
pub use rule::{Rule, RuleId};
pub use skip::{skip_count, skip_current, skip_nothing, skip_until, skip_until_after, skip_while, Skip};

pub use pegkit_span::{Pos, Span, TextPos};

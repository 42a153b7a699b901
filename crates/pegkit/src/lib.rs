//! pegkit: a PEG parser-combinator toolkit.
//!
//! This crate re-exports the whole toolkit and ships a worked example
//! language ([`calc`]) exercising the full two-stage pipeline.
//!
//! - [`pegkit_engine`]: combinators, parse context, rules with direct
//!   left recursion, error recovery, memoization (re-exported at the root
//!   and through [`prelude`]).
//! - [`pegkit_ast`]: match-tree to AST projection.
//! - [`pegkit_frontend`]: lexer to tokens to parser pipelines.
//!
//! # Quick start
//!
//! ```ignore
//! use pegkit::prelude::*;
//!
//! #[derive(Debug, Clone, Copy, PartialEq, Eq)]
//! enum Tag { Word }
//! #[derive(Debug, Clone, Copy, PartialEq, Eq)]
//! enum Err {}
//! type Defs = CharDefs<Tag, Err>;
//!
//! let word = range::<Defs>('a', 'z').one_or_more().matched(Tag::Word);
//! let source: Vec<char> = "hello".chars().collect();
//! let out = parse(&source, &word)?;
//! assert!(out.is_clean());
//! # Ok::<(), ParseFailure>(())
//! ```

pub mod calc;
pub mod prelude;

pub use pegkit_ast as ast;
pub use pegkit_engine as engine;
pub use pegkit_frontend as frontend;
pub use pegkit_span as span;

pub use pegkit_engine::{
    always, any, boolean, end, error, error_match, error_match_with, error_with, function,
    loop_break, never, newline, one_of, parse, parse_rule, range, skip_count, skip_current,
    skip_nothing, skip_until, skip_until_after, skip_while, terminal, terminal_seq, text,
    CaseInsensitiveCharDefs, CharDefs, ErrorRecord, Id, Match, Outcome, ParseContext, ParseDefs,
    ParseFailure, ParseOutput, Parser, Rule, RuleId, Skip, State,
};

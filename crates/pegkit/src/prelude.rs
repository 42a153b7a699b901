//! One-stop imports for grammar modules.
//!
//! ```ignore
//! use pegkit::prelude::*;
//! ```

pub use pegkit_ast::{project, project_with, AstNode, DefaultNodeFactory, NodeFactory};
pub use pegkit_engine::{
    always, any, boolean, end, error, error_match, error_match_with, error_with, function,
    loop_break, never, newline, one_of, parse, parse_rule, range, skip_count, skip_current,
    skip_nothing, skip_until, skip_until_after, skip_while, terminal, terminal_seq, text,
    CaseInsensitiveCharDefs, CharDefs, ErrorRecord, Id, Match, Outcome, ParseContext, ParseDefs,
    ParseFailure, ParseOutput, Parser, Rule, RuleId, Skip, State,
};
pub use pegkit_frontend::{
    compile, parse_tokens, parse_tokens_with, source_span, tok, CompileOutput, LexOutput,
    ParseStageOutput, Token, TokenDefs,
};
pub use pegkit_span::{Pos, Span, TextPos};

//! Two-stage compiler front-end for pegkit.
//!
//! A front-end is two grammars running on the same engine:
//!
//! 1. a **lexer** grammar over source symbols, whose top-level matches
//!    become a vector of [`Token`]s;
//! 2. a **parser** grammar over that token vector, whose matches project
//!    into an AST.
//!
//! For the parser stage the context's symbol type *is* the token and the
//! comparison policy compares token ids ([`TokenDefs`]), so grammar
//! terminals are written with [`tok`]. Token spans retain source positions,
//! which is what lets [`source_span`] map parser-stage diagnostics back
//! onto the original text.
//!
//! # Usage
//!
//! ```ignore
//! let lex = tokenize(&source, &lexer_grammar)?;
//! let syntax = parse_tokens(&lex.tokens, &parser_grammar)?;
//! // or both at once:
//! let out = compile(&source, &lexer_grammar, &parser_grammar)?;
//! assert!(out.success);
//! ```

mod pipeline;
mod token;

pub use pipeline::{
    compile, parse_tokens, parse_tokens_with, source_span, tokenize, CompileOutput, LexOutput,
    ParseStageOutput,
};
pub use token::{tok, Token, TokenDefs};

//! Two-stage pipeline over a tiny assignment language:
//! `name=name;name=name;...`

use pegkit_frontend::{Token, compile, parse_tokens, source_span, tok, tokenize};
use pegkit_engine::{CharDefs, end, error_with, one_of, range, skip_current, terminal};
use pegkit_span::{Pos, Span};

/// Lexer-stage ids: one per token.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
enum Tok {
    Name,
    Eq,
    Semi,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum LexErr {
    Junk,
}

/// Parser-stage ids.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Ast {
    Name,
    Assign,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum SynErr {
    MissingSemi,
}

type Lex = CharDefs<Tok, LexErr>;

fn lexer() -> pegkit_engine::Parser<Lex> {
    let ws = one_of::<Lex>(" \n\t".chars());
    let name = range::<Lex>('a', 'z').one_or_more().matched(Tok::Name);
    let eq = terminal::<Lex>('=').matched(Tok::Eq);
    let semi = terminal::<Lex>(';').matched(Tok::Semi);
    let piece = ws | name | eq | semi | error_with(LexErr::Junk, skip_current());
    piece.zero_or_more() >> end()
}

fn parser() -> pegkit_engine::Parser<pegkit_frontend::TokenDefs<Tok, Ast, SynErr>> {
    let name = tok(Tok::Name).matched(Ast::Name);
    let assign = (name.clone() >> tok(Tok::Eq) >> name
        >> (tok(Tok::Semi) | error_with(SynErr::MissingSemi, pegkit_engine::skip_nothing())))
    .matched(Ast::Assign);
    assign.zero_or_more() >> end()
}

fn chars(s: &str) -> Vec<char> {
    s.chars().collect()
}

#[test]
fn clean_input_compiles_cleanly() {
    let source = chars("ab=cd;x=y;");
    let out = compile(&source, &lexer(), &parser()).unwrap();
    assert!(out.success);
    assert!(out.lexer.success);
    assert!(out.parser.success);
    assert_eq!(out.lexer.tokens.len(), 8);
    assert_eq!(out.parser.ast.len(), 2);

    let first = &out.parser.ast[0];
    assert_eq!(first.id(), Ast::Assign);
    assert_eq!(first.child_count(), 2);
    assert_eq!(first.child(0).unwrap().id(), Ast::Name);
}

#[test]
fn token_spans_point_into_the_source() {
    let source = chars("ab=cd;");
    let out = compile(&source, &lexer(), &parser()).unwrap();
    let tokens = &out.lexer.tokens;
    assert_eq!(tokens[0].span.to_text(&source), "ab");
    assert_eq!(tokens[1].span.to_text(&source), "=");
    assert_eq!(tokens[2].span.to_text(&source), "cd");
}

#[test]
fn ast_spans_remap_to_source_text() {
    let source = chars("ab = cd ;");
    let out = compile(&source, &lexer(), &parser()).unwrap();
    assert!(out.success);

    let assign = &out.parser.ast[0];
    let rhs = assign.child(1).unwrap();
    let span = source_span(rhs.span(), &out.lexer.tokens);
    assert_eq!(span.to_text(&source), "cd");
}

#[test]
fn lexer_errors_fail_the_pipeline_but_not_the_parse() {
    let source = chars("ab=c?d;");
    let out = compile(&source, &lexer(), &parser()).unwrap();
    assert!(!out.success);
    assert!(!out.lexer.success);
    assert_eq!(out.lexer.errors.len(), 1);
    assert_eq!(out.lexer.errors[0].id(), LexErr::Junk);
    // The junk split "c?d" into two Name tokens, which the parser stage
    // cannot fit into an assignment list.
    assert!(!out.parser.success);
}

#[test]
fn parser_errors_carry_token_spans() {
    // Missing semicolon after the first assignment.
    let source = chars("ab=cd x=y;");
    let out = compile(&source, &lexer(), &parser()).unwrap();
    assert!(!out.success);
    assert!(out.lexer.success);
    assert_eq!(out.parser.errors.len(), 1);

    let err = out.parser.errors[0];
    assert_eq!(err.id(), SynErr::MissingSemi);
    // The error is recorded in token coordinates; remap to the source.
    let span = source_span(err.span(), &out.lexer.tokens);
    assert_eq!(span.to_text(&source), "x");
}

#[test]
fn staged_entry_points_match_compile() {
    let source = chars("ab=cd;");
    let lex = tokenize(&source, &lexer()).unwrap();
    let stage2 = parse_tokens(&lex.tokens, &parser()).unwrap();
    let whole = compile(&source, &lexer(), &parser()).unwrap();

    assert_eq!(lex.success, whole.lexer.success);
    assert_eq!(stage2.success, whole.parser.success);
    assert_eq!(lex.tokens.len(), whole.lexer.tokens.len());
}

#[test]
fn empty_source_compiles_to_empty_ast() {
    let source: Vec<char> = Vec::new();
    let out = compile(&source, &lexer(), &parser()).unwrap();
    assert!(out.success);
    assert!(out.lexer.tokens.is_empty());
    assert!(out.parser.ast.is_empty());
}

#[test]
fn pattern_tokens_compare_by_id_only() {
    let a = Token::new(Tok::Name, Span::new(Pos::at(0), Pos::at(2)));
    let b = Token::pattern(Tok::Name);
    assert_eq!(a.id, b.id);
    assert!(b.span.is_empty());
}

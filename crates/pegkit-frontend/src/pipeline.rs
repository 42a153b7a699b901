//! The two-stage lexer → parser pipeline.

use crate::token::{Token, TokenDefs};
use pegkit_ast::{project_with, AstNode, DefaultNodeFactory, NodeFactory};
use pegkit_engine::{parse, ErrorRecord, Id, Match, ParseDefs, ParseFailure, Parser};
use pegkit_span::Span;
use std::rc::Rc;

/// Result of the lexer stage.
pub struct LexOutput<D: ParseDefs> {
    /// Whether the stage succeeded: lexer grammar accepted, consumed all
    /// input, and recorded no errors.
    pub success: bool,
    /// One token per top-level match of the lexer grammar, in source order.
    pub tokens: Vec<Token<D::MatchId>>,
    /// Errors recorded by the lexer grammar.
    pub errors: Vec<ErrorRecord<D>>,
}

impl<D: ParseDefs> std::fmt::Debug for LexOutput<D> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("LexOutput")
            .field("success", &self.success)
            .field("tokens", &self.tokens)
            .field("errors", &self.errors)
            .finish()
    }
}

/// Result of the parser stage.
pub struct ParseStageOutput<P: ParseDefs> {
    /// Whether the stage succeeded: parser grammar accepted, consumed all
    /// tokens, and recorded no errors.
    pub success: bool,
    /// Projected syntax-tree roots.
    pub ast: Vec<Rc<AstNode<P>>>,
    /// The raw top-level matches, for callers that want to work below the
    /// AST projection.
    pub matches: Vec<Match<P>>,
    /// Errors recorded by the parser grammar; spans index the token
    /// stream (see [`source_span`] to map them back).
    pub errors: Vec<ErrorRecord<P>>,
}

/// Result of the whole pipeline.
pub struct CompileOutput<L: ParseDefs, T, M, E>
where
    T: Id + Ord,
    M: Id,
    E: Id,
{
    /// `lexer.success && parser.success`.
    pub success: bool,
    /// The lexer stage output, including the intermediate token list.
    pub lexer: LexOutput<L>,
    /// The parser stage output.
    pub parser: ParseStageOutput<TokenDefs<T, M, E>>,
}

/// Runs a lexer grammar over character-level input, turning each top-level
/// match into a token.
///
/// Nested matches are deliberately flattened away: a lexer grammar captures
/// one match per token, and whatever structure it used internally is not a
/// token boundary.
pub fn tokenize<D: ParseDefs>(
    source: &[D::Symbol],
    lexer: &Parser<D>,
) -> Result<LexOutput<D>, ParseFailure> {
    let output = parse(source, lexer)?;
    let tokens = output
        .matches
        .iter()
        .map(|m| Token::new(m.id(), m.span()))
        .collect::<Vec<_>>();
    tracing::debug!(
        target: "pegkit::frontend",
        tokens = tokens.len(),
        errors = output.errors.len(),
        "lexer stage finished"
    );
    Ok(LexOutput { success: output.success() && output.errors.is_empty(), tokens, errors: output.errors })
}

/// Runs a parser grammar over a token stream and projects the AST through
/// `factory`.
pub fn parse_tokens_with<T, M, E, F>(
    tokens: &[Token<T>],
    parser: &Parser<TokenDefs<T, M, E>>,
    factory: &F,
) -> Result<ParseStageOutput<TokenDefs<T, M, E>>, ParseFailure>
where
    T: Id + Ord,
    M: Id,
    E: Id,
    F: NodeFactory<TokenDefs<T, M, E>>,
{
    let output = parse(tokens, parser)?;
    let ast = project_with(&output.matches, factory);
    tracing::debug!(
        target: "pegkit::frontend",
        roots = ast.len(),
        errors = output.errors.len(),
        "parser stage finished"
    );
    Ok(ParseStageOutput {
        success: output.success() && output.errors.is_empty(),
        ast,
        matches: output.matches,
        errors: output.errors,
    })
}

/// Runs a parser grammar over a token stream with the default node factory.
pub fn parse_tokens<T, M, E>(
    tokens: &[Token<T>],
    parser: &Parser<TokenDefs<T, M, E>>,
) -> Result<ParseStageOutput<TokenDefs<T, M, E>>, ParseFailure>
where
    T: Id + Ord,
    M: Id,
    E: Id,
{
    parse_tokens_with(tokens, parser, &DefaultNodeFactory)
}

/// Runs the full pipeline: lexer over the source, parser over the tokens.
///
/// The parser stage runs even when lexing recorded errors: recovery in
/// the lexer grammar exists precisely so later stages still have tokens to
/// work with. Overall success requires both stages to succeed.
pub fn compile<L, T, M, E>(
    source: &[L::Symbol],
    lexer: &Parser<L>,
    parser: &Parser<TokenDefs<T, M, E>>,
) -> Result<CompileOutput<L, T, M, E>, ParseFailure>
where
    L: ParseDefs<MatchId = T>,
    T: Id + Ord,
    M: Id,
    E: Id,
{
    let lex = tokenize(source, lexer)?;
    let stage2 = parse_tokens(&lex.tokens, parser)?;
    Ok(CompileOutput { success: lex.success && stage2.success, lexer: lex, parser: stage2 })
}

/// Maps a parser-stage span (token indices) back to a source span.
///
/// Token spans retain source positions, so a range of tokens maps to the
/// range from the first token's begin to the last token's end. An empty
/// token span maps to an empty source span at the next token's begin (or
/// the end of the last token when there is none).
pub fn source_span<T: Id>(token_span: Span, tokens: &[Token<T>]) -> Span {
    if tokens.is_empty() {
        return Span::default();
    }
    let begin_token = token_span.begin.index.min(tokens.len() - 1);
    if token_span.is_empty() {
        let pos = if token_span.begin.index < tokens.len() {
            tokens[token_span.begin.index].span.begin
        } else {
            tokens[tokens.len() - 1].span.end
        };
        return Span::empty(pos);
    }
    let end_token = (token_span.end.index - 1).min(tokens.len() - 1);
    Span::new(tokens[begin_token].span.begin, tokens[end_token].span.end)
}

#[cfg(test)]
mod tests {
    use super::*;
    use pegkit_span::Pos;

    #[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
    enum T {
        A,
    }

    fn token(id: T, begin: usize, end: usize) -> Token<T> {
        Token::new(id, Span::new(Pos::at(begin), Pos::at(end)))
    }

    #[test]
    fn source_span_maps_token_range() {
        let tokens = vec![token(T::A, 0, 2), token(T::A, 3, 5), token(T::A, 6, 9)];
        let mapped = source_span(Span::new(Pos::at(1), Pos::at(3)), &tokens);
        assert_eq!(mapped.begin.index, 3);
        assert_eq!(mapped.end.index, 9);
    }

    #[test]
    fn source_span_of_empty_token_span() {
        let tokens = vec![token(T::A, 0, 2), token(T::A, 3, 5)];
        let mapped = source_span(Span::empty(Pos::at(1)), &tokens);
        assert!(mapped.is_empty());
        assert_eq!(mapped.begin.index, 3);

        let past_end = source_span(Span::empty(Pos::at(2)), &tokens);
        assert!(past_end.is_empty());
        assert_eq!(past_end.begin.index, 5);
    }

    #[test]
    fn source_span_of_empty_token_list() {
        let mapped = source_span::<T>(Span::empty(Pos::at(0)), &[]);
        assert!(mapped.is_empty());
        assert_eq!(mapped.begin.index, 0);
    }
}

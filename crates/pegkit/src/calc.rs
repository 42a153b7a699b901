//! A worked example language: `calc`.
//!
//! A small expression language with `let` bindings, run through the full
//! two-stage pipeline:
//!
//! ```text
//! let x = 2 in x * (3 + 4) - 1
//! ```
//!
//! The lexer grammar produces [`CalcToken`]s (keywords resolved through a
//! compile-time table after lexing, the way hand-written lexers do it), the
//! parser grammar builds a left-associative expression tree over the token
//! stream, and [`CalcProgram::eval`] folds the projected AST into a number.
//!
//! Besides being a usable example, this module doubles as an end-to-end
//! fixture for the integration tests.

use phf::phf_map;
use unicode_ident::{is_xid_continue, is_xid_start};

use pegkit_ast::AstNode;
use pegkit_engine::{
    ErrorRecord, ParseFailure, Parser, Rule, error, function, newline, one_of, range, terminal,
};
use pegkit_engine::CharDefs;
use pegkit_frontend::{Token, TokenDefs, parse_tokens, source_span, tok, tokenize};
use std::collections::HashMap;
use std::rc::Rc;
use thiserror::Error;

/// Token ids produced by the lexer stage.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum CalcToken {
    /// Integer or decimal literal.
    Num,
    /// Identifier (not a keyword).
    Ident,
    /// `let` keyword.
    Let,
    /// `in` keyword.
    In,
    /// `=`
    Assign,
    /// `+`
    Plus,
    /// `-`
    Minus,
    /// `*`
    Star,
    /// `/`
    Slash,
    /// `(`
    LParen,
    /// `)`
    RParen,
}

/// Lexer-stage error ids.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LexError {
    /// A character no token starts with; skipped.
    UnexpectedChar,
}

/// AST node ids produced by the parser stage.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CalcAst {
    Num,
    Var,
    Add,
    Sub,
    Mul,
    Div,
    Let,
}

/// Parser-stage error ids.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SyntaxError {
    /// `(` without a matching `)`.
    ExpectedRParen,
}

/// Parse definitions of the lexer stage.
pub type LexDefs = CharDefs<CalcToken, LexError>;
/// Parse definitions of the parser stage.
pub type SynDefs = TokenDefs<CalcToken, CalcAst, SyntaxError>;

/// Keywords, resolved after lexing: the lexer tags every word as
/// [`CalcToken::Ident`] and this table reclassifies the reserved ones.
static KEYWORDS: phf::Map<&'static str, CalcToken> = phf_map! {
    "let" => CalcToken::Let,
    "in" => CalcToken::In,
};

/// Builds the lexer grammar.
///
/// Whitespace is consumed without producing matches; every other accepted
/// region becomes one token. An unrecognized character is reported and
/// skipped so lexing always reaches the end of input.
pub fn lexer() -> Parser<LexDefs> {
    let ws = one_of::<LexDefs>(" \t\r".chars()) | newline(terminal('\n'));

    let digit = range::<LexDefs>('0', '9');
    let num = (digit.clone().one_or_more() >> (terminal('.') >> digit.one_or_more()).opt())
        .matched(CalcToken::Num);

    let word = function::<LexDefs, _>(|ctx| {
        let Some(&first) = ctx.symbol() else {
            return false;
        };
        if !is_xid_start(first) && first != '_' {
            return false;
        }
        ctx.advance();
        while ctx.symbol().is_some_and(|&c| is_xid_continue(c)) {
            ctx.advance();
        }
        true
    })
    .matched(CalcToken::Ident);

    let op = terminal::<LexDefs>('=').matched(CalcToken::Assign)
        | terminal('+').matched(CalcToken::Plus)
        | terminal('-').matched(CalcToken::Minus)
        | terminal('*').matched(CalcToken::Star)
        | terminal('/').matched(CalcToken::Slash)
        | terminal('(').matched(CalcToken::LParen)
        | terminal(')').matched(CalcToken::RParen);

    let piece = ws
        | num
        | word
        | op
        | pegkit_engine::error_with(LexError::UnexpectedChar, pegkit_engine::skip_current());

    piece.zero_or_more() >> pegkit_engine::end()
}

/// Reclassifies identifier tokens that spell a keyword.
pub fn classify_keywords(tokens: &mut [Token<CalcToken>], source: &[char]) {
    for token in tokens {
        if token.id == CalcToken::Ident {
            let text = token.span.to_text(source);
            if let Some(&keyword) = KEYWORDS.get(text.as_str()) {
                token.id = keyword;
            }
        }
    }
}

/// The parser-stage grammar.
///
/// Holds its rules so references stay valid for as long as the grammar
/// value lives:
///
/// ```text
/// expr = let_expr | add
/// add  = add '+' mul | add '-' mul | mul        (left recursive)
/// mul  = mul '*' atom | mul '/' atom | atom     (left recursive)
/// atom = num | var | '(' expr ')'
/// ```
pub struct CalcGrammar {
    expr: Rule<SynDefs>,
    #[allow(dead_code)]
    add: Rule<SynDefs>,
    #[allow(dead_code)]
    mul: Rule<SynDefs>,
}

impl CalcGrammar {
    /// Builds the grammar.
    pub fn new() -> Self {
        let expr = Rule::named("expr");
        let add = Rule::named("add");
        let mul = Rule::named("mul");

        let num = tok(CalcToken::Num).matched(CalcAst::Num);
        let var = tok(CalcToken::Ident).matched(CalcAst::Var);

        let atom = num
            | var.clone()
            | (tok(CalcToken::LParen)
                >> expr.parser()
                >> (tok(CalcToken::RParen) | error(SyntaxError::ExpectedRParen)));

        mul.define(
            (mul.parser() >> tok(CalcToken::Star) >> atom.clone()).matched(CalcAst::Mul)
                | (mul.parser() >> tok(CalcToken::Slash) >> atom.clone()).matched(CalcAst::Div)
                | atom,
        );

        add.define(
            (add.parser() >> tok(CalcToken::Plus) >> mul.parser()).matched(CalcAst::Add)
                | (add.parser() >> tok(CalcToken::Minus) >> mul.parser()).matched(CalcAst::Sub)
                | mul.parser(),
        );

        let let_expr = (tok(CalcToken::Let)
            >> var
            >> tok(CalcToken::Assign)
            >> expr.parser()
            >> tok(CalcToken::In)
            >> expr.parser())
        .matched(CalcAst::Let);

        expr.define(let_expr | add.parser());

        Self { expr, add, mul }
    }

    /// The grammar's root parser.
    pub fn parser(&self) -> Parser<SynDefs> {
        self.expr.parser()
    }
}

impl Default for CalcGrammar {
    fn default() -> Self {
        Self::new()
    }
}

/// Everything compiling a `calc` program produced.
pub struct CalcProgram {
    /// Both stages accepted with no recorded errors.
    pub success: bool,
    /// The source, as the symbol slice both stages' spans index into.
    pub source: Vec<char>,
    /// The intermediate token list.
    pub tokens: Vec<Token<CalcToken>>,
    /// Lexer-stage errors.
    pub lex_errors: Vec<ErrorRecord<LexDefs>>,
    /// Parser-stage errors (spans index the token list).
    pub syntax_errors: Vec<ErrorRecord<SynDefs>>,
    /// Projected syntax-tree roots.
    pub ast: Vec<Rc<AstNode<SynDefs>>>,
}

/// Evaluation failures.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum EvalError {
    /// The program produced no expression to evaluate.
    #[error("nothing to evaluate")]
    EmptyProgram,
    /// A variable was used without a surrounding `let`.
    #[error("undefined variable `{0}`")]
    UndefinedVariable(String),
    /// A numeric literal the evaluator could not read back.
    #[error("malformed number literal `{0}`")]
    MalformedNumber(String),
    /// A node with an unexpected child count; indicates a grammar bug.
    #[error("malformed expression tree at {0:?}")]
    MalformedTree(CalcAst),
}

/// Compiles a `calc` program: lex, resolve keywords, parse, project.
pub fn compile(source_text: &str) -> Result<CalcProgram, ParseFailure> {
    let source: Vec<char> = source_text.chars().collect();

    let mut lex = tokenize(&source, &lexer())?;
    classify_keywords(&mut lex.tokens, &source);

    let grammar = CalcGrammar::new();
    let syntax = parse_tokens(&lex.tokens, &grammar.parser())?;

    Ok(CalcProgram {
        success: lex.success && syntax.success,
        source,
        tokens: lex.tokens,
        lex_errors: lex.errors,
        syntax_errors: syntax.errors,
        ast: syntax.ast,
    })
}

impl CalcProgram {
    /// Evaluates the program in an empty environment.
    pub fn eval(&self) -> Result<f64, EvalError> {
        let root = self.ast.first().ok_or(EvalError::EmptyProgram)?;
        let env = HashMap::new();
        self.eval_node(root, &env)
    }

    /// The source text behind a node, resolved through the token spans.
    pub fn node_text(&self, node: &AstNode<SynDefs>) -> String {
        source_span(node.span(), &self.tokens).to_text(&self.source)
    }

    fn eval_node(
        &self,
        node: &Rc<AstNode<SynDefs>>,
        env: &HashMap<String, f64>,
    ) -> Result<f64, EvalError> {
        match node.id() {
            CalcAst::Num => {
                let text = self.node_text(node);
                text.parse().map_err(|_| EvalError::MalformedNumber(text))
            }
            CalcAst::Var => {
                let name = self.node_text(node);
                env.get(&name).copied().ok_or(EvalError::UndefinedVariable(name))
            }
            CalcAst::Add | CalcAst::Sub | CalcAst::Mul | CalcAst::Div => {
                let (Some(lhs), Some(rhs), 2) = (node.child(0), node.child(1), node.child_count())
                else {
                    return Err(EvalError::MalformedTree(node.id()));
                };
                let lhs = self.eval_node(&lhs, env)?;
                let rhs = self.eval_node(&rhs, env)?;
                Ok(match node.id() {
                    CalcAst::Add => lhs + rhs,
                    CalcAst::Sub => lhs - rhs,
                    CalcAst::Mul => lhs * rhs,
                    _ => lhs / rhs,
                })
            }
            CalcAst::Let => {
                let (Some(binding), Some(value), Some(body), 3) =
                    (node.child(0), node.child(1), node.child(2), node.child_count())
                else {
                    return Err(EvalError::MalformedTree(CalcAst::Let));
                };
                let name = self.node_text(&binding);
                let value = self.eval_node(&value, env)?;
                let mut inner = env.clone();
                inner.insert(name, value);
                self.eval_node(&body, &inner)
            }
        }
    }
}

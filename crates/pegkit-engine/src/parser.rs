//! Grammar values: the parser expression tree.

use crate::context::ParseContext;
use crate::defs::ParseDefs;
use crate::rule::RuleSlot;
use crate::skip::Skip;
use std::cmp::Ordering;
use std::fmt;
use std::rc::{Rc, Weak};
use std::sync::atomic::{AtomicU64, Ordering as AtomicOrdering};

static NEXT_MEMO_KEY: AtomicU64 = AtomicU64::new(1);

/// A composable grammar value.
///
/// Parsers are plain values: cloning one clones the expression tree, and a
/// grammar shared between parses never changes after construction. Larger
/// parsers are built from the primitive constructors ([`terminal`],
/// [`range`], [`one_of`], [`end`], [`any`], …) with the combinator methods
/// and operators:
///
/// | Syntax | Meaning |
/// |---|---|
/// | `a >> b` | sequence |
/// | <code>a &#124; b</code> | ordered choice |
/// | `a.zero_or_more()` | repeat 0+ |
/// | `a.one_or_more()` | repeat 1+ |
/// | `-a` / `a.opt()` | optional |
/// | `a.and_predicate()` | zero-width lookahead |
/// | `!a` | zero-width negative lookahead |
/// | `a - b` | difference: accept `a` where `b` would fail |
/// | `a.matched(id)` | record a match with `id` |
/// | `a.memoized()` | cache outcome per position |
/// | `a.labeled("name")` | emit trace events around `a` |
///
/// Sequences and choices flatten on construction, so `a >> b >> c` is one
/// three-element sequence rather than a nested pair.
pub struct Parser<D: ParseDefs> {
    pub(crate) kind: ParserKind<D>,
}

pub(crate) enum ParserKind<D: ParseDefs> {
    /// Accept one symbol equal to the stored one.
    Terminal(D::Symbol),
    /// Accept the stored symbols in order, all or nothing.
    TerminalSeq(Vec<D::Symbol>),
    /// Accept one symbol found in the stored sorted set.
    OneOf(Vec<D::Symbol>),
    /// Accept one symbol within `[min, max]` under the comparison policy.
    Range { min: D::Symbol, max: D::Symbol },
    /// Accept exactly at end of input, consuming nothing.
    End,
    /// Accept any one symbol.
    Any,
    /// Constant outcome, consuming nothing.
    Always(bool),
    /// Delegate to a user callable.
    Function(Rc<dyn Fn(&mut ParseContext<'_, D>) -> bool>),
    /// All children in order; restore on any failure.
    Sequence(Vec<Parser<D>>),
    /// First accepting child wins; restore between attempts.
    Choice(Vec<Parser<D>>),
    /// Repeat until failure or zero progress; always accepts.
    ZeroOrMore(Box<Parser<D>>),
    /// Like `ZeroOrMore` but the first repetition must accept.
    OneOrMore(Box<Parser<D>>),
    /// Try the child, restore on failure; always accepts.
    Optional(Box<Parser<D>>),
    /// Run the child, restore state, forward its outcome.
    AndPredicate(Box<Parser<D>>),
    /// Run the child, restore state, invert its outcome.
    NotPredicate(Box<Parser<D>>),
    /// Run the child; on acceptance record a match adopting the child's
    /// matches.
    Capture { inner: Box<Parser<D>>, id: D::MatchId },
    /// Non-owning reference to a rule.
    RuleRef(Weak<RuleSlot<D>>),
    /// Cache the child's outcome per position.
    Memoize { inner: Box<Parser<D>>, key: u64 },
    /// Record an error and skip per policy; never fails at a valid
    /// position.
    ErrorRecover { id: D::ErrorId, skip: Skip<D> },
    /// Record a stand-in match and skip per policy.
    ErrorMatch { id: D::MatchId, skip: Skip<D> },
    /// Unwind the given number of enclosing loops.
    LoopBreak(u32),
    /// Run the child; on acceptance move line accounting to the next line.
    Newline(Box<Parser<D>>),
    /// Transparent wrapper emitting trace events around the child.
    Labeled { inner: Box<Parser<D>>, label: String },
    /// Transparent wrapper for attaching debuggers; emits trace events.
    Debugged(Box<Parser<D>>),
}

impl<D: ParseDefs> Parser<D> {
    pub(crate) fn from_kind(kind: ParserKind<D>) -> Self {
        Self { kind }
    }

    // --- combinator methods ---

    /// Sequences `self` with `next`, flattening nested sequences.
    pub fn seq(self, next: Parser<D>) -> Parser<D> {
        let kind = match (self.kind, next.kind) {
            (ParserKind::Sequence(mut left), ParserKind::Sequence(right)) => {
                left.extend(right);
                ParserKind::Sequence(left)
            }
            (ParserKind::Sequence(mut left), other) => {
                left.push(Parser::from_kind(other));
                ParserKind::Sequence(left)
            }
            (left, ParserKind::Sequence(mut right)) => {
                right.insert(0, Parser::from_kind(left));
                ParserKind::Sequence(right)
            }
            (left, right) => {
                ParserKind::Sequence(vec![Parser::from_kind(left), Parser::from_kind(right)])
            }
        };
        Parser::from_kind(kind)
    }

    /// Ordered choice of `self` and `next`, flattening nested choices.
    pub fn or(self, next: Parser<D>) -> Parser<D> {
        let kind = match (self.kind, next.kind) {
            (ParserKind::Choice(mut left), ParserKind::Choice(right)) => {
                left.extend(right);
                ParserKind::Choice(left)
            }
            (ParserKind::Choice(mut left), other) => {
                left.push(Parser::from_kind(other));
                ParserKind::Choice(left)
            }
            (left, ParserKind::Choice(mut right)) => {
                right.insert(0, Parser::from_kind(left));
                ParserKind::Choice(right)
            }
            (left, right) => {
                ParserKind::Choice(vec![Parser::from_kind(left), Parser::from_kind(right)])
            }
        };
        Parser::from_kind(kind)
    }

    /// Repeats `self` zero or more times. Always accepts; an iteration
    /// that consumes nothing ends the loop.
    pub fn zero_or_more(self) -> Parser<D> {
        Parser::from_kind(ParserKind::ZeroOrMore(Box::new(self)))
    }

    /// Repeats `self` one or more times; the first repetition must accept.
    pub fn one_or_more(self) -> Parser<D> {
        Parser::from_kind(ParserKind::OneOrMore(Box::new(self)))
    }

    /// Makes `self` optional: failure is absorbed after restoring state.
    pub fn opt(self) -> Parser<D> {
        Parser::from_kind(ParserKind::Optional(Box::new(self)))
    }

    /// Zero-width lookahead: runs `self`, restores state, forwards the
    /// outcome.
    pub fn and_predicate(self) -> Parser<D> {
        Parser::from_kind(ParserKind::AndPredicate(Box::new(self)))
    }

    /// Zero-width negative lookahead: runs `self`, restores state,
    /// inverts the outcome.
    pub fn not_predicate(self) -> Parser<D> {
        Parser::from_kind(ParserKind::NotPredicate(Box::new(self)))
    }

    /// Records a match tagged `id` over whatever `self` consumes, adopting
    /// the matches `self` produced as children.
    pub fn matched(self, id: D::MatchId) -> Parser<D> {
        Parser::from_kind(ParserKind::Capture { inner: Box::new(self), id })
    }

    /// Memoizes `self`: each position is attempted at most once per parse.
    pub fn memoized(self) -> Parser<D> {
        let key = NEXT_MEMO_KEY.fetch_add(1, AtomicOrdering::Relaxed);
        Parser::from_kind(ParserKind::Memoize { inner: Box::new(self), key })
    }

    /// Wraps `self` with a label; entry and exit emit `tracing` events at
    /// trace level, indented by grammar depth. Transparent otherwise.
    pub fn labeled(self, label: impl Into<String>) -> Parser<D> {
        Parser::from_kind(ParserKind::Labeled { inner: Box::new(self), label: label.into() })
    }

    /// Transparent wrapper that emits trace events; a convenient place to
    /// set a breakpoint.
    pub fn debugged(self) -> Parser<D> {
        Parser::from_kind(ParserKind::Debugged(Box::new(self)))
    }
}

// --- primitive constructors ---

/// Accepts one symbol equal to `symbol` under the comparison policy.
pub fn terminal<D: ParseDefs>(symbol: D::Symbol) -> Parser<D> {
    Parser::from_kind(ParserKind::Terminal(symbol))
}

/// Accepts the given symbols in order; consumes nothing on mismatch.
///
/// # Panics
///
/// Asserts that the sequence is not empty.
pub fn terminal_seq<D: ParseDefs>(symbols: impl IntoIterator<Item = D::Symbol>) -> Parser<D> {
    let symbols: Vec<_> = symbols.into_iter().collect();
    assert!(!symbols.is_empty(), "terminal_seq: empty sequence");
    Parser::from_kind(ParserKind::TerminalSeq(symbols))
}

/// Accepts the characters of `text` in order. Character-source shorthand
/// for [`terminal_seq`].
pub fn text<D: ParseDefs<Symbol = char>>(text: &str) -> Parser<D> {
    terminal_seq::<D>(text.chars())
}

/// Accepts one symbol contained in `symbols`.
///
/// The set is sorted at construction and searched with binary search, so an
/// attempt costs `O(log n)` comparisons.
///
/// # Panics
///
/// Asserts that the set is not empty.
pub fn one_of<D: ParseDefs>(symbols: impl IntoIterator<Item = D::Symbol>) -> Parser<D> {
    let mut symbols: Vec<_> = symbols.into_iter().collect();
    assert!(!symbols.is_empty(), "one_of: empty set");
    symbols.sort_by(|a, b| D::compare(a, b));
    symbols.dedup_by(|a, b| D::compare(a, b) == Ordering::Equal);
    Parser::from_kind(ParserKind::OneOf(symbols))
}

/// Accepts one symbol with `min <= symbol <= max` under the comparison
/// policy.
///
/// # Panics
///
/// Asserts that `min <= max`; anything else is a grammar-construction bug.
pub fn range<D: ParseDefs>(min: D::Symbol, max: D::Symbol) -> Parser<D> {
    assert!(
        D::compare(&min, &max) != Ordering::Greater,
        "range: min {min:?} is greater than max {max:?}",
    );
    Parser::from_kind(ParserKind::Range { min, max })
}

/// Accepts exactly at end of input, consuming nothing.
pub fn end<D: ParseDefs>() -> Parser<D> {
    Parser::from_kind(ParserKind::End)
}

/// Accepts any one symbol.
pub fn any<D: ParseDefs>() -> Parser<D> {
    Parser::from_kind(ParserKind::Any)
}

/// Constant outcome without consuming input.
pub fn boolean<D: ParseDefs>(value: bool) -> Parser<D> {
    Parser::from_kind(ParserKind::Always(value))
}

/// A parser that always accepts at zero width.
pub fn always<D: ParseDefs>() -> Parser<D> {
    boolean(true)
}

/// A parser that always rejects.
pub fn never<D: ParseDefs>() -> Parser<D> {
    boolean(false)
}

/// Delegates to a user callable.
///
/// The callable reports acceptance with `true` and is expected to consume
/// whatever it accepted through the context; on `false` the engine restores
/// the context state itself, so a rejecting callable need not clean up.
pub fn function<D, F>(f: F) -> Parser<D>
where
    D: ParseDefs,
    F: Fn(&mut ParseContext<'_, D>) -> bool + 'static,
{
    Parser::from_kind(ParserKind::Function(Rc::new(f)))
}

/// Records an error tagged `id` without skipping input.
///
/// Equivalent to `error_with(id, skip_nothing())`; the recorded span is
/// widened to one symbol by the context.
pub fn error<D: ParseDefs>(id: D::ErrorId) -> Parser<D> {
    error_with(id, crate::skip::skip_nothing())
}

/// Records an error tagged `id`, advancing the cursor per `skip`.
///
/// The error spans from the cursor position on entry to the position the
/// skip policy stopped at. Accepts whenever a symbol was available.
pub fn error_with<D: ParseDefs>(id: D::ErrorId, skip: Skip<D>) -> Parser<D> {
    Parser::from_kind(ParserKind::ErrorRecover { id, skip })
}

/// Records a stand-in match tagged `id` without skipping input.
///
/// Where [`error`] reports, `error_match` repairs: the match keeps the
/// match tree well-formed when a token is missing. A zero-width stand-in
/// stays zero-width.
pub fn error_match<D: ParseDefs>(id: D::MatchId) -> Parser<D> {
    error_match_with(id, crate::skip::skip_nothing())
}

/// Records a stand-in match tagged `id`, advancing the cursor per `skip`.
pub fn error_match_with<D: ParseDefs>(id: D::MatchId, skip: Skip<D>) -> Parser<D> {
    Parser::from_kind(ParserKind::ErrorMatch { id, skip })
}

/// Unwinds `levels` enclosing loops; the loop it lands in stops iterating
/// and accepts.
///
/// # Panics
///
/// Asserts that `levels >= 1`.
pub fn loop_break<D: ParseDefs>(levels: u32) -> Parser<D> {
    assert!(levels >= 1, "loop_break: at least one level required");
    Parser::from_kind(ParserKind::LoopBreak(levels))
}

/// Runs `inner`; on acceptance moves line accounting to the next line.
///
/// Wrap the grammar's newline terminal with this so line/column positions
/// stay meaningful.
pub fn newline<D: ParseDefs>(inner: Parser<D>) -> Parser<D> {
    Parser::from_kind(ParserKind::Newline(Box::new(inner)))
}

impl<D: ParseDefs> Clone for Parser<D> {
    fn clone(&self) -> Self {
        let kind = match &self.kind {
            ParserKind::Terminal(s) => ParserKind::Terminal(s.clone()),
            ParserKind::TerminalSeq(s) => ParserKind::TerminalSeq(s.clone()),
            ParserKind::OneOf(s) => ParserKind::OneOf(s.clone()),
            ParserKind::Range { min, max } => {
                ParserKind::Range { min: min.clone(), max: max.clone() }
            }
            ParserKind::End => ParserKind::End,
            ParserKind::Any => ParserKind::Any,
            ParserKind::Always(v) => ParserKind::Always(*v),
            ParserKind::Function(f) => ParserKind::Function(Rc::clone(f)),
            ParserKind::Sequence(children) => ParserKind::Sequence(children.clone()),
            ParserKind::Choice(children) => ParserKind::Choice(children.clone()),
            ParserKind::ZeroOrMore(p) => ParserKind::ZeroOrMore(p.clone()),
            ParserKind::OneOrMore(p) => ParserKind::OneOrMore(p.clone()),
            ParserKind::Optional(p) => ParserKind::Optional(p.clone()),
            ParserKind::AndPredicate(p) => ParserKind::AndPredicate(p.clone()),
            ParserKind::NotPredicate(p) => ParserKind::NotPredicate(p.clone()),
            ParserKind::Capture { inner, id } => {
                ParserKind::Capture { inner: inner.clone(), id: *id }
            }
            ParserKind::RuleRef(slot) => ParserKind::RuleRef(Weak::clone(slot)),
            ParserKind::Memoize { inner, key } => {
                ParserKind::Memoize { inner: inner.clone(), key: *key }
            }
            ParserKind::ErrorRecover { id, skip } => {
                ParserKind::ErrorRecover { id: *id, skip: skip.clone() }
            }
            ParserKind::ErrorMatch { id, skip } => {
                ParserKind::ErrorMatch { id: *id, skip: skip.clone() }
            }
            ParserKind::LoopBreak(levels) => ParserKind::LoopBreak(*levels),
            ParserKind::Newline(p) => ParserKind::Newline(p.clone()),
            ParserKind::Labeled { inner, label } => {
                ParserKind::Labeled { inner: inner.clone(), label: label.clone() }
            }
            ParserKind::Debugged(p) => ParserKind::Debugged(p.clone()),
        };
        Parser::from_kind(kind)
    }
}

impl<D: ParseDefs> fmt::Debug for Parser<D> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.kind {
            ParserKind::Terminal(s) => f.debug_tuple("terminal").field(s).finish(),
            ParserKind::TerminalSeq(s) => f.debug_tuple("terminal_seq").field(s).finish(),
            ParserKind::OneOf(s) => f.debug_tuple("one_of").field(s).finish(),
            ParserKind::Range { min, max } => {
                f.debug_tuple("range").field(min).field(max).finish()
            }
            ParserKind::End => f.write_str("end"),
            ParserKind::Any => f.write_str("any"),
            ParserKind::Always(v) => f.debug_tuple("boolean").field(v).finish(),
            ParserKind::Function(_) => f.write_str("function"),
            ParserKind::Sequence(children) => f.debug_tuple("sequence").field(children).finish(),
            ParserKind::Choice(children) => f.debug_tuple("choice").field(children).finish(),
            ParserKind::ZeroOrMore(p) => f.debug_tuple("zero_or_more").field(p).finish(),
            ParserKind::OneOrMore(p) => f.debug_tuple("one_or_more").field(p).finish(),
            ParserKind::Optional(p) => f.debug_tuple("opt").field(p).finish(),
            ParserKind::AndPredicate(p) => f.debug_tuple("and_predicate").field(p).finish(),
            ParserKind::NotPredicate(p) => f.debug_tuple("not_predicate").field(p).finish(),
            ParserKind::Capture { inner, id } => {
                f.debug_struct("matched").field("id", id).field("inner", inner).finish()
            }
            ParserKind::RuleRef(slot) => match slot.upgrade() {
                Some(slot) => f.debug_tuple("rule").field(&slot.id()).finish(),
                None => f.write_str("rule(<dropped>)"),
            },
            ParserKind::Memoize { inner, .. } => f.debug_tuple("memoized").field(inner).finish(),
            ParserKind::ErrorRecover { id, skip } => {
                f.debug_struct("error").field("id", id).field("skip", skip).finish()
            }
            ParserKind::ErrorMatch { id, skip } => {
                f.debug_struct("error_match").field("id", id).field("skip", skip).finish()
            }
            ParserKind::LoopBreak(levels) => f.debug_tuple("loop_break").field(levels).finish(),
            ParserKind::Newline(p) => f.debug_tuple("newline").field(p).finish(),
            ParserKind::Labeled { inner, label } => {
                f.debug_struct("labeled").field("label", label).field("inner", inner).finish()
            }
            ParserKind::Debugged(p) => f.debug_tuple("debugged").field(p).finish(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::defs::CharDefs;

    #[derive(Debug, Clone, Copy, PartialEq, Eq)]
    enum M {
        X,
    }
    #[derive(Debug, Clone, Copy, PartialEq, Eq)]
    enum E {}

    type D = CharDefs<M, E>;

    fn child_count(parser: &Parser<D>) -> Option<usize> {
        match &parser.kind {
            ParserKind::Sequence(children) | ParserKind::Choice(children) => Some(children.len()),
            _ => None,
        }
    }

    #[test]
    fn sequences_flatten() {
        let p = terminal::<D>('a').seq(terminal('b')).seq(terminal('c')).seq(terminal('d'));
        assert_eq!(child_count(&p), Some(4));
    }

    #[test]
    fn choices_flatten() {
        let p = terminal::<D>('a').or(terminal('b')).or(terminal('c'));
        assert_eq!(child_count(&p), Some(3));
    }

    #[test]
    fn sequence_of_sequences_flattens_both_sides() {
        let left = terminal::<D>('a').seq(terminal('b'));
        let right = terminal::<D>('c').seq(terminal('d'));
        assert_eq!(child_count(&left.seq(right)), Some(4));
    }

    #[test]
    fn one_of_sorts_and_dedups() {
        let p = one_of::<D>("cabac".chars());
        match &p.kind {
            ParserKind::OneOf(set) => assert_eq!(set, &vec!['a', 'b', 'c']),
            _ => panic!("expected one_of, got {p:?}"),
        }
    }

    #[test]
    fn capture_wraps() {
        let p = terminal::<D>('a').matched(M::X);
        assert!(matches!(p.kind, ParserKind::Capture { .. }));
    }

    #[test]
    #[should_panic(expected = "range")]
    fn reversed_range_is_a_construction_error() {
        let _ = range::<D>('z', 'a');
    }

    #[test]
    #[should_panic(expected = "loop_break")]
    fn zero_level_loop_break_is_a_construction_error() {
        let _ = loop_break::<D>(0);
    }
}

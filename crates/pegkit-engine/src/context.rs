//! The mutable driver state threaded through a parse.

use crate::defs::ParseDefs;
use crate::outcome::Outcome;
use crate::rule::RuleId;
use pegkit_span::{Pos, Span};
use std::cmp::Ordering;
use std::collections::HashMap;
use std::fmt;

/// A recorded interval of accepted input, tagged with an id.
///
/// Matches form a tree: the context holds the top-level matches, and each
/// match owns the matches produced while parsing its own extent.
///
/// # Invariants
///
/// - every child's span lies inside its parent's span
/// - children appear in source order and never overlap
pub struct Match<D: ParseDefs> {
    id: D::MatchId,
    span: Span,
    children: Vec<Match<D>>,
}

impl<D: ParseDefs> Match<D> {
    pub(crate) fn new(id: D::MatchId, span: Span, children: Vec<Match<D>>) -> Self {
        Self { id, span, children }
    }

    /// The id the grammar tagged this match with.
    #[inline]
    pub fn id(&self) -> D::MatchId {
        self.id
    }

    /// The covered source range.
    #[inline]
    pub fn span(&self) -> Span {
        self.span
    }

    /// Child matches, in source order.
    #[inline]
    pub fn children(&self) -> &[Match<D>] {
        &self.children
    }

    /// Borrows the source slice this match covers.
    #[inline]
    pub fn source<'a>(&self, source: &'a [D::Symbol]) -> &'a [D::Symbol] {
        self.span.slice(source)
    }

    /// Visits this match and its children depth-first.
    ///
    /// The visitor receives each match together with its tree depth.
    pub fn visit<V: FnMut(&Match<D>, usize)>(&self, visitor: &mut V) {
        self.visit_at(visitor, 0);
    }

    fn visit_at<V: FnMut(&Match<D>, usize)>(&self, visitor: &mut V, depth: usize) {
        visitor(self, depth);
        for child in &self.children {
            child.visit_at(visitor, depth + 1);
        }
    }
}

impl<D: ParseDefs> Clone for Match<D> {
    fn clone(&self) -> Self {
        Self { id: self.id, span: self.span, children: self.children.clone() }
    }
}

impl<D: ParseDefs> fmt::Debug for Match<D> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Match")
            .field("id", &self.id)
            .field("span", &self.span)
            .field("children", &self.children)
            .finish()
    }
}

/// A recorded error, tagged with an id.
///
/// Errors are a flat sequence in discovery order; they never nest.
pub struct ErrorRecord<D: ParseDefs> {
    id: D::ErrorId,
    span: Span,
}

impl<D: ParseDefs> ErrorRecord<D> {
    /// The id the grammar tagged this error with.
    #[inline]
    pub fn id(&self) -> D::ErrorId {
        self.id
    }

    /// The covered source range; never empty (see
    /// [`ParseContext::add_error`]).
    #[inline]
    pub fn span(&self) -> Span {
        self.span
    }
}

impl<D: ParseDefs> Clone for ErrorRecord<D> {
    fn clone(&self) -> Self {
        Self { id: self.id, span: self.span }
    }
}

impl<D: ParseDefs> Copy for ErrorRecord<D> {}

impl<D: ParseDefs> fmt::Debug for ErrorRecord<D> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ErrorRecord").field("id", &self.id).field("span", &self.span).finish()
    }
}

/// A rollback point.
///
/// Restoring a state moves the cursor back and truncates the match vector
/// to the snapshotted size, so matches a failed alternative produced
/// vanish. Errors are *not* truncated: the error list is an append-only
/// log, so a diagnostic recorded by a recovery combinator survives even
/// when an enclosing alternative later fails (skip-policy probing, which
/// must be entirely side-effect free, discards probe errors explicitly).
/// Rule-recursion records are not part of the snapshot either: their
/// pushes and pops are strictly paired on every path, including failure
/// paths.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct State {
    pos: Pos,
    match_count: usize,
    error_count: usize,
}

impl State {
    /// The snapshotted cursor position.
    #[inline]
    pub fn pos(&self) -> Pos {
        self.pos
    }

    /// Number of matches held by the context at snapshot time.
    #[inline]
    pub fn match_count(&self) -> usize {
        self.match_count
    }

    /// Number of errors held by the context at snapshot time.
    #[inline]
    pub fn error_count(&self) -> usize {
        self.error_count
    }
}

/// Left-recursion phase of an active rule invocation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum LrPhase {
    /// Ordinary descent; re-entry at the same position signals recursion.
    Normal,
    /// Seed phase: re-entry at the same position rejects, so the
    /// non-recursive alternatives get to establish a seed.
    Reject,
    /// Grow phase: re-entry at the same position accepts at zero width,
    /// standing in for the input already accumulated.
    Accept,
}

#[derive(Debug, Clone, Copy)]
struct RuleFrame {
    index: usize,
    phase: LrPhase,
}

/// Memoized result of running a parser at a position.
pub(crate) struct MemoEntry<D: ParseDefs> {
    pub(crate) outcome: Outcome,
    pub(crate) end: Pos,
    pub(crate) matches: Vec<Match<D>>,
    pub(crate) errors: Vec<ErrorRecord<D>>,
}

/// The mutable driver state of one parse.
///
/// A context owns the cursor, the accumulated matches and errors, the
/// per-rule recursion records, and the memoization table. It is created
/// over a borrowed symbol slice, driven by [`Parser::parse`]
/// (crate::Parser::parse), and consumed for its matches and errors when the
/// parse finishes.
///
/// A context must not be shared between threads mid-parse; grammars, on the
/// other hand, are immutable after construction and can drive any number of
/// contexts.
pub struct ParseContext<'s, D: ParseDefs> {
    source: &'s [D::Symbol],
    pos: Pos,
    matches: Vec<Match<D>>,
    errors: Vec<ErrorRecord<D>>,
    rules: HashMap<RuleId, Vec<RuleFrame>>,
    memo: HashMap<(u64, usize), MemoEntry<D>>,
    lr_resolutions: u32,
    recursion_unresolvable: bool,
    trace_depth: usize,
}

impl<'s, D: ParseDefs> ParseContext<'s, D> {
    /// Creates a context at the start of `source`.
    pub fn new(source: &'s [D::Symbol]) -> Self {
        Self {
            source,
            pos: Pos::start(),
            matches: Vec::new(),
            errors: Vec::new(),
            rules: HashMap::new(),
            memo: HashMap::new(),
            lr_resolutions: 0,
            recursion_unresolvable: false,
            trace_depth: 0,
        }
    }

    /// The source this context parses.
    #[inline]
    pub fn source(&self) -> &'s [D::Symbol] {
        self.source
    }

    /// The current cursor position.
    #[inline]
    pub fn pos(&self) -> Pos {
        self.pos
    }

    /// True if a symbol is available at the cursor.
    #[inline]
    pub fn is_valid(&self) -> bool {
        self.pos.index < self.source.len()
    }

    /// True if the cursor is at the end of input.
    #[inline]
    pub fn is_end(&self) -> bool {
        self.pos.index >= self.source.len()
    }

    /// The symbol at the cursor, if any.
    #[inline]
    pub fn symbol(&self) -> Option<&'s D::Symbol> {
        self.source.get(self.pos.index)
    }

    /// Moves the cursor forward one symbol, advancing the column.
    #[inline]
    pub fn advance(&mut self) {
        self.pos.advance(1);
    }

    /// Moves the cursor forward `n` symbols, advancing the column.
    #[inline]
    pub fn advance_by(&mut self, n: usize) {
        self.pos.advance(n);
    }

    /// Moves the text coordinates to the start of the next line.
    ///
    /// Driven by the [`newline`](crate::newline) wrapper; the cursor index
    /// is unaffected.
    #[inline]
    pub fn advance_line(&mut self) {
        self.pos.advance_line();
    }

    /// Moves the cursor to an arbitrary position.
    ///
    /// Used by skip policies, which probe ahead and then place the cursor
    /// without keeping any other effects.
    #[inline]
    pub fn set_pos(&mut self, pos: Pos) {
        self.pos = pos;
    }

    /// Compares two symbols under this context's definition bundle.
    #[inline]
    pub fn compare(&self, a: &D::Symbol, b: &D::Symbol) -> Ordering {
        D::compare(a, b)
    }

    // --- state snapshot / rollback ---

    /// Captures a rollback point.
    #[inline]
    pub fn state(&self) -> State {
        State { pos: self.pos, match_count: self.matches.len(), error_count: self.errors.len() }
    }

    /// Restores a rollback point captured by [`state`](Self::state).
    ///
    /// Matches recorded after the snapshot are dropped; recorded errors
    /// stay (see [`State`]).
    pub fn set_state(&mut self, state: State) {
        self.pos = state.pos;
        self.matches.truncate(state.match_count);
    }

    /// Drops errors past `len`. Reserved for skip-policy probing, which
    /// must leave no side effects at all.
    pub(crate) fn truncate_errors(&mut self, len: usize) {
        self.errors.truncate(len);
    }

    // --- matches ---

    /// The top-level matches recorded so far.
    #[inline]
    pub fn matches(&self) -> &[Match<D>] {
        &self.matches
    }

    /// Takes ownership of the recorded matches.
    #[inline]
    pub fn take_matches(&mut self) -> Vec<Match<D>> {
        std::mem::take(&mut self.matches)
    }

    /// Records a match spanning `[begin, end)`.
    ///
    /// Matches from index `first_child` to the end of the match vector are
    /// detached and become the new match's children, preserving their
    /// order. This keeps the vector flat: a match adopts exactly the
    /// matches produced while parsing its own extent.
    pub fn add_match(&mut self, id: D::MatchId, begin: Pos, end: Pos, first_child: usize) {
        debug_assert!(begin.index <= end.index);
        debug_assert!(first_child <= self.matches.len());
        let children = self.matches.split_off(first_child.min(self.matches.len()));
        self.matches.push(Match::new(id, Span::new(begin, end), children));
    }

    // --- errors ---

    /// The errors recorded so far, in discovery order.
    #[inline]
    pub fn errors(&self) -> &[ErrorRecord<D>] {
        &self.errors
    }

    /// Takes ownership of the recorded errors.
    #[inline]
    pub fn take_errors(&mut self) -> Vec<ErrorRecord<D>> {
        std::mem::take(&mut self.errors)
    }

    /// Records an error spanning `[begin, end)`.
    ///
    /// A zero-width span is widened to cover one symbol (when one exists),
    /// so every reported error has visible extent.
    pub fn add_error(&mut self, id: D::ErrorId, begin: Pos, mut end: Pos) {
        debug_assert!(begin.index <= end.index);
        if begin.index == end.index && begin.index < self.source.len() {
            end.advance(1);
        }
        self.errors.push(ErrorRecord { id, span: Span::new(begin, end) });
    }

    // --- rule recursion bookkeeping ---

    /// Registers that `rule` starts parsing at `pos`.
    ///
    /// Returns `false`, without registering, when `pos` equals the
    /// position the rule most recently registered: the rule is re-entering
    /// itself without having consumed anything, which is left recursion.
    pub fn register_rule_position(&mut self, rule: RuleId, pos: Pos) -> bool {
        let stack = self.rules.entry(rule).or_default();
        if stack.last().is_some_and(|frame| frame.index == pos.index) {
            return false;
        }
        stack.push(RuleFrame { index: pos.index, phase: LrPhase::Normal });
        true
    }

    /// Removes the most recent registration for `rule`.
    pub fn unregister_rule_position(&mut self, rule: RuleId) {
        self.pop_rule_frame(rule);
    }

    pub(crate) fn push_rule_frame(&mut self, rule: RuleId, index: usize, phase: LrPhase) {
        self.rules.entry(rule).or_default().push(RuleFrame { index, phase });
    }

    pub(crate) fn pop_rule_frame(&mut self, rule: RuleId) {
        let empty = {
            let Some(stack) = self.rules.get_mut(&rule) else {
                debug_assert!(false, "pop without push for {rule:?}");
                return;
            };
            stack.pop();
            stack.is_empty()
        };
        if empty {
            self.rules.remove(&rule);
        }
    }

    /// The phase of `rule` if its most recent registration is at `index`.
    pub(crate) fn active_rule_phase(&self, rule: RuleId, index: usize) -> Option<LrPhase> {
        self.rules
            .get(&rule)
            .and_then(|stack| stack.last())
            .filter(|frame| frame.index == index)
            .map(|frame| frame.phase)
    }

    /// True when no rule is currently registered.
    ///
    /// Holds on entry and exit of a top-level parse.
    pub fn no_active_rules(&self) -> bool {
        self.rules.is_empty()
    }

    // --- left-recursion resolution bookkeeping ---

    /// Marks the in-flight left-recursion signal as unresolvable.
    ///
    /// Set when a signal crosses a whole rule invocation without being
    /// claimed, meaning recursion through more than one rule. Once set, no outer
    /// invocation may claim the signal; it runs out to the top of the
    /// parse, which reports the fatal failure.
    pub(crate) fn mark_recursion_unresolvable(&mut self) {
        self.recursion_unresolvable = true;
    }

    pub(crate) fn recursion_unresolvable(&self) -> bool {
        self.recursion_unresolvable
    }

    pub(crate) fn begin_lr_resolution(&mut self) {
        self.lr_resolutions += 1;
    }

    pub(crate) fn end_lr_resolution(&mut self) {
        debug_assert!(self.lr_resolutions > 0);
        self.lr_resolutions = self.lr_resolutions.saturating_sub(1);
    }

    pub(crate) fn lr_resolution_active(&self) -> bool {
        self.lr_resolutions > 0
    }

    // --- memoization table ---

    pub(crate) fn memo_get(&self, key: u64, index: usize) -> Option<&MemoEntry<D>> {
        self.memo.get(&(key, index))
    }

    pub(crate) fn memo_put(&mut self, key: u64, index: usize, entry: MemoEntry<D>) {
        self.memo.insert((key, index), entry);
    }

    /// Applies a memoized result: cursor to the recorded end, recorded
    /// matches and errors appended.
    pub(crate) fn replay_memo(
        &mut self,
        end: Pos,
        matches: Vec<Match<D>>,
        errors: Vec<ErrorRecord<D>>,
    ) {
        self.pos = end;
        self.matches.extend(matches);
        self.errors.extend(errors);
    }

    // --- trace indentation ---

    pub(crate) fn enter_trace(&mut self) -> usize {
        let depth = self.trace_depth;
        self.trace_depth += 1;
        depth
    }

    pub(crate) fn exit_trace(&mut self) {
        self.trace_depth = self.trace_depth.saturating_sub(1);
    }
}

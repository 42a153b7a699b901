//! Property tests for the engine's universal invariants.

use pegkit_engine::{
    CharDefs, Match, Outcome, ParseContext, Parser, Span, one_of, parse, range, terminal, text,
};
use proptest::prelude::*;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum M {
    A,
    B,
    C,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum E {}

type D = CharDefs<M, E>;

/// A small pool of structurally varied grammars to sample from.
fn grammar(index: usize) -> Parser<D> {
    let word = || range::<D>('a', 'z').one_or_more().matched(M::A);
    let digits = || range::<D>('0', '9').one_or_more().matched(M::B);
    match index % 6 {
        0 => word() >> terminal(',') >> digits(),
        1 => (word() | digits()).zero_or_more().matched(M::C),
        2 => text::<D>("ab").matched(M::A) | text("a").matched(M::B),
        3 => ((word() >> terminal('=')) | digits()).one_or_more(),
        4 => (one_of::<D>("xyz".chars()).matched(M::A) - terminal('z')).zero_or_more(),
        5 => (!terminal::<D>('q') >> range('a', 'z')).one_or_more().matched(M::C),
        _ => unreachable!(),
    }
}

fn check_tree_invariants(m: &Match<D>) {
    let span = m.span();
    let mut last_end = span.begin.index;
    for child in m.children() {
        let child_span: Span = child.span();
        // Children lie inside the parent.
        assert!(
            span.contains_span(child_span) || child_span.is_empty(),
            "child {child_span} outside parent {span}"
        );
        // Children are ordered and never overlap.
        assert!(
            child_span.begin.index >= last_end,
            "child at {child_span} overlaps previous sibling"
        );
        last_end = child_span.end.index;
        check_tree_invariants(child);
    }
}

proptest! {
    /// Rejection restores the observable context state.
    #[test]
    fn rejection_restores_state(input in "[a-z0-9,=]{0,12}", g in 0usize..6) {
        let source: Vec<char> = input.chars().collect();
        let parser = grammar(g);
        let mut ctx = ParseContext::<D>::new(&source);
        let before = ctx.state();
        let outcome = parser.parse(&mut ctx);
        if outcome == Outcome::Rejected {
            prop_assert_eq!(ctx.state(), before);
            prop_assert_eq!(ctx.matches().len(), 0);
        }
    }

    /// Top-level match begin positions never decrease.
    #[test]
    fn match_begins_are_sorted(input in "[a-z0-9,=xyzq]{0,16}", g in 0usize..6) {
        let source: Vec<char> = input.chars().collect();
        let output = parse(&source, &grammar(g)).unwrap();
        let begins: Vec<_> = output.matches.iter().map(|m| m.span().begin.index).collect();
        let mut sorted = begins.clone();
        sorted.sort_unstable();
        prop_assert_eq!(begins, sorted);
    }

    /// Every match tree satisfies the containment and ordering invariants.
    #[test]
    fn match_trees_are_well_formed(input in "[a-z0-9,=xyzq]{0,16}", g in 0usize..6) {
        let source: Vec<char> = input.chars().collect();
        let output = parse(&source, &grammar(g)).unwrap();
        for m in &output.matches {
            check_tree_invariants(m);
        }
    }

    /// A memoized grammar accepts exactly the same inputs with the same
    /// consumed length as its plain form.
    #[test]
    fn memoization_preserves_outcome(input in "[a-z0-9,=]{0,12}", g in 0usize..6) {
        let source: Vec<char> = input.chars().collect();
        let plain = parse(&source, &grammar(g)).unwrap();
        let memo = parse(&source, &grammar(g).memoized()).unwrap();
        prop_assert_eq!(plain.accepted, memo.accepted);
        prop_assert_eq!(plain.end.index, memo.end.index);
        prop_assert_eq!(plain.matches.len(), memo.matches.len());
    }

    /// Ordered choice commits to the first accepting branch.
    #[test]
    fn choice_is_ordered(input in "[ab]{0,6}") {
        let source: Vec<char> = input.chars().collect();
        let first = text::<D>("ab").matched(M::A) | text("a").matched(M::B);
        let output = parse(&source, &first).unwrap();
        if input.starts_with("ab") {
            prop_assert_eq!(output.matches[0].id(), M::A);
        } else if input.starts_with('a') {
            prop_assert_eq!(output.matches[0].id(), M::B);
        } else {
            prop_assert!(!output.accepted);
        }
    }

    /// Loops always terminate, even on inputs they accept nothing of.
    #[test]
    fn loops_terminate(input in "[a-z]{0,10}") {
        let source: Vec<char> = input.chars().collect();
        let p = (!terminal::<D>('\u{0}')).zero_or_more(); // zero-width accept forever
        let output = parse(&source, &p).unwrap();
        prop_assert!(output.accepted);
        prop_assert_eq!(output.end.index, 0);
    }
}

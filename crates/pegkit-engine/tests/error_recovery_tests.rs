//! Error combinators, skip policies, and recovery behavior.

use pegkit_engine::{
    CaseInsensitiveCharDefs, CharDefs, ParseContext, Parser, error, error_match,
    error_match_with, error_with, one_of, parse, range, skip_count, skip_current, skip_nothing,
    skip_until, skip_until_after, skip_while, terminal, text,
};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum M {
    A,
    B,
    Missing,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum E {
    E1,
}

type D = CharDefs<M, E>;

fn chars(s: &str) -> Vec<char> {
    s.chars().collect()
}

#[test]
fn error_with_skip_until_recovers_and_succeeds() {
    // 'a' >> ('b' | error(E1, skip_until(';'))) >> ';'  over "a;"
    let p = terminal::<D>('a')
        >> (terminal('b') | error_with(E::E1, skip_until(terminal(';'))))
        >> terminal(';');

    let source = chars("a;");
    let output = parse(&source, &p).unwrap();
    assert!(output.success());
    assert_eq!(output.end.index, 2);

    assert_eq!(output.errors.len(), 1);
    let err = output.errors[0];
    assert_eq!(err.id(), E::E1);
    // skip_until stopped right at the ';', so the zero-width error was
    // widened to cover exactly the symbol at index 1.
    assert_eq!(err.span().begin.index, 1);
    assert_eq!(err.span().end.index, 2);
}

#[test]
fn error_with_skip_until_after_consumes_the_anchor() {
    // Same grammar with skip_until_after: the recovery swallows the ';',
    // the trailing ';' terminal then fails, and the parse rejects.
    let p = terminal::<D>('a')
        >> (terminal('b') | error_with(E::E1, skip_until_after(terminal(';'))))
        >> terminal(';');

    let source = chars("a;");
    let output = parse(&source, &p).unwrap();
    assert!(!output.accepted);
    assert!(!output.success());

    // The diagnostic survives the rejected sequence: errors are a log,
    // and this one covers from the missing token to the end of input.
    assert_eq!(output.errors.len(), 1);
    assert_eq!(output.errors[0].id(), E::E1);
    assert_eq!(output.errors[0].span().begin.index, 1);
    assert_eq!(output.errors[0].span().end.index, 2);

    // The rejected sequence still rolled the cursor back.
    assert_eq!(output.end.index, 0);
}

#[test]
fn error_match_stands_in_for_a_missing_token() {
    // a ->* A >> (b ->* B | error_match(Missing)) >> ';'  over "a;"
    let p = terminal::<D>('a').matched(M::A)
        >> (terminal('b').matched(M::B) | error_match(M::Missing))
        >> terminal(';');

    let source = chars("a;");
    let output = parse(&source, &p).unwrap();
    assert!(output.success());
    assert!(output.errors.is_empty());

    assert_eq!(output.matches.len(), 2);
    assert_eq!(output.matches[0].id(), M::A);
    assert_eq!(output.matches[0].span().to_text(&source), "a");

    // The stand-in match is zero-width at the point of the missing token.
    let missing = &output.matches[1];
    assert_eq!(missing.id(), M::Missing);
    assert!(missing.span().is_empty());
    assert_eq!(missing.span().begin.index, 1);
}

#[test]
fn error_match_with_skip_covers_the_skipped_range() {
    let p = error_match_with::<D>(M::Missing, skip_count(2));
    let source = chars("xyz");
    let output = parse(&source, &p).unwrap();
    assert_eq!(output.matches.len(), 1);
    assert_eq!(output.matches[0].span().begin.index, 0);
    assert_eq!(output.matches[0].span().end.index, 2);
    assert_eq!(output.end.index, 2);
}

#[test]
fn bare_error_skips_nothing_and_is_widened() {
    let p = error::<D>(E::E1) >> terminal('x');
    let source = chars("x");
    let output = parse(&source, &p).unwrap();
    assert!(output.success());
    assert_eq!(output.errors.len(), 1);
    // Recorded at zero width, widened to one symbol.
    assert_eq!(output.errors[0].span().begin.index, 0);
    assert_eq!(output.errors[0].span().end.index, 1);
}

#[test]
fn error_combinators_reject_at_end_of_input() {
    let source = chars("");
    for parser in [
        error::<D>(E::E1),
        error_with(E::E1, skip_count(3)),
        error_match_with(M::Missing, skip_nothing()),
    ] {
        let output = parse(&source, &parser).unwrap();
        assert!(!output.accepted);
        assert!(output.errors.is_empty());
        assert!(output.matches.is_empty());
    }
}

#[test]
fn skip_until_stops_before_the_probe_match() {
    let p = error_with::<D>(E::E1, skip_until(text("end")));
    let source = chars("abcend!");
    let output = parse(&source, &p).unwrap();
    assert_eq!(output.end.index, 3);
    assert_eq!(output.errors[0].span().end.index, 3);
}

#[test]
fn skip_until_runs_to_end_when_probe_never_matches() {
    let p = error_with::<D>(E::E1, skip_until(terminal(';')));
    let source = chars("abc");
    let output = parse(&source, &p).unwrap();
    assert_eq!(output.end.index, 3);
    assert_eq!(output.errors[0].span().end.index, 3);
}

#[test]
fn skip_until_after_stops_past_the_probe_match() {
    let p = error_with::<D>(E::E1, skip_until_after(text("end")));
    let source = chars("abcend!");
    let output = parse(&source, &p).unwrap();
    assert_eq!(output.end.index, 6);
}

#[test]
fn skip_while_advances_over_accepted_symbols() {
    let p = error_with::<D>(E::E1, skip_while(one_of(" \t".chars())));
    let source = chars("   x");
    let output = parse(&source, &p).unwrap();
    assert_eq!(output.end.index, 3);
    assert_eq!(output.errors[0].span().end.index, 3);
}

#[test]
fn skip_count_is_bounded_by_input() {
    let p = error_with::<D>(E::E1, skip_count(10));
    let source = chars("ab");
    let output = parse(&source, &p).unwrap();
    assert_eq!(output.end.index, 2);

    let p = error_with::<D>(E::E1, skip_current());
    let source = chars("ab");
    let output = parse(&source, &p).unwrap();
    assert_eq!(output.end.index, 1);
}

#[test]
fn skip_probing_leaves_no_side_effects() {
    // The probe records a match when it accepts; skipping must discard it.
    let probe = terminal::<D>(';').matched(M::B);
    let p = error_with::<D>(E::E1, skip_until(probe));
    let source = chars("ab;");
    let output = parse(&source, &p).unwrap();
    assert!(output.matches.is_empty());
    assert_eq!(output.errors.len(), 1);
    assert_eq!(output.end.index, 2);
}

#[test]
fn recovery_inside_a_loop_reports_every_error() {
    // item = letter | error(E1, skip one); list = item* ;
    let item = range::<D>('a', 'z').matched(M::A) | error_with(E::E1, skip_current());
    let p = item.zero_or_more();
    let source = chars("a1b2");
    let output = parse(&source, &p).unwrap();
    assert!(output.success());
    assert_eq!(output.matches.len(), 2);
    assert_eq!(output.errors.len(), 2);
    assert_eq!(output.errors[0].span().begin.index, 1);
    assert_eq!(output.errors[1].span().begin.index, 3);
}

#[test]
fn case_insensitive_terminal_sequence() {
    #[derive(Debug, Clone, Copy, PartialEq, Eq)]
    enum N {}
    type CI = CaseInsensitiveCharDefs<N, E>;

    let p: Parser<CI> = text("ABC");
    for input in ["abc", "AbC", "ABC"] {
        let source = chars(input);
        let mut ctx = ParseContext::<CI>::new(&source);
        assert!(p.parse(&mut ctx).is_accepted(), "should accept {input:?}");
        assert!(ctx.is_end());
    }

    let source = chars("abd");
    let mut ctx = ParseContext::<CI>::new(&source);
    assert!(p.parse(&mut ctx).is_rejected());
    assert_eq!(ctx.pos().index, 0);
}

#[test]
fn case_insensitive_range_and_set() {
    #[derive(Debug, Clone, Copy, PartialEq, Eq)]
    enum N {}
    type CI = CaseInsensitiveCharDefs<N, E>;

    let letter: Parser<CI> = range('a', 'z');
    let source = chars("Q");
    let mut ctx = ParseContext::<CI>::new(&source);
    assert!(letter.parse(&mut ctx).is_accepted());

    let vowel: Parser<CI> = one_of("aeiou".chars());
    let source = chars("E");
    let mut ctx = ParseContext::<CI>::new(&source);
    assert!(vowel.parse(&mut ctx).is_accepted());
}

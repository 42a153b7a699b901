//! Left-recursive calculator, evaluated over the match tree.
//!
//! ```sh
//! cargo run --example calculator -- "1+2*(3+4)"
//! RUST_LOG=trace cargo run --example calculator -- "1+2"   # with grammar tracing
//! ```

use pegkit_engine::{CharDefs, Match, Rule, parse, range, terminal};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum CalcMatch {
    Num,
    Add,
    Sub,
    Mul,
    Div,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum CalcError {}

type Calc = CharDefs<CalcMatch, CalcError>;

fn eval(m: &Match<Calc>, source: &[char]) -> f64 {
    let child = |i: usize| eval(&m.children()[i], source);
    match m.id() {
        CalcMatch::Num => m.span().to_text(source).parse().unwrap_or(f64::NAN),
        CalcMatch::Add => child(0) + child(1),
        CalcMatch::Sub => child(0) - child(1),
        CalcMatch::Mul => child(0) * child(1),
        CalcMatch::Div => child(0) / child(1),
    }
}

fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("warn")),
        )
        .init();

    let input = std::env::args().nth(1).unwrap_or_else(|| "1+2*3".to_string());
    let source: Vec<char> = input.chars().collect();

    let add = Rule::named("add");
    let mul = Rule::named("mul");
    let digit = range::<Calc>('0', '9');
    let num = (digit.clone().one_or_more() >> (terminal('.') >> digit.one_or_more()).opt())
        .matched(CalcMatch::Num)
        .labeled("num");
    let val = num | (terminal::<Calc>('(') >> add.parser() >> terminal(')')).labeled("group");

    mul.define(
        (mul.parser() >> terminal('*') >> val.clone()).matched(CalcMatch::Mul)
            | (mul.parser() >> terminal('/') >> val.clone()).matched(CalcMatch::Div)
            | val,
    );
    add.define(
        (add.parser() >> terminal('+') >> mul.parser()).matched(CalcMatch::Add)
            | (add.parser() >> terminal('-') >> mul.parser()).matched(CalcMatch::Sub)
            | mul.parser(),
    );

    match parse(&source, &add.parser()) {
        Ok(output) if output.is_clean() => {
            output.matches[0].visit(&mut |m, depth| {
                println!("{:indent$}{:?} `{}`", "", m.id(), m.span().to_text(&source), indent = depth * 2);
            });
            println!("= {}", eval(&output.matches[0], &source));
        }
        Ok(output) => {
            eprintln!("stopped at index {} of {}", output.end.index, source.len());
            std::process::exit(1);
        }
        Err(failure) => {
            eprintln!("fatal: {failure}");
            std::process::exit(1);
        }
    }
}

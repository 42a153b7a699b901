//! Evaluate `calc` programs from the command line.
//!
//! ```sh
//! cargo run -p pegkit --example calc_repl -- "let x = 2 in x*(3+4)-1"
//! ```

use pegkit::calc;
use std::io::{BufRead, Write as _};

fn run_line(line: &str) {
    match calc::compile(line) {
        Ok(program) => {
            for err in &program.lex_errors {
                let what = err.span().to_text(&program.source);
                eprintln!("lex error at {}: unexpected `{what}`", err.span().begin);
            }
            for err in &program.syntax_errors {
                eprintln!("syntax error: {:?}", err.id());
            }
            match program.eval() {
                Ok(value) => println!("= {value}"),
                Err(err) => eprintln!("eval error: {err}"),
            }
        }
        Err(failure) => eprintln!("fatal: {failure}"),
    }
}

fn main() {
    let args: Vec<String> = std::env::args().skip(1).collect();
    if !args.is_empty() {
        run_line(&args.join(" "));
        return;
    }

    let stdin = std::io::stdin();
    let mut stdout = std::io::stdout();
    loop {
        print!("calc> ");
        let _ = stdout.flush();
        let mut line = String::new();
        match stdin.lock().read_line(&mut line) {
            Ok(0) | Err(_) => break,
            Ok(_) => {
                let line = line.trim();
                if line.is_empty() || line == "exit" {
                    break;
                }
                run_line(line);
            }
        }
    }
}

//! Demonstration driver.
//!
//! With one argument, parses it as an arithmetic expression with the
//! built-in grammar and prints the state sets, the full-parse item, its
//! top-level subcomponents (right to left, with any alternatives), and the
//! derivation tree. With two arguments, loads a JSON grammar file and parses
//! the second argument against it.

use std::env;
use std::process::ExitCode;
use std::time::Instant;

use earley_chart::calc;
use earley_chart::display::{ItemDisplay, StateSetDisplay};
use earley_chart::earley;
use earley_chart::grammar::{Grammar, Symbol};
use earley_chart::grammar_json;
use earley_chart::parse_tree::build_parse_tree;

/// Upper bound on Earley items per parse. Generous for interactive use; the
/// reservation is only committed as items are actually added.
const ITEM_CAPACITY: usize = 1 << 22;

fn main() -> ExitCode {
    let args: Vec<String> = env::args().collect();
    match args.len() {
        2 => run_calc(&args[1]),
        3 => run_json(&args[1], &args[2]),
        _ => {
            let program = args.first().map(String::as_str).unwrap_or("earley-chart");
            eprintln!("Usage: {} <expression>", program);
            eprintln!("       {} <grammar.json> <input>", program);
            ExitCode::FAILURE
        }
    }
}

fn run_calc(input: &str) -> ExitCode {
    let rules = calc::rules();
    let grammar = Grammar::new(&rules);

    let start_time = Instant::now();
    let state_sets = match earley::parse(&grammar, calc::START, ITEM_CAPACITY, input.chars()) {
        Ok(state_sets) => state_sets,
        Err(err) => {
            eprintln!("Error: {}", err);
            return ExitCode::FAILURE;
        }
    };
    eprintln!("Recognizer time: {:?}", start_time.elapsed());

    eprintln!("\nState sets after parsing terminates:");
    for (num, state_set) in state_sets.iter_segments().enumerate() {
        eprintln!("S({}):", num);
        eprintln!(
            "{}",
            StateSetDisplay {
                rules: &rules,
                state_set
            }
        );
    }

    let input_len = input.chars().count();
    let Some(full_parse) = earley::find_full_parse(&rules, calc::START, &state_sets, input_len)
    else {
        eprintln!("Error: parse failed");
        return ExitCode::FAILURE;
    };
    let root = state_sets.segment(full_parse.state_set)[full_parse.item];
    eprintln!(
        "Full parse: {}",
        ItemDisplay {
            rules: &rules,
            item: &root
        }
    );

    // Walk the root item's subcomponents right to left, reporting each one
    // and any alternative completed items in the same state set.
    let root_rule = grammar.rule(root.rule_idx);
    let mut cursor = full_parse.state_set;
    for &comp_sym in root_rule.rhs.iter().rev() {
        if comp_sym.is_terminal() {
            eprintln!("Subcomponent parse: {}", comp_sym);
            earley::advance_from_terminal(&mut cursor);
        } else {
            let state_set = state_sets.segment(cursor);
            let Some(found) = earley::find_completed_item(&rules, state_set, 0, comp_sym) else {
                eprintln!("Error: no completed {} item in S({})", comp_sym, cursor);
                return ExitCode::FAILURE;
            };
            eprintln!(
                "Subcomponent parse: {}",
                ItemDisplay {
                    rules: &rules,
                    item: &state_set[found]
                }
            );
            let mut alt = found + 1;
            while let Some(next) = earley::find_completed_item(&rules, state_set, alt, comp_sym) {
                eprintln!(
                    "  Alternative subcomponent parse: {}",
                    ItemDisplay {
                        rules: &rules,
                        item: &state_set[next]
                    }
                );
                alt = next + 1;
            }
            earley::advance_from_nonterminal(&mut cursor, &state_set[found]);
        }
    }

    match build_parse_tree(&grammar, &state_sets, full_parse) {
        Some(tree) => {
            println!("{}", tree.display());
            ExitCode::SUCCESS
        }
        None => {
            eprintln!("Error: could not reconstruct a derivation");
            ExitCode::FAILURE
        }
    }
}

fn run_json(grammar_path: &str, input: &str) -> ExitCode {
    let loaded = match grammar_json::load_grammar_from_file(grammar_path) {
        Ok(loaded) => loaded,
        Err(err) => {
            eprintln!("Error loading grammar: {}", err);
            return ExitCode::FAILURE;
        }
    };
    eprintln!("Loaded grammar: {}", loaded.name);
    eprintln!("  Non-terminals: {}", loaded.non_terminals.len());
    eprintln!("  Terminals: {}", loaded.terminals.len());
    eprintln!("  Productions: {}", loaded.production_count());

    let Some(tokens) = loaded.tokenize(input) else {
        eprintln!("Error: input contains characters outside the grammar's terminals");
        return ExitCode::FAILURE;
    };

    let grammar = Grammar::new(&loaded.rules);
    let state_sets =
        match earley::parse(&grammar, loaded.start, ITEM_CAPACITY, tokens.iter().copied()) {
            Ok(state_sets) => state_sets,
            Err(err) => {
                eprintln!("Error: {}", err);
                return ExitCode::FAILURE;
            }
        };

    let Some(full_parse) =
        earley::find_full_parse(&loaded.rules, loaded.start, &state_sets, tokens.len())
    else {
        eprintln!("Error: parse failed");
        return ExitCode::FAILURE;
    };

    match build_parse_tree(&grammar, &state_sets, full_parse) {
        Some(tree) => {
            println!(
                "{}",
                tree.display_with(&|sym| loaded.symbol_name(*sym).to_string())
            );
            ExitCode::SUCCESS
        }
        None => {
            eprintln!("Error: could not reconstruct a derivation");
            ExitCode::FAILURE
        }
    }
}

//! Recognizer and traversal tests, mostly over the arithmetic grammar.

use std::collections::HashSet;

use super::*;
use crate::calc::{self, CalcSymbol};
use crate::stable_vec::OomError;

const CAPACITY: usize = 1 << 16;

fn parse_calc(input: &str) -> StateSets {
    let rules = calc::rules();
    let grammar = Grammar::new(&rules);
    parse(&grammar, calc::START, CAPACITY, input.chars()).expect("parse ran out of capacity")
}

fn assert_set_semantics(state_sets: &StateSets) {
    for (num, state_set) in state_sets.iter_segments().enumerate() {
        let unique: HashSet<&EarleyItem> = state_set.iter().collect();
        assert_eq!(
            unique.len(),
            state_set.len(),
            "duplicate item in S({})",
            num
        );
    }
}

// Rule indices in calc::rules():
//   0: Sum -> Sum '+' Product      5: Product -> Factor
//   1: Sum -> Sum '-' Product      6: Factor -> '(' Sum ')'
//   2: Sum -> Product              7: Factor -> Number
//   3: Product -> Product '*' Factor   8: Number -> [0-9]
//   4: Product -> Product '/' Factor   9: Number -> [0-9] Number

#[test]
fn test_arithmetic_full_parse() {
    let rules = calc::rules();
    let input = "1+(8*9)";
    let state_sets = parse_calc(input);

    // One state set per input position, plus S(0).
    assert_eq!(state_sets.len(), input.len() + 1);
    assert_set_semantics(&state_sets);

    let full_parse = find_full_parse(&rules, calc::START, &state_sets, input.len())
        .expect("input should parse");
    assert_eq!(full_parse.state_set, 7);

    let root = state_sets.segment(full_parse.state_set)[full_parse.item];
    assert_eq!(root.rule_idx, 0, "expected Sum -> Sum '+' Product");
    assert_eq!(root.start_pos, 0);
    assert_eq!(root.progress, 3);
}

#[test]
fn test_arithmetic_traversal_right_to_left() {
    let rules = calc::rules();
    let grammar = Grammar::new(&rules);
    let input = "1+(8*9)";
    let state_sets = parse_calc(input);
    let full_parse = find_full_parse(&rules, calc::START, &state_sets, input.len()).unwrap();
    let root = state_sets.segment(full_parse.state_set)[full_parse.item];
    let root_rule = grammar.rule(root.rule_idx);

    let mut cursor = full_parse.state_set;

    // Last component: the Product covering "(8*9)".
    let mut components = root_rule.rhs.iter().rev();
    let product_sym = *components.next().unwrap();
    assert_eq!(product_sym, CalcSymbol::Product);
    let found = find_completed_item(&rules, state_sets.segment(cursor), 0, product_sym).unwrap();
    let product_item = state_sets.segment(cursor)[found];
    assert_eq!(product_item.rule_idx, 5, "expected Product -> Factor");
    assert_eq!(product_item.start_pos, 2);
    advance_from_nonterminal(&mut cursor, &product_item);
    assert_eq!(cursor, 2);

    // Middle component: the '+' terminal scanned out of S(1).
    let plus_sym = *components.next().unwrap();
    assert_eq!(plus_sym, CalcSymbol::Plus);
    assert!(plus_sym.is_terminal());
    advance_from_terminal(&mut cursor);
    assert_eq!(cursor, 1);

    // First component: the Sum covering "1".
    let sum_sym = *components.next().unwrap();
    assert_eq!(sum_sym, CalcSymbol::Sum);
    let found = find_completed_item(&rules, state_sets.segment(cursor), 0, sum_sym).unwrap();
    let sum_item = state_sets.segment(cursor)[found];
    assert_eq!(sum_item.rule_idx, 2, "expected Sum -> Product");
    assert_eq!(sum_item.start_pos, 0);
}

#[test]
fn test_ambiguous_number_has_alternatives() {
    let rules = calc::rules();
    let input = "11";
    let state_sets = parse_calc(input);

    assert!(find_full_parse(&rules, calc::START, &state_sets, input.len()).is_some());

    // Both Number derivations complete in S(2); the second is reachable by
    // continuing the search past the first.
    let state_set = state_sets.segment(2);
    let first = find_completed_item(&rules, state_set, 0, CalcSymbol::Number).unwrap();
    let second = find_completed_item(&rules, state_set, first + 1, CalcSymbol::Number).unwrap();
    assert_ne!(state_set[first], state_set[second]);
    let spans: HashSet<u32> = [state_set[first].start_pos, state_set[second].start_pos]
        .into_iter()
        .collect();
    assert_eq!(spans, HashSet::from([0, 1]));
}

#[test]
fn test_parse_failure_leaves_incomplete_items() {
    let rules = calc::rules();
    let input = "1+";
    let state_sets = parse_calc(input);

    assert_eq!(state_sets.len(), 3);
    assert!(find_full_parse(&rules, calc::START, &state_sets, input.len()).is_none());

    // S(2) exists and has predictions, but nothing qualifies as a full parse.
    let state_set = state_sets.segment(2);
    assert!(!state_set.is_empty());
    assert!(state_set
        .iter()
        .all(|item| !is_full_parse(&rules, calc::START, item)));
}

#[test]
fn test_unconsumed_input_stops_early() {
    let rules = calc::rules();
    let state_sets = parse_calc("1)2+3");

    // Only the leading "1" is consumed; the recognizer stops at the ')'.
    assert_eq!(state_sets.len(), 2);
    assert!(find_full_parse(&rules, calc::START, &state_sets, 5).is_none());
}

#[test]
fn test_empty_input_on_non_nullable_start() {
    let rules = calc::rules();
    let state_sets = parse_calc("");

    assert_eq!(state_sets.len(), 1);
    assert!(find_full_parse(&rules, calc::START, &state_sets, 0).is_none());
}

#[test]
fn test_scan_origin_of_next_state_set() {
    let state_sets = parse_calc("12");

    // S(1) begins with exactly the two scans of the first digit.
    let state_set = state_sets.segment(1);
    assert_eq!(
        &state_set[..2],
        &[
            EarleyItem {
                rule_idx: 8,
                progress: 1,
                start_pos: 0
            },
            EarleyItem {
                rule_idx: 9,
                progress: 1,
                start_pos: 0
            },
        ]
    );
}

#[test]
fn test_determinism() {
    let first = parse_calc("1+(8*9)");
    let second = parse_calc("1+(8*9)");

    assert_eq!(first.len(), second.len());
    assert_eq!(first.items(), second.items());
    for index in 0..first.len() {
        assert_eq!(first.segment_bounds(index), second.segment_bounds(index));
    }
}

#[test]
fn test_capacity_exhaustion() {
    let rules = calc::rules();
    let grammar = Grammar::new(&rules);
    let result = parse(&grammar, calc::START, 1, "1".chars());
    assert!(matches!(
        result,
        Err(OomError::CapacityExhausted { capacity: 1 })
    ));
}

// A grammar where every nonterminal derives the empty string through a cycle.
mod nullable_loop {
    use super::*;

    #[derive(Debug, Clone, Copy, PartialEq, Eq)]
    pub enum LoopSym {
        A,
        B,
    }

    impl Symbol for LoopSym {
        const SYMBOL_COUNT: usize = 2;
        type Token = char;

        fn to_index(self) -> u8 {
            self as u8
        }

        fn is_terminal(self) -> bool {
            false
        }

        fn matches_terminal(self, _token: &char) -> bool {
            false
        }
    }

    pub fn rules() -> Vec<Rule<LoopSym>> {
        vec![
            Rule::new(LoopSym::A, vec![]),
            Rule::new(LoopSym::A, vec![LoopSym::B]),
            Rule::new(LoopSym::B, vec![LoopSym::A]),
        ]
    }
}

#[test]
fn test_nullable_loop_on_empty_input() {
    use nullable_loop::LoopSym;

    let rules = nullable_loop::rules();
    let grammar = Grammar::new(&rules);
    let state_sets = parse(&grammar, LoopSym::A, CAPACITY, "".chars()).unwrap();

    assert_eq!(state_sets.len(), 1);
    assert_set_semantics(&state_sets);

    // A -> . (0), A -> . B (0), B -> . A (0), plus the two items advanced
    // during prediction because A and B are both nullable.
    let expected = [
        EarleyItem { rule_idx: 0, progress: 0, start_pos: 0 },
        EarleyItem { rule_idx: 1, progress: 0, start_pos: 0 },
        EarleyItem { rule_idx: 2, progress: 0, start_pos: 0 },
        EarleyItem { rule_idx: 1, progress: 1, start_pos: 0 },
        EarleyItem { rule_idx: 2, progress: 1, start_pos: 0 },
    ];
    let state_set = state_sets.segment(0);
    assert_eq!(state_set.len(), expected.len());
    for item in &expected {
        assert!(state_set.contains(item), "missing {:?}", item);
    }

    assert!(find_full_parse(&rules, LoopSym::A, &state_sets, 0).is_some());
}

// S -> 'a' N 'a' with N -> epsilon: the completion of N only exists after
// the prediction step that needs it, so the dot must be advanced during
// prediction for the parse to go through.
mod nullable_gap {
    use super::*;

    #[derive(Debug, Clone, Copy, PartialEq, Eq)]
    pub enum GapSym {
        Ta,
        S,
        N,
    }

    impl Symbol for GapSym {
        const SYMBOL_COUNT: usize = 3;
        type Token = char;

        fn to_index(self) -> u8 {
            self as u8
        }

        fn is_terminal(self) -> bool {
            matches!(self, GapSym::Ta)
        }

        fn matches_terminal(self, token: &char) -> bool {
            matches!(self, GapSym::Ta) && *token == 'a'
        }
    }

    pub fn rules() -> Vec<Rule<GapSym>> {
        vec![
            Rule::new(GapSym::S, vec![GapSym::Ta, GapSym::N, GapSym::Ta]),
            Rule::new(GapSym::N, vec![]),
        ]
    }
}

#[test]
fn test_nullable_advance_during_prediction() {
    use nullable_gap::GapSym;

    let rules = nullable_gap::rules();
    let grammar = Grammar::new(&rules);
    let state_sets = parse(&grammar, GapSym::S, CAPACITY, "aa".chars()).unwrap();

    // The advanced copy S -> 'a' N . 'a' (0) must appear in S(1).
    assert!(state_sets.segment(1).contains(&EarleyItem {
        rule_idx: 0,
        progress: 2,
        start_pos: 0
    }));

    let full_parse = find_full_parse(&rules, GapSym::S, &state_sets, 2).expect("should parse");
    let root = state_sets.segment(full_parse.state_set)[full_parse.item];
    assert_eq!(root.rule_idx, 0);
    assert_eq!(root.progress, 3);
}

#[test]
fn test_left_recursion_stays_bounded() {
    // Sum is left-recursive; a long chain of sums must terminate and parse.
    let rules = calc::rules();
    let input = "1+2+3+4+5+6+7+8+9";
    let state_sets = parse_calc(input);
    assert_set_semantics(&state_sets);
    assert!(find_full_parse(&rules, calc::START, &state_sets, input.len()).is_some());
}

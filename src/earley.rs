//! The Earley recognizer, full-parse detection, and the traversal helpers
//! used to walk a completed item's subcomponents.

use rustc_hash::FxHashSet;

use crate::grammar::{Grammar, Rule, Symbol};
use crate::span_list::SpanList;
use crate::stable_vec::OomError;

/// One partially or fully matched rule application.
///
/// `progress` is the dividing point between the rule's matched and unmatched
/// components; `start_pos` is the index of the state set where this match
/// began. Packs into 8 bytes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct EarleyItem {
    /// Index of the rule being matched.
    pub rule_idx: u16,
    /// How many rhs components have been matched so far.
    pub progress: u16,
    /// State set where this match started.
    pub start_pos: u32,
}

impl EarleyItem {
    pub fn new(rule_idx: u16, start_pos: u32) -> Self {
        EarleyItem {
            rule_idx,
            progress: 0,
            start_pos,
        }
    }

    /// Copy of this item with the dot moved one component to the right.
    pub fn advanced(self) -> Self {
        EarleyItem {
            progress: self.progress + 1,
            ..self
        }
    }

    /// Whether every rhs component has been matched. `rule` must be the rule
    /// named by `rule_idx`.
    pub fn is_complete<S>(&self, rule: &Rule<S>) -> bool {
        self.progress as usize == rule.rhs.len()
    }

    /// The component just after the dot. The item must be incomplete.
    pub fn next_symbol<S: Copy>(&self, rule: &Rule<S>) -> S {
        rule.rhs[self.progress as usize]
    }
}

/// The state sets produced by a parse: segment `i` holds the items live
/// after consuming `i` input tokens.
pub type StateSets = SpanList<EarleyItem>;

/// Runs the recognizer over `input` and returns every state set it built.
///
/// The returned list has one segment per input position reached, ending with
/// the first position from which no further progress was possible: exactly
/// `input.len() + 1` segments when all input was consumed. `item_capacity`
/// bounds the total number of items across all state sets; exceeding it
/// aborts the parse with [`OomError`].
pub fn parse<S, I>(
    grammar: &Grammar<'_, S>,
    start_symbol: S,
    item_capacity: usize,
    input: I,
) -> Result<StateSets, OomError>
where
    S: Symbol,
    I: IntoIterator<Item = S::Token>,
{
    let mut state_sets = StateSets::with_capacity(item_capacity)?;
    // Mirror of the open segment's contents, giving set semantics without
    // rescanning the segment on every insertion.
    let mut seen: FxHashSet<EarleyItem> = FxHashSet::default();

    // Initialize S(0)
    state_sets.open_segment();
    for rule_idx in grammar.rules_for(start_symbol) {
        let item = EarleyItem::new(rule_idx, 0);
        seen.insert(item);
        state_sets.push(item)?;
    }

    let mut tokens = input.into_iter();
    let mut scanned: Vec<EarleyItem> = Vec::new();
    let mut curr_pos: u32 = 0;
    loop {
        let token = tokens.next();
        let curr = curr_pos as usize;

        // Walk the open segment, including items appended during the walk.
        let mut i = state_sets.segment_bounds(curr).0;
        while i < state_sets.segment_bounds(curr).1 {
            let item = state_sets.items()[i];
            let rule = grammar.rule(item.rule_idx);
            if item.is_complete(rule) {
                // Completion: advance every item in the origin state set that
                // was waiting on this item's lhs. The origin can be the open
                // segment itself, so its bounds are re-read each step.
                let origin = item.start_pos as usize;
                let mut j = state_sets.segment_bounds(origin).0;
                while j < state_sets.segment_bounds(origin).1 {
                    let waiting = state_sets.items()[j];
                    let waiting_rule = grammar.rule(waiting.rule_idx);
                    if !waiting.is_complete(waiting_rule)
                        && waiting.next_symbol(waiting_rule) == rule.lhs
                    {
                        let advanced = waiting.advanced();
                        if seen.insert(advanced) {
                            state_sets.push(advanced)?;
                        }
                    }
                    j += 1;
                }
            } else {
                let next_sym = item.next_symbol(rule);
                match token.as_ref() {
                    Some(token) if next_sym.is_terminal() => {
                        // Scan: stage the advanced item for the next state set.
                        if next_sym.matches_terminal(token) {
                            scanned.push(item.advanced());
                        }
                    }
                    _ => {
                        // Prediction. Vacuous for a terminal at end of input:
                        // no rules, not nullable.
                        for rule_idx in grammar.rules_for(next_sym) {
                            let predicted = EarleyItem::new(rule_idx, curr_pos);
                            if seen.insert(predicted) {
                                state_sets.push(predicted)?;
                            }
                        }
                        // A nullable symbol completes in place, possibly
                        // before any item producing it exists, so the
                        // predicting item is advanced past it here as well.
                        if grammar.is_nullable(next_sym) {
                            let advanced = item.advanced();
                            if seen.insert(advanced) {
                                state_sets.push(advanced)?;
                            }
                        }
                    }
                }
            }
            i += 1;
        }

        // Nothing scanned means the next state set would be empty: no
        // further progress is possible.
        if scanned.is_empty() {
            break;
        }
        state_sets.open_segment();
        seen.clear();
        for item in scanned.drain(..) {
            seen.insert(item);
            state_sets.push(item)?;
        }
        curr_pos += 1;
    }
    Ok(state_sets)
}

/// Position of a full-parse item: the index of the state set holding it and
/// the item's offset within that state set.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ParseResult {
    pub state_set: usize,
    pub item: usize,
}

/// Whether `item` is a completed match of `start_symbol` spanning the whole
/// input, i.e. starting at position 0.
pub fn is_full_parse<S: Symbol>(rules: &[Rule<S>], start_symbol: S, item: &EarleyItem) -> bool {
    let rule = &rules[item.rule_idx as usize];
    item.is_complete(rule) && item.start_pos == 0 && rule.lhs == start_symbol
}

/// Finds the first item in `S(input_len)` that completely parses the input,
/// or `None` when the recognizer stopped short of `input_len` or no such
/// item exists. With an ambiguous grammar several items may qualify; callers
/// wanting the alternatives enumerate the state set themselves.
pub fn find_full_parse<S: Symbol>(
    rules: &[Rule<S>],
    start_symbol: S,
    state_sets: &StateSets,
    input_len: usize,
) -> Option<ParseResult> {
    if state_sets.len() < input_len + 1 {
        return None;
    }
    let item = state_sets
        .segment(input_len)
        .iter()
        .position(|item| is_full_parse(rules, start_symbol, item))?;
    Some(ParseResult {
        state_set: input_len,
        item,
    })
}

/// Finds a completed Earley item with `comp_sym` as its head at or after
/// offset `from` in the given state set. Calling again with the returned
/// offset plus one yields the alternative parses of the same symbol.
// TODO: also filter by where the matched item starts once the caller knows
// the child's expected start position. Matching on the symbol alone can pick
// 'Number -> [0-9] . (1)' over 'Number -> [0-9] Number . (0)' when walking
// the parse of "11".
pub fn find_completed_item<S: Symbol>(
    rules: &[Rule<S>],
    state_set: &[EarleyItem],
    from: usize,
    comp_sym: S,
) -> Option<usize> {
    state_set[from..]
        .iter()
        .position(|item| {
            let rule = &rules[item.rule_idx as usize];
            rule.lhs == comp_sym && item.is_complete(rule)
        })
        .map(|offset| from + offset)
}

/// Given that we are iterating in reverse over the direct subcomponents of
/// an Earley item and the current subcomponent is a terminal, move the state
/// set index to the state set relevant for the next subcomponent: the
/// matching token was consumed by a scan out of the previous set.
pub fn advance_from_terminal(state_set: &mut usize) {
    *state_set -= 1;
}

/// Given that we are iterating in reverse over the direct subcomponents of
/// an Earley item and the current subcomponent is a nonterminal matched by
/// `item`, move the state set index to where that match began.
pub fn advance_from_nonterminal(state_set: &mut usize, item: &EarleyItem) {
    *state_set = item.start_pos as usize;
}

#[cfg(test)]
#[path = "earley_tests.rs"]
mod tests;

//! Concrete derivation trees reconstructed from a completed parse.

use std::fmt;

use crate::earley::{
    advance_from_nonterminal, advance_from_terminal, find_completed_item, EarleyItem, ParseResult,
    StateSets,
};
use crate::grammar::{Grammar, Symbol};

/// A parse tree node: a symbol and the subtrees of its rule's components.
/// Terminal symbols are leaves.
#[derive(Debug, Clone, PartialEq)]
pub struct ParseTree<S> {
    pub symbol: S,
    pub children: Vec<ParseTree<S>>,
}

impl<S> ParseTree<S> {
    pub fn new(symbol: S, children: Vec<ParseTree<S>>) -> Self {
        ParseTree { symbol, children }
    }

    /// Create a leaf node (no children)
    pub fn leaf(symbol: S) -> Self {
        ParseTree {
            symbol,
            children: Vec::new(),
        }
    }

    pub fn is_leaf(&self) -> bool {
        self.children.is_empty()
    }

    pub fn num_children(&self) -> usize {
        self.children.len()
    }

    /// Renders the tree one node per line, with box-drawing branch lines:
    ///
    /// ```text
    /// Sum
    /// ├─ Sum
    /// │   └─ Product
    /// └─ '+'
    /// ```
    pub fn display(&self) -> String
    where
        S: fmt::Display,
    {
        self.display_with(&|symbol| symbol.to_string())
    }

    /// Like [`ParseTree::display`], with symbol names produced by `name_of`.
    /// Lets callers render symbols whose names live in external tables.
    pub fn display_with<F>(&self, name_of: &F) -> String
    where
        F: Fn(&S) -> String,
    {
        let mut out = name_of(&self.symbol);
        self.write_children(&mut out, &mut Vec::new(), name_of);
        out
    }

    /// Appends one line per descendant. `open_branches` holds, for each
    /// ancestor level below the root, whether a later sibling still hangs
    /// off that level (and so needs a vertical rule in the margin).
    fn write_children<F>(&self, out: &mut String, open_branches: &mut Vec<bool>, name_of: &F)
    where
        F: Fn(&S) -> String,
    {
        for (i, child) in self.children.iter().enumerate() {
            let more_siblings = i + 1 < self.children.len();
            out.push('\n');
            for &open in open_branches.iter() {
                out.push_str(if open { "│   " } else { "    " });
            }
            out.push_str(if more_siblings { "├─ " } else { "└─ " });
            out.push_str(&name_of(&child.symbol));

            open_branches.push(more_siblings);
            child.write_children(out, open_branches, name_of);
            open_branches.pop();
        }
    }
}

/// Reconstructs one derivation tree for a full-parse item.
///
/// Each node's components are resolved right-to-left: a terminal component
/// steps the state set index back by one, a nonterminal component picks the
/// first completed item with that head out of the current state set and then
/// jumps to where that match began. Children are reversed afterwards so the
/// tree reads in input order. Returns `None` if some component cannot be
/// resolved, which does not happen for items returned by
/// [`crate::earley::find_full_parse`] on unambiguous grammars.
pub fn build_parse_tree<S: Symbol>(
    grammar: &Grammar<'_, S>,
    state_sets: &StateSets,
    full_parse: ParseResult,
) -> Option<ParseTree<S>> {
    let item = state_sets.segment(full_parse.state_set)[full_parse.item];
    subtree(grammar, state_sets, full_parse.state_set, item)
}

fn subtree<S: Symbol>(
    grammar: &Grammar<'_, S>,
    state_sets: &StateSets,
    end_state_set: usize,
    item: EarleyItem,
) -> Option<ParseTree<S>> {
    let rule = grammar.rule(item.rule_idx);
    let mut children = Vec::with_capacity(rule.rhs.len());
    let mut cursor = end_state_set;
    for &comp_sym in rule.rhs.iter().rev() {
        if comp_sym.is_terminal() {
            children.push(ParseTree::leaf(comp_sym));
            advance_from_terminal(&mut cursor);
        } else {
            let state_set = state_sets.segment(cursor);
            let found = find_completed_item(grammar.rules(), state_set, 0, comp_sym)?;
            let child_item = state_set[found];
            children.push(subtree(grammar, state_sets, cursor, child_item)?);
            advance_from_nonterminal(&mut cursor, &child_item);
        }
    }
    children.reverse();
    Some(ParseTree::new(rule.lhs, children))
}

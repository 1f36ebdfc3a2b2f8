//! Adapters for printing Earley items and state sets in dotted-rule
//! notation.

use std::fmt;

use crate::earley::EarleyItem;
use crate::grammar::{Rule, Symbol};

/// Renders one item as `Sum -> Sum '+' . Product (0)`.
pub struct ItemDisplay<'a, S> {
    pub rules: &'a [Rule<S>],
    pub item: &'a EarleyItem,
}

impl<S: Symbol + fmt::Display> fmt::Display for ItemDisplay<'_, S> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let rule = &self.rules[self.item.rule_idx as usize];
        write!(f, "{} ->", rule.lhs)?;
        for (i, sym) in rule.rhs.iter().enumerate() {
            if i == self.item.progress as usize {
                write!(f, " .")?;
            }
            write!(f, " {}", sym)?;
        }
        if self.item.is_complete(rule) {
            write!(f, " .")?;
        }
        write!(f, " ({})", self.item.start_pos)
    }
}

/// Renders a whole state set, one item per line inside braces.
pub struct StateSetDisplay<'a, S> {
    pub rules: &'a [Rule<S>],
    pub state_set: &'a [EarleyItem],
}

impl<S: Symbol + fmt::Display> fmt::Display for StateSetDisplay<'_, S> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "{{")?;
        for item in self.state_set {
            writeln!(
                f,
                "  {}",
                ItemDisplay {
                    rules: self.rules,
                    item
                }
            )?;
        }
        write!(f, "}}")
    }
}

//! Loads grammars from JSON files and converts them to the dense rule tables
//! the recognizer consumes.
//!
//! The file format is an object with `name`, `start`, a `rules` map, and an
//! optional list of `tests` inputs. Nonterminal names are wrapped in angle
//! brackets; every other string is a terminal matched against one input
//! character:
//!
//! ```json
//! {
//!     "name": "letters",
//!     "start": "<S>",
//!     "rules": {
//!         "<S>": [["a", "<B>"], ["b"]],
//!         "<B>": [["b"]]
//!     },
//!     "tests": ["ab", "b"]
//! }
//! ```
//!
//! A rule value may also be the shorthand `{"digits": true}` or
//! `{"letters": true}` expanding to one single-character production per
//! digit or lowercase letter.

use std::collections::HashMap;
use std::fs;
use std::path::Path;

use rustc_hash::FxHashMap;
use serde::Deserialize;
use serde_json::Value;
use thiserror::Error;

use crate::grammar::{Rule, Symbol};

/// At most this many terminals and this many nonterminals per grammar, so
/// both classes pack into [`DynSymbol`]'s dense index space.
pub const MAX_SYMBOLS_PER_CLASS: usize = 128;

#[derive(Debug, Error)]
pub enum GrammarFileError {
    #[error("failed to read grammar file: {0}")]
    Io(#[from] std::io::Error),
    #[error("failed to parse grammar JSON: {0}")]
    Json(#[from] serde_json::Error),
    #[error("start symbol '{0}' has no rules")]
    UnknownStart(String),
    #[error("malformed rule: {0}")]
    BadRule(String),
    #[error("too many {kind} symbols ({count}); at most 128 per class")]
    TooManySymbols { kind: &'static str, count: usize },
}

// ============================================================================
// Symbol table - interns the names of one symbol class
// ============================================================================

/// Interner for one symbol class (terminals or nonterminals).
///
/// Names get dense IDs in insertion order. Because [`DynSymbol`] packs the
/// class bit and the ID into a single dense index byte, the table refuses to
/// grow past [`MAX_SYMBOLS_PER_CLASS`]; the cap is enforced here, at the
/// only place IDs are handed out.
#[derive(Debug, Clone)]
pub struct SymbolTable {
    kind: &'static str,
    str_to_id: FxHashMap<String, u32>,
    id_to_str: Vec<String>,
}

impl SymbolTable {
    pub fn new(kind: &'static str) -> Self {
        SymbolTable {
            kind,
            str_to_id: FxHashMap::default(),
            id_to_str: Vec::new(),
        }
    }

    /// ID of `symbol`, interning it first if the class still has room.
    pub fn get_or_insert(&mut self, symbol: &str) -> Result<u32, GrammarFileError> {
        if let Some(&id) = self.str_to_id.get(symbol) {
            return Ok(id);
        }
        if self.id_to_str.len() == MAX_SYMBOLS_PER_CLASS {
            return Err(GrammarFileError::TooManySymbols {
                kind: self.kind,
                count: self.id_to_str.len() + 1,
            });
        }
        let id = self.id_to_str.len() as u32;
        self.str_to_id.insert(symbol.to_string(), id);
        self.id_to_str.push(symbol.to_string());
        Ok(id)
    }

    pub fn get_id(&self, symbol: &str) -> Option<u32> {
        self.str_to_id.get(symbol).copied()
    }

    pub fn get_str(&self, id: u32) -> Option<&str> {
        self.id_to_str.get(id as usize).map(|s| s.as_str())
    }

    pub fn len(&self) -> usize {
        self.id_to_str.len()
    }

    pub fn is_empty(&self) -> bool {
        self.id_to_str.is_empty()
    }
}

// ============================================================================
// Runtime symbols
// ============================================================================

/// A symbol of a grammar loaded at runtime, identified by its table ID.
///
/// Terminal and nonterminal IDs interleave into the dense index space, so a
/// grammar may use up to [`MAX_SYMBOLS_PER_CLASS`] of each. Input tokens are
/// terminal-table IDs.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum DynSymbol {
    Terminal(u8),
    NonTerminal(u8),
}

impl Symbol for DynSymbol {
    const SYMBOL_COUNT: usize = 2 * MAX_SYMBOLS_PER_CLASS;
    type Token = u32;

    fn to_index(self) -> u8 {
        match self {
            DynSymbol::Terminal(id) => id << 1,
            DynSymbol::NonTerminal(id) => (id << 1) | 1,
        }
    }

    fn is_terminal(self) -> bool {
        matches!(self, DynSymbol::Terminal(_))
    }

    fn matches_terminal(self, token: &u32) -> bool {
        match self {
            DynSymbol::Terminal(id) => u32::from(id) == *token,
            DynSymbol::NonTerminal(_) => false,
        }
    }
}

/// A grammar loaded from JSON: the rule table (grouped by left-hand side),
/// the interned symbol names, and the file's embedded test inputs.
#[derive(Debug)]
pub struct LoadedGrammar {
    pub name: String,
    pub start: DynSymbol,
    pub rules: Vec<Rule<DynSymbol>>,
    pub terminals: SymbolTable,
    pub non_terminals: SymbolTable,
    pub tests: Vec<Vec<u32>>,
}

impl LoadedGrammar {
    /// Tokenize an input string to terminal IDs, one per character. Returns
    /// `None` if any character is not a terminal of this grammar.
    pub fn tokenize(&self, input: &str) -> Option<Vec<u32>> {
        input
            .chars()
            .map(|c| self.terminals.get_id(&c.to_string()))
            .collect()
    }

    /// Interned name of a symbol.
    pub fn symbol_name(&self, sym: DynSymbol) -> &str {
        let name = match sym {
            DynSymbol::Terminal(id) => self.terminals.get_str(u32::from(id)),
            DynSymbol::NonTerminal(id) => self.non_terminals.get_str(u32::from(id)),
        };
        name.unwrap_or("?")
    }

    pub fn production_count(&self) -> usize {
        self.rules.len()
    }
}

// ============================================================================
// Grammar loading and conversion
// ============================================================================

/// String-based symbol for parsing JSON
#[derive(Debug, Clone, PartialEq, Eq)]
enum StrSymbol {
    Terminal(String),
    NonTerminal(String),
}

/// JSON structure for grammar files
#[derive(Debug, Deserialize)]
struct GrammarJson {
    name: String,
    start: String,
    rules: HashMap<String, Value>,
    #[serde(default)]
    tests: Vec<String>,
}

/// Load a grammar from a JSON file.
pub fn load_grammar_from_file<P: AsRef<Path>>(path: P) -> Result<LoadedGrammar, GrammarFileError> {
    let content = fs::read_to_string(path)?;
    load_grammar_from_str(&content)
}

/// Load a grammar from a JSON string.
pub fn load_grammar_from_str(json: &str) -> Result<LoadedGrammar, GrammarFileError> {
    let parsed: GrammarJson = serde_json::from_str(json)?;

    let mut str_rules: HashMap<String, Vec<Vec<StrSymbol>>> = HashMap::new();
    for (lhs, rhs_value) in &parsed.rules {
        str_rules.insert(lhs.clone(), parse_rules(lhs, rhs_value)?);
    }

    if !str_rules.contains_key(&parsed.start) {
        return Err(GrammarFileError::UnknownStart(parsed.start));
    }

    let mut terminals = SymbolTable::new("terminal");
    let mut non_terminals = SymbolTable::new("nonterminal");

    // The start symbol gets ID 0; the rest are numbered in sorted order so
    // loading is deterministic. Interning fails once a class is full.
    non_terminals.get_or_insert(&parsed.start)?;
    let mut nt_names: Vec<&String> = str_rules.keys().collect();
    nt_names.sort();
    for lhs in &nt_names {
        non_terminals.get_or_insert(lhs.as_str())?;
    }
    for lhs in &nt_names {
        for production in &str_rules[lhs.as_str()] {
            for sym in production {
                match sym {
                    StrSymbol::Terminal(s) => {
                        terminals.get_or_insert(s)?;
                    }
                    StrSymbol::NonTerminal(s) => {
                        non_terminals.get_or_insert(s)?;
                    }
                }
            }
        }
    }

    // Emit the rule table grouped by lhs in ID order; the recognizer's
    // index requires rules sharing an lhs to be contiguous.
    let mut rules = Vec::new();
    for id in 0..non_terminals.len() as u32 {
        let name = match non_terminals.get_str(id) {
            Some(name) => name,
            None => continue,
        };
        let Some(productions) = str_rules.get(name) else {
            // Interned from some rhs but never defined; predictions for it
            // simply find no rules.
            continue;
        };
        let lhs = DynSymbol::NonTerminal(id as u8);
        for production in productions {
            let rhs = production
                .iter()
                .map(|sym| resolve(sym, &terminals, &non_terminals))
                .collect::<Result<Vec<_>, _>>()?;
            rules.push(Rule::new(lhs, rhs));
        }
    }

    let mut tests = Vec::with_capacity(parsed.tests.len());
    for test in &parsed.tests {
        let mut tokens = Vec::with_capacity(test.len());
        for c in test.chars() {
            tokens.push(terminals.get_or_insert(&c.to_string())?);
        }
        tests.push(tokens);
    }

    Ok(LoadedGrammar {
        name: parsed.name,
        start: DynSymbol::NonTerminal(0),
        rules,
        terminals,
        non_terminals,
        tests,
    })
}

fn resolve(
    sym: &StrSymbol,
    terminals: &SymbolTable,
    non_terminals: &SymbolTable,
) -> Result<DynSymbol, GrammarFileError> {
    let looked_up = match sym {
        StrSymbol::Terminal(s) => terminals.get_id(s).map(|id| DynSymbol::Terminal(id as u8)),
        StrSymbol::NonTerminal(s) => non_terminals
            .get_id(s)
            .map(|id| DynSymbol::NonTerminal(id as u8)),
    };
    looked_up.ok_or_else(|| {
        let (StrSymbol::Terminal(s) | StrSymbol::NonTerminal(s)) = sym;
        GrammarFileError::BadRule(format!("symbol '{}' was never interned", s))
    })
}

/// Parse the productions of one nonterminal from its JSON value.
fn parse_rules(lhs: &str, value: &Value) -> Result<Vec<Vec<StrSymbol>>, GrammarFileError> {
    match value {
        // Array of productions: [["a", "<B>"], ["c"]]
        Value::Array(productions) => productions
            .iter()
            .map(|production| match production {
                Value::Array(symbols) => parse_production(lhs, symbols),
                _ => Err(GrammarFileError::BadRule(format!(
                    "production of '{}' must be an array",
                    lhs
                ))),
            })
            .collect(),
        // Shorthand objects expanding to single-character productions.
        Value::Object(object) => {
            if object.get("digits").and_then(Value::as_bool) == Some(true) {
                Ok((0..=9)
                    .map(|digit| vec![StrSymbol::Terminal(digit.to_string())])
                    .collect())
            } else if object.get("letters").and_then(Value::as_bool) == Some(true) {
                Ok(('a'..='z')
                    .map(|letter| vec![StrSymbol::Terminal(letter.to_string())])
                    .collect())
            } else {
                Err(GrammarFileError::BadRule(format!(
                    "unrecognized rule object for '{}'",
                    lhs
                )))
            }
        }
        _ => Err(GrammarFileError::BadRule(format!(
            "rules of '{}' must be an array or shorthand object",
            lhs
        ))),
    }
}

fn parse_production(lhs: &str, symbols: &[Value]) -> Result<Vec<StrSymbol>, GrammarFileError> {
    symbols
        .iter()
        .map(|sym| match sym {
            Value::String(s) if s.starts_with('<') && s.ends_with('>') => {
                Ok(StrSymbol::NonTerminal(s.clone()))
            }
            Value::String(s) => Ok(StrSymbol::Terminal(s.clone())),
            _ => Err(GrammarFileError::BadRule(format!(
                "symbol in a production of '{}' must be a string",
                lhs
            ))),
        })
        .collect()
}

//! Grammar types.

use crate::{
    error::{BuildError, Errors, GeneratingError},
    first_sets::FirstSets,
    types::{Map, Set},
    util::write_joined,
};
use std::fmt;

/// The reserved name of the augmenting start rule.
pub const START_RULE_NAME: &str = "START";

#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum SymbolKind {
    Terminal,
    Intermediate,
}

/// A grammar symbol, identified by its kind and name.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Symbol {
    kind: SymbolKind,
    name: String,
}

impl Symbol {
    pub fn terminal(name: impl Into<String>) -> Self {
        Self {
            kind: SymbolKind::Terminal,
            name: name.into(),
        }
    }

    pub fn intermediate(name: impl Into<String>) -> Self {
        Self {
            kind: SymbolKind::Intermediate,
            name: name.into(),
        }
    }

    pub fn kind(&self) -> SymbolKind {
        self.kind
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn is_terminal(&self) -> bool {
        self.kind == SymbolKind::Terminal
    }

    pub fn is_intermediate(&self) -> bool {
        self.kind == SymbolKind::Intermediate
    }
}

impl fmt::Display for Symbol {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.name)
    }
}

#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[repr(transparent)]
pub struct RuleID {
    raw: u16,
}

impl RuleID {
    /// Reserved for the augmenting start rule.
    pub const START: Self = Self::new(1);

    const OFFSET: u16 = 2;

    #[inline]
    const fn new(raw: u16) -> Self {
        Self { raw }
    }

    #[inline]
    pub const fn into_raw(self) -> u16 {
        self.raw
    }
}

impl fmt::Display for RuleID {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Display::fmt(&self.raw, f)
    }
}

/// The type that represents a production rule in grammar.
#[derive(Debug)]
pub struct Rule {
    id: RuleID,
    left: String,
    right: Vec<Symbol>,
    action: String,
}

impl Rule {
    pub fn id(&self) -> RuleID {
        self.id
    }

    /// Return the name of the intermediate on the left-hand side.
    pub fn left(&self) -> &str {
        &self.left
    }

    /// Return the right-hand side of this production.
    pub fn right(&self) -> &[Symbol] {
        &self.right[..]
    }

    /// Return the semantic action attached to this production.
    pub fn action(&self) -> &str {
        &self.action
    }

    pub fn is_start(&self) -> bool {
        self.id == RuleID::START
    }
}

// `"LHS ::= R1 R2 R3"`
impl fmt::Display for Rule {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} ::=", self.left)?;
        for symbol in &self.right {
            write!(f, " {}", symbol)?;
        }
        Ok(())
    }
}

/// The grammar definition used to derive the parser automaton.
///
/// A grammar is populated once and then only read while states are built;
/// every `Rule` lives here and the rest of the crate borrows it.
#[derive(Debug)]
pub struct Grammar {
    rules: Map<RuleID, Rule>,
    alternatives: Map<String, Vec<RuleID>>,
    terminals: Set<String>,
    intermediates: Set<String>,
    types: Map<String, String>,
    next_rule_id: u16,
}

impl Default for Grammar {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for Grammar {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "## terminals:")?;
        for terminal in &self.terminals {
            writeln!(f, "{}", terminal)?;
        }

        writeln!(f, "\n## intermediates:")?;
        for intermediate in &self.intermediates {
            write!(f, "{}", intermediate)?;
            if let Some(ty) = self.types.get(intermediate) {
                write!(f, " : {}", ty)?;
            }
            writeln!(f)?;
        }

        writeln!(f, "\n## rules:")?;
        for rule in self.rules.values() {
            writeln!(f, "[{}] {}", rule.id, rule)?;
        }

        Ok(())
    }
}

impl Grammar {
    pub fn new() -> Self {
        Self {
            rules: Map::default(),
            alternatives: Map::default(),
            terminals: Set::default(),
            intermediates: Set::default(),
            types: Map::default(),
            next_rule_id: RuleID::OFFSET,
        }
    }

    /// Register a terminal symbol. Registering the same name twice is a no-op.
    pub fn add_terminal(&mut self, name: &str) -> Symbol {
        if !self.terminals.contains(name) {
            self.terminals.insert(name.to_owned());
        }
        Symbol::terminal(name)
    }

    /// Register an intermediate symbol. Registering the same name twice is a no-op.
    pub fn add_intermediate(&mut self, name: &str) -> Symbol {
        if !self.intermediates.contains(name) {
            self.intermediates.insert(name.to_owned());
        }
        Symbol::intermediate(name)
    }

    /// Declare the semantic type carried by an intermediate.
    pub fn set_type(&mut self, intermediate: &str, ty: impl Into<String>) {
        self.add_intermediate(intermediate);
        self.types.insert(intermediate.to_owned(), ty.into());
    }

    /// Add a production rule as the last alternative of `left`.
    ///
    /// The first rule named [`START_RULE_NAME`] receives [`RuleID::START`];
    /// every other rule is numbered in insertion order.
    pub fn add_rule<I>(&mut self, left: &str, right: I, action: impl Into<String>) -> RuleID
    where
        I: IntoIterator<Item = Symbol>,
    {
        let right: Vec<Symbol> = right.into_iter().collect();
        for symbol in &right {
            match symbol.kind() {
                SymbolKind::Terminal => self.add_terminal(symbol.name()),
                SymbolKind::Intermediate => self.add_intermediate(symbol.name()),
            };
        }
        self.add_intermediate(left);

        let id = if left == START_RULE_NAME && !self.rules.contains_key(&RuleID::START) {
            RuleID::START
        } else {
            let id = RuleID::new(self.next_rule_id);
            self.next_rule_id += 1;
            id
        };

        self.rules.insert(
            id,
            Rule {
                id,
                left: left.to_owned(),
                right,
                action: action.into(),
            },
        );
        if id == RuleID::START {
            self.rules.sort_keys();
        }
        self.alternatives
            .entry(left.to_owned())
            .or_default()
            .push(id);

        id
    }

    /// Return the augmenting start rule.
    pub fn start_rule(&self) -> Result<&Rule, BuildError> {
        self.rules
            .get(&RuleID::START)
            .ok_or_else(|| BuildError::MissingStartRule {
                name: START_RULE_NAME.to_owned(),
            })
    }

    /// Return the alternatives of `name` in the order they were added.
    pub fn alternatives<'g>(&'g self, name: &str) -> impl Iterator<Item = &'g Rule> + 'g {
        self.alternatives
            .get(name)
            .into_iter()
            .flatten()
            .map(move |id| &self.rules[id])
    }

    pub fn rule(&self, id: RuleID) -> &Rule {
        &self.rules[&id]
    }

    /// Iterate over every rule, ordered by rule number.
    pub fn rules(&self) -> impl Iterator<Item = &Rule> + '_ {
        self.rules.values()
    }

    pub fn terminals(&self) -> impl Iterator<Item = &str> + '_ {
        self.terminals.iter().map(String::as_str)
    }

    pub fn intermediates(&self) -> impl Iterator<Item = &str> + '_ {
        self.intermediates.iter().map(String::as_str)
    }

    pub fn is_terminal(&self, name: &str) -> bool {
        self.terminals.contains(name)
    }

    pub fn declared_type(&self, intermediate: &str) -> Option<&str> {
        self.types.get(intermediate).map(String::as_str)
    }

    /// Compute `First(symbols)`.
    ///
    /// This builds the FIRST sets of the whole grammar on every call; use
    /// [`FirstSets`] directly when querying repeatedly.
    pub fn first(&self, symbols: &[Symbol]) -> Set<Symbol> {
        FirstSets::new(self).first(symbols)
    }

    /// Collect every problem of this grammar that does not prevent
    /// building an automaton.
    pub fn check(&self) -> Errors<GeneratingError> {
        let mut errors = Errors::default();

        match self.alternatives.get(START_RULE_NAME).map(Vec::len) {
            None | Some(0) => errors.push(GeneratingError::MissingStartRule {
                name: START_RULE_NAME.to_owned(),
            }),
            Some(1) => (),
            Some(count) => errors.push(GeneratingError::DuplicateStartRule {
                name: START_RULE_NAME.to_owned(),
                count,
            }),
        }

        for intermediate in &self.intermediates {
            if !self.types.contains_key(intermediate) {
                errors.push(GeneratingError::MissingType {
                    intermediate: intermediate.clone(),
                });
            }
        }

        errors
    }

    pub(crate) fn display_rules(&self) -> impl fmt::Display + '_ {
        crate::util::display_fn(move |f| {
            for rule in self.rules.values() {
                write!(f, "[{}] {} ::= ", rule.id, rule.left)?;
                write_joined(f, &rule.right, " ")?;
                if !rule.action.is_empty() {
                    write!(f, "  {}", rule.action)?;
                }
                writeln!(f)?;
            }
            Ok(())
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rule_numbers_reserve_the_start_rule() {
        let mut g = Grammar::new();
        let e = g.add_rule("E", [Symbol::terminal("ONE")], "");
        let start = g.add_rule(START_RULE_NAME, [Symbol::intermediate("E")], "");
        let e2 = g.add_rule("E", [Symbol::terminal("ZERO")], "");

        assert_eq!(start, RuleID::START);
        assert_eq!(e.into_raw(), 2);
        assert_eq!(e2.into_raw(), 3);
        assert_eq!(g.start_rule().unwrap().id(), RuleID::START);

        let ids: Vec<_> = g.rules().map(|rule| rule.id().into_raw()).collect();
        assert_eq!(ids, [1, 2, 3]);

        let alternatives: Vec<_> = g.alternatives("E").map(|rule| rule.id()).collect();
        assert_eq!(alternatives, [e, e2]);
        assert_eq!(g.alternatives("UNKNOWN").count(), 0);
    }

    #[test]
    fn registration_is_idempotent() {
        let mut g = Grammar::new();
        let a = g.add_terminal("A");
        let b = g.add_terminal("A");
        assert_eq!(a, b);
        assert_ne!(a, Symbol::intermediate("A"));
        g.add_intermediate("X");
        g.add_intermediate("X");
        assert_eq!(g.terminals().count(), 1);
        assert_eq!(g.intermediates().count(), 1);
    }

    #[test]
    fn missing_start_rule_is_a_hard_fault() {
        let mut g = Grammar::new();
        g.add_rule("E", [Symbol::terminal("ONE")], "");
        assert!(matches!(
            g.start_rule(),
            Err(BuildError::MissingStartRule { .. })
        ));
    }

    #[test]
    fn check_collects_every_problem() {
        let mut g = Grammar::new();
        g.add_rule(START_RULE_NAME, [Symbol::intermediate("E")], "");
        g.add_rule(START_RULE_NAME, [Symbol::intermediate("F")], "");
        g.add_rule("E", [Symbol::terminal("ONE")], "");
        g.add_rule("F", [Symbol::terminal("ONE")], "");
        g.set_type(START_RULE_NAME, "i64");
        g.set_type("E", "i64");

        let errors: Vec<_> = g.check().into_iter().collect();
        assert_eq!(
            errors,
            [
                GeneratingError::DuplicateStartRule {
                    name: START_RULE_NAME.into(),
                    count: 2
                },
                GeneratingError::MissingType {
                    intermediate: "F".into()
                },
            ]
        );

        let empty = Grammar::new();
        assert!(matches!(
            empty.check().iter().next(),
            Some(GeneratingError::MissingStartRule { .. })
        ));
    }
}

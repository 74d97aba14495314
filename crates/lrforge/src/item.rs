//! Dotted production rules.

use crate::{
    grammar::{Rule, RuleID, Symbol},
    state::StateID,
    types::Set,
    util::write_joined,
};
use std::fmt;

/// The identity of an item without its lookaheads, a.k.a. the LR(0) core.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ItemCore {
    pub rule: RuleID,
    pub dot: usize,
}

#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum ItemKind {
    /// The dot precedes a symbol that can be shifted.
    Shift,
    /// The dot is at the end of the rule.
    Reduce,
}

/// A production rule with a marker of how much of it has been recognized.
///
/// X: Y1 Y2 ... Yn という構文規則に、マーカ位置と先読み記号を付与したもの
#[derive(Debug, Clone)]
pub struct Item<'g> {
    rule: &'g Rule,
    dot: usize,
    lookaheads: Set<Symbol>,
    next_state: Option<StateID>,
}

impl<'g> Item<'g> {
    pub fn new(rule: &'g Rule, dot: usize, lookaheads: Set<Symbol>) -> Self {
        debug_assert!(dot <= rule.right().len(), "the dot is out of the rule");
        Self {
            rule,
            dot,
            lookaheads,
            next_state: None,
        }
    }

    pub fn rule(&self) -> &'g Rule {
        self.rule
    }

    pub fn dot(&self) -> usize {
        self.dot
    }

    pub fn core(&self) -> ItemCore {
        ItemCore {
            rule: self.rule.id(),
            dot: self.dot,
        }
    }

    pub fn kind(&self) -> ItemKind {
        if self.is_dot_at_end() {
            ItemKind::Reduce
        } else {
            ItemKind::Shift
        }
    }

    pub fn lookaheads(&self) -> &Set<Symbol> {
        &self.lookaheads
    }

    pub(crate) fn lookaheads_mut(&mut self) -> &mut Set<Symbol> {
        &mut self.lookaheads
    }

    /// The state reached by shifting the next symbol, once it is known.
    pub fn next_state(&self) -> Option<StateID> {
        self.next_state
    }

    pub(crate) fn set_next_state(&mut self, target: StateID) {
        self.next_state.replace(target);
    }

    pub fn is_dot_at_end(&self) -> bool {
        self.dot == self.rule.right().len()
    }

    /// Whether this item completes the augmenting start rule.
    pub fn is_accepting(&self) -> bool {
        self.rule.is_start() && self.is_dot_at_end()
    }

    /// The symbol right after the dot.
    pub fn next_symbol(&self) -> Option<&'g Symbol> {
        self.rule.right().get(self.dot)
    }

    pub fn is_next_symbol_equal_to(&self, symbol: &Symbol) -> bool {
        self.next_symbol() == Some(symbol)
    }

    /// The symbols following the next symbol.
    ///
    /// For `[X -> a @ Y beta]` this is `beta`.
    pub fn rest(&self) -> &'g [Symbol] {
        self.rule.right().get(self.dot + 1..).unwrap_or(&[])
    }

    /// Return a copy of this item with the dot moved over the next symbol.
    pub fn advance(&self) -> Option<Self> {
        if self.is_dot_at_end() {
            return None;
        }
        Some(Self::new(self.rule, self.dot + 1, self.lookaheads.clone()))
    }
}

// `"E ::= E • ADD B, EOI/ADD"`
impl fmt::Display for Item<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} ::=", self.rule.left())?;
        for (i, symbol) in self.rule.right().iter().enumerate() {
            if i == self.dot {
                f.write_str(" •")?;
            }
            write!(f, " {}", symbol)?;
        }
        if self.is_dot_at_end() {
            f.write_str(" •")?;
        }
        if !self.lookaheads.is_empty() {
            f.write_str(", ")?;
            write_joined(f, &self.lookaheads, "/")?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::grammar::{Grammar, START_RULE_NAME};

    #[test]
    fn classification() {
        let mut g = Grammar::new();
        let start = g.add_rule(START_RULE_NAME, [Symbol::intermediate("E")], "");
        let plus = g.add_rule(
            "E",
            [
                Symbol::intermediate("E"),
                Symbol::terminal("ADD"),
                Symbol::intermediate("B"),
            ],
            "",
        );

        let item = Item::new(g.rule(plus), 1, Set::default());
        assert_eq!(item.kind(), ItemKind::Shift);
        assert!(item.is_next_symbol_equal_to(&Symbol::terminal("ADD")));
        assert!(!item.is_next_symbol_equal_to(&Symbol::intermediate("ADD")));
        assert_eq!(item.rest(), [Symbol::intermediate("B")]);
        assert_eq!(item.next_state(), None);

        let done = item.advance().and_then(|item| item.advance()).unwrap();
        assert!(done.is_dot_at_end());
        assert_eq!(done.kind(), ItemKind::Reduce);
        assert!(!done.is_accepting());
        assert!(done.advance().is_none());
        assert!(done.rest().is_empty());

        let accept = Item::new(g.rule(start), 1, Set::default());
        assert!(accept.is_accepting());
    }

    #[test]
    fn display_marks_the_dot_and_lookaheads() {
        let mut g = Grammar::new();
        let id = g.add_rule(
            "E",
            [
                Symbol::intermediate("E"),
                Symbol::terminal("ADD"),
                Symbol::intermediate("B"),
            ],
            "",
        );
        let lookaheads = [Symbol::terminal("EOI"), Symbol::terminal("ADD")]
            .into_iter()
            .collect();
        let item = Item::new(g.rule(id), 1, lookaheads);
        assert_eq!(item.to_string(), "E ::= E • ADD B, EOI/ADD");

        let end = Item::new(g.rule(id), 3, Set::default());
        assert_eq!(end.to_string(), "E ::= E ADD B •");
    }
}

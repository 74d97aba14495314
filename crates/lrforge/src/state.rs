//! Automaton states and the per-class closure and merge policies.

use crate::{
    error::{BuildError, Errors, GeneratingError},
    first_sets::FirstSets,
    grammar::{Grammar, Rule, RuleID, Symbol},
    item::{Item, ItemCore},
    types::{Map, Set},
};
use indexmap::map::Entry;
use std::fmt;

#[derive(Copy, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct StateID(u32);

impl fmt::Debug for StateID {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "S#{:03}", self.0)
    }
}

impl fmt::Display for StateID {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Display::fmt(&self.0, f)
    }
}

impl StateID {
    pub const START: Self = Self(0);

    pub const fn from_raw(raw: u32) -> Self {
        Self(raw)
    }

    pub const fn into_raw(self) -> u32 {
        self.0
    }

    pub(crate) fn from_index(index: usize) -> Self {
        assert!(index <= u32::MAX as usize, "too many states");
        Self(index as u32)
    }

    pub(crate) fn index(self) -> usize {
        self.0 as usize
    }
}

/// The grammar class, which selects how states are closed and merged.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash)]
pub enum GrammarClass {
    /// Items carry no lookaheads; states with the same cores are merged.
    LR0,

    /// Knuth's canonical LR(1): states are merged only if their items and
    /// lookaheads are all equal.
    LR1,

    /// States with the same LR(0) cores are merged, unioning their lookaheads.
    LALR1,
}

impl fmt::Display for GrammarClass {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::LR0 => f.write_str("LR(0)"),
            Self::LR1 => f.write_str("LR(1)"),
            Self::LALR1 => f.write_str("LALR(1)"),
        }
    }
}

/// The action that the automaton in a state performs on a particular
/// lookahead symbol.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum Action {
    /// Read the lookahead symbol and transition to the specified state.
    Shift(StateID),

    /// Reduce to the specified production rule.
    Reduce(RuleID),

    Accept,

    /// No item in the state admits the lookahead symbol.
    Error,
}

/// A set of items forming one state of the automaton.
#[derive(Debug, Clone)]
pub struct ParserState<'g> {
    class: GrammarClass,
    number: Option<StateID>,
    items: Map<ItemCore, Item<'g>>,
    closed: bool,
}

impl<'g> ParserState<'g> {
    /// Create an empty draft state.
    pub fn new(class: GrammarClass) -> Self {
        Self {
            class,
            number: None,
            items: Map::default(),
            closed: false,
        }
    }

    /// Create the draft of the start state, `[START -> @ S] {$eoi}`.
    pub fn create_start_state(
        class: GrammarClass,
        grammar: &'g Grammar,
        end_of_input: &Symbol,
    ) -> Result<Self, BuildError> {
        let rule = grammar.start_rule()?;
        let mut state = Self::new(class);
        let lookaheads = Some(end_of_input.clone()).into_iter().collect();
        state.add_item(rule, 0, &lookaheads);
        Ok(state)
    }

    pub fn class(&self) -> GrammarClass {
        self.class
    }

    /// The position of this state in the canonical collection, or `None`
    /// while it is still a draft.
    pub fn number(&self) -> Option<StateID> {
        self.number
    }

    pub(crate) fn set_number(&mut self, number: StateID) {
        self.number.replace(number);
    }

    /// Iterate over the items in insertion order.
    pub fn items(&self) -> impl Iterator<Item = &Item<'g>> + '_ {
        self.items.values()
    }

    pub(crate) fn cores(&self) -> Vec<ItemCore> {
        self.items.keys().copied().collect()
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    pub fn is_closed(&self) -> bool {
        self.closed
    }

    /// Add an item, or union `lookaheads` into the item with the same core.
    ///
    /// Returns whether the state changed. LR(0) states ignore lookaheads.
    pub fn add_item(&mut self, rule: &'g Rule, dot: usize, lookaheads: &Set<Symbol>) -> bool {
        let core = ItemCore {
            rule: rule.id(),
            dot,
        };
        let class = self.class;
        let closed = self.closed;
        match self.items.entry(core) {
            Entry::Occupied(mut entry) => {
                if class == GrammarClass::LR0 {
                    return false;
                }
                let existing = entry.get_mut().lookaheads_mut();
                let mut changed = false;
                for lookahead in lookaheads {
                    changed |= existing.insert(lookahead.clone());
                }
                changed
            }
            Entry::Vacant(entry) => {
                debug_assert!(!closed, "adding a new item to a closed state");
                let lookaheads = match class {
                    GrammarClass::LR0 => Set::default(),
                    GrammarClass::LR1 | GrammarClass::LALR1 => lookaheads.clone(),
                };
                entry.insert(Item::new(rule, dot, lookaheads));
                true
            }
        }
    }

    /// Expand every intermediate right after a dot into its alternatives.
    ///
    /// A state is closed once; later calls do nothing.
    pub fn close(&mut self, grammar: &'g Grammar, first_sets: &FirstSets) {
        if self.closed {
            return;
        }
        match self.class {
            GrammarClass::LR0 => self.close_lr0(grammar),
            GrammarClass::LR1 | GrammarClass::LALR1 => self.close_lr1(grammar, first_sets),
        }
        self.closed = true;
    }

    fn close_lr0(&mut self, grammar: &'g Grammar) {
        let no_lookaheads = Set::default();
        let mut visited = Set::<&'g str>::default();
        let mut i = 0;
        while let Some((_, item)) = self.items.get_index(i) {
            i += 1;
            let symbol = match item.next_symbol() {
                Some(symbol) if symbol.is_intermediate() => symbol,
                _ => continue,
            };
            if !visited.insert(symbol.name()) {
                continue;
            }
            for rule in grammar.alternatives(symbol.name()) {
                self.add_item(rule, 0, &no_lookaheads);
            }
        }
    }

    fn close_lr1(&mut self, grammar: &'g Grammar, first_sets: &FirstSets) {
        // 先読み記号が増えなくなるまで繰り返す
        let mut changed = true;
        while changed {
            changed = false;

            let mut i = 0;
            while let Some((_, item)) = self.items.get_index(i) {
                i += 1;

                // [X -> ... @ Y beta]
                //  Y: one intermediate symbol
                let symbol = match item.next_symbol() {
                    Some(symbol) if symbol.is_intermediate() => symbol,
                    _ => continue,
                };

                // lookaheads = {x1,x2,...,xk} としたとき、
                //   First(beta x1) \cup ... \cup First(beta xk)
                let lookaheads = first_sets.first_with(item.rest(), item.lookaheads());
                for rule in grammar.alternatives(symbol.name()) {
                    changed |= self.add_item(rule, 0, &lookaheads);
                }
            }
        }
        tracing::trace!("closed an {} state with {} items", self.class, self.items.len());
    }

    /// Whether `other` is the same state in the sense of this grammar class.
    ///
    /// Items are compared pairwise in iteration order: LR(0) and LALR(1)
    /// look at the cores only, LR(1) at the lookaheads too.
    pub fn is_mergeable_with(&self, other: &Self) -> bool {
        if self.class != other.class || self.items.len() != other.items.len() {
            return false;
        }
        self.items
            .values()
            .zip(other.items.values())
            .all(|(left, right)| {
                left.core() == right.core()
                    && match self.class {
                        GrammarClass::LR1 => left.lookaheads() == right.lookaheads(),
                        GrammarClass::LR0 | GrammarClass::LALR1 => true,
                    }
            })
    }

    /// Union the lookaheads of `other` into the paired items of this state.
    ///
    /// Returns whether any lookahead set grew.
    pub fn merge(&mut self, other: &Self) -> bool {
        debug_assert!(self.is_mergeable_with(other), "merging unrelated states");
        let mut changed = false;
        for (mine, theirs) in self.items.values_mut().zip(other.items.values()) {
            let lookaheads = mine.lookaheads_mut();
            for lookahead in theirs.lookaheads() {
                changed |= lookaheads.insert(lookahead.clone());
            }
        }
        changed
    }

    /// Bucket the items by their next symbol and advance the dot, yielding
    /// one unclosed draft per symbol.
    ///
    /// Kernel items of a draft are ordered by (rule, dot), so that drafts
    /// with the same kernel close into the same item order.
    pub fn create_successor_states(&self) -> Vec<(&'g Symbol, ParserState<'g>)> {
        let mut kernels = Map::<&'g Symbol, Vec<Item<'g>>>::default();
        for item in self.items.values() {
            if let (Some(symbol), Some(advanced)) = (item.next_symbol(), item.advance()) {
                kernels.entry(symbol).or_default().push(advanced);
            }
        }

        kernels
            .into_iter()
            .map(|(symbol, mut kernel)| {
                kernel.sort_by_key(Item::core);
                let mut draft = ParserState::new(self.class);
                for item in &kernel {
                    draft.add_item(item.rule(), item.dot(), item.lookaheads());
                }
                (symbol, draft)
            })
            .collect()
    }

    /// Record `target` as the state reached by shifting `symbol`.
    pub fn assign_successors(&mut self, symbol: &Symbol, target: StateID) {
        for item in self.items.values_mut() {
            if item.is_next_symbol_equal_to(symbol) {
                item.set_next_state(target);
            }
        }
    }

    /// The state recorded for shifting `symbol`, if any.
    pub fn successor(&self, symbol: &Symbol) -> Option<StateID> {
        self.items
            .values()
            .find(|item| item.is_next_symbol_equal_to(symbol))
            .and_then(Item::next_state)
    }

    /// Compute the action on `terminal`.
    ///
    /// The first item admitting the terminal, in insertion order, decides.
    pub fn action(&self, terminal: &str, end_of_input: &str) -> Action {
        for item in self.items.values() {
            match item.next_symbol() {
                Some(symbol) => {
                    if symbol.is_terminal() && symbol.name() == terminal {
                        if let Some(next) = item.next_state() {
                            return Action::Shift(next);
                        }
                    }
                }
                None if item.is_accepting() => {
                    if terminal == end_of_input {
                        return Action::Accept;
                    }
                }
                None => {
                    let admits = match self.class {
                        GrammarClass::LR0 => true,
                        GrammarClass::LR1 | GrammarClass::LALR1 => item
                            .lookaheads()
                            .iter()
                            .any(|lookahead| lookahead.name() == terminal),
                    };
                    if admits {
                        return Action::Reduce(item.rule().id());
                    }
                }
            }
        }
        Action::Error
    }

    /// The state reached after reducing to `intermediate`.
    pub fn goto(&self, intermediate: &str) -> Option<StateID> {
        self.items
            .values()
            .find(|item| {
                item.next_symbol()
                    .map_or(false, |s| s.is_intermediate() && s.name() == intermediate)
            })
            .and_then(Item::next_state)
    }

    /// Whether every terminal of the grammar, and the end of input, leads
    /// to the same action.
    pub fn is_same_action_for_all_terminals(&self, grammar: &Grammar, end_of_input: &str) -> bool {
        let mut terminals = grammar.terminals().chain(
            Some(end_of_input).filter(|&eoi| !grammar.is_terminal(eoi)),
        );
        let first = match terminals.next() {
            Some(terminal) => self.action(terminal, end_of_input),
            None => return true,
        };
        terminals.all(|terminal| self.action(terminal, end_of_input) == first)
    }

    /// Report reduce/reduce and multiple-accept conflicts in this state.
    ///
    /// LR(1) and LALR(1) reduce items conflict only when their lookaheads
    /// intersect.
    ///
    /// The multiple-accept report is a defensive check: items are keyed by
    /// their core and only [`RuleID::START`] accepts, so a state built by
    /// this crate holds at most one accepting item.
    pub fn check(&self, errors: &mut Errors<GeneratingError>) {
        let state = match self.number {
            Some(number) => number,
            None => return,
        };

        let reduces: Vec<&Item<'g>> = self
            .items
            .values()
            .filter(|item| item.is_dot_at_end() && !item.rule().is_start())
            .collect();
        let conflicting: Vec<String> = reduces
            .iter()
            .enumerate()
            .filter(|(i, item)| {
                reduces.iter().enumerate().any(|(j, other)| {
                    *i != j
                        && match self.class {
                            GrammarClass::LR0 => true,
                            GrammarClass::LR1 | GrammarClass::LALR1 => !item
                                .lookaheads()
                                .is_disjoint(other.lookaheads()),
                        }
                })
            })
            .map(|(_, item)| item.to_string())
            .collect();
        if !conflicting.is_empty() {
            errors.push(GeneratingError::ReduceReduceConflict {
                state,
                items: conflicting,
            });
        }

        let accepts: Vec<String> = self
            .items
            .values()
            .filter(|item| item.is_accepting())
            .map(|item| item.to_string())
            .collect();
        if accepts.len() > 1 {
            errors.push(GeneratingError::MultipleAccept {
                state,
                items: accepts,
            });
        }
    }

    /// The total number of lookaheads over every item.
    pub(crate) fn lookahead_count(&self) -> usize {
        self.items.values().map(|item| item.lookaheads().len()).sum()
    }
}

impl fmt::Display for ParserState<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for item in self.items.values() {
            writeln!(f, "{}", item)?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::grammar::START_RULE_NAME;

    fn t(name: &str) -> Symbol {
        Symbol::terminal(name)
    }

    fn n(name: &str) -> Symbol {
        Symbol::intermediate(name)
    }

    // START ::= E ; E ::= E ADD B | B ; B ::= ZERO | ONE
    fn arithmetic() -> Grammar {
        let mut g = Grammar::new();
        g.add_rule(START_RULE_NAME, [n("E")], "");
        g.add_rule("E", [n("E"), t("ADD"), n("B")], "");
        g.add_rule("E", [n("B")], "");
        g.add_rule("B", [t("ZERO")], "");
        g.add_rule("B", [t("ONE")], "");
        g
    }

    fn closed_start(class: GrammarClass, g: &Grammar) -> ParserState<'_> {
        let first_sets = FirstSets::new(g);
        let mut state = ParserState::create_start_state(class, g, &t("EOI")).unwrap();
        state.close(g, &first_sets);
        state
    }

    #[test]
    fn lr0_closure() {
        let g = arithmetic();
        let state = closed_start(GrammarClass::LR0, &g);
        let items: Vec<_> = state.items().map(|item| item.to_string()).collect();
        assert_eq!(
            items,
            [
                "START ::= • E",
                "E ::= • E ADD B",
                "E ::= • B",
                "B ::= • ZERO",
                "B ::= • ONE",
            ]
        );
        assert!(state.is_closed());
    }

    #[test]
    fn lr1_closure_computes_lookaheads() {
        let g = arithmetic();
        let state = closed_start(GrammarClass::LR1, &g);
        let items: Vec<_> = state.items().map(|item| item.to_string()).collect();
        assert_eq!(
            items,
            [
                "START ::= • E, EOI",
                "E ::= • E ADD B, EOI/ADD",
                "E ::= • B, EOI/ADD",
                "B ::= • ZERO, EOI/ADD",
                "B ::= • ONE, EOI/ADD",
            ]
        );
    }

    #[test]
    fn closing_twice_is_a_no_op() {
        let g = arithmetic();
        let first_sets = FirstSets::new(&g);
        let mut state = closed_start(GrammarClass::LALR1, &g);
        let len = state.len();
        state.close(&g, &first_sets);
        assert_eq!(state.len(), len);
    }

    #[test]
    fn add_item_unions_lookaheads_of_the_same_core() {
        let g = arithmetic();
        let rule = g.start_rule().unwrap();
        let eoi: Set<Symbol> = Some(t("EOI")).into_iter().collect();
        let add: Set<Symbol> = Some(t("ADD")).into_iter().collect();

        let mut state = ParserState::new(GrammarClass::LALR1);
        assert!(state.add_item(rule, 0, &eoi));
        assert!(state.add_item(rule, 0, &add));
        assert!(!state.add_item(rule, 0, &add));
        assert_eq!(state.len(), 1);
        assert_eq!(state.items().next().unwrap().lookaheads().len(), 2);

        let mut lr0 = ParserState::new(GrammarClass::LR0);
        assert!(lr0.add_item(rule, 0, &eoi));
        assert!(!lr0.add_item(rule, 0, &add));
        assert!(lr0.items().next().unwrap().lookaheads().is_empty());
    }

    #[test]
    fn merge_policies() {
        let g = arithmetic();
        let rule = g.start_rule().unwrap();
        let eoi: Set<Symbol> = Some(t("EOI")).into_iter().collect();
        let add: Set<Symbol> = Some(t("ADD")).into_iter().collect();

        for class in [GrammarClass::LR1, GrammarClass::LALR1] {
            let mut left = ParserState::new(class);
            left.add_item(rule, 1, &eoi);
            let mut right = ParserState::new(class);
            right.add_item(rule, 1, &add);
            let mut same = ParserState::new(class);
            same.add_item(rule, 1, &eoi);

            assert!(left.is_mergeable_with(&same));
            match class {
                GrammarClass::LR1 => assert!(!left.is_mergeable_with(&right)),
                _ => {
                    assert!(left.is_mergeable_with(&right));
                    assert!(left.merge(&right));
                    assert!(!left.merge(&right));
                    let lookaheads = left.items().next().unwrap().lookaheads();
                    assert!(lookaheads.contains(&t("EOI")));
                    assert!(lookaheads.contains(&t("ADD")));
                }
            }
        }
    }

    #[test]
    fn successors_are_bucketed_by_symbol() {
        let g = arithmetic();
        let state = closed_start(GrammarClass::LALR1, &g);
        let drafts = state.create_successor_states();
        let symbols: Vec<_> = drafts.iter().map(|(symbol, _)| symbol.name()).collect();
        assert_eq!(symbols, ["E", "B", "ZERO", "ONE"]);

        let (_, on_e) = &drafts[0];
        let items: Vec<_> = on_e.items().map(|item| item.to_string()).collect();
        assert_eq!(items, ["START ::= E •, EOI", "E ::= E • ADD B, EOI/ADD"]);
        assert!(!on_e.is_closed());
    }

    #[test]
    fn actions_and_gotos() {
        let g = arithmetic();
        let mut state = closed_start(GrammarClass::LALR1, &g);
        state.assign_successors(&t("ONE"), StateID::from_raw(4));
        state.assign_successors(&n("E"), StateID::from_raw(1));

        assert_eq!(state.action("ONE", "EOI"), Action::Shift(StateID::from_raw(4)));
        // successor not recorded yet
        assert_eq!(state.action("ZERO", "EOI"), Action::Error);
        assert_eq!(state.action("ADD", "EOI"), Action::Error);
        assert_eq!(state.goto("E"), Some(StateID::from_raw(1)));
        assert_eq!(state.goto("B"), None);
        assert_eq!(state.goto("UNKNOWN"), None);
        assert!(!state.is_same_action_for_all_terminals(&g, "EOI"));
    }

    #[test]
    fn reduce_items_follow_lookaheads() {
        let g = arithmetic();
        let rule = g.alternatives("B").next().unwrap();
        let eoi: Set<Symbol> = Some(t("EOI")).into_iter().collect();

        let mut lalr = ParserState::new(GrammarClass::LALR1);
        lalr.add_item(rule, 1, &eoi);
        assert_eq!(lalr.action("EOI", "EOI"), Action::Reduce(rule.id()));
        assert_eq!(lalr.action("ADD", "EOI"), Action::Error);
        assert!(!lalr.is_same_action_for_all_terminals(&g, "EOI"));

        let mut lr0 = ParserState::new(GrammarClass::LR0);
        lr0.add_item(rule, 1, &eoi);
        assert_eq!(lr0.action("ADD", "EOI"), Action::Reduce(rule.id()));
        assert!(lr0.is_same_action_for_all_terminals(&g, "EOI"));
    }
}

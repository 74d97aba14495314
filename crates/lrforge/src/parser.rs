//! Construction of the canonical collection of states.

use crate::{
    error::BuildError,
    first_sets::FirstSets,
    grammar::{Grammar, Symbol},
    item::ItemCore,
    parse_table::ParseTable,
    state::{GrammarClass, ParserState, StateID},
    types::{Map, Worklist},
};
use std::borrow::Cow;

/// The terminal name used for the end of input unless configured otherwise.
pub const DEFAULT_END_OF_INPUT: &str = "EOI";

#[derive(Debug, Clone)]
pub struct Config {
    class: GrammarClass,
    end_of_input: Cow<'static, str>,
}

impl Default for Config {
    fn default() -> Self {
        Self::new()
    }
}

impl Config {
    pub const fn new() -> Self {
        Self {
            class: GrammarClass::LALR1,
            end_of_input: Cow::Borrowed(DEFAULT_END_OF_INPUT),
        }
    }

    /// Build an LR(0) automaton.
    pub fn use_lr0(&mut self) -> &mut Self {
        self.class = GrammarClass::LR0;
        self
    }

    /// Build a canonical LR(1) automaton.
    pub fn use_lr1(&mut self) -> &mut Self {
        self.class = GrammarClass::LR1;
        self
    }

    /// Build an LALR(1) automaton. This is the default.
    pub fn use_lalr1(&mut self) -> &mut Self {
        self.class = GrammarClass::LALR1;
        self
    }

    pub fn use_class(&mut self, class: GrammarClass) -> &mut Self {
        self.class = class;
        self
    }

    /// Set the name of the terminal marking the end of input.
    pub fn eoi(&mut self, name: impl Into<String>) -> &mut Self {
        self.end_of_input = Cow::Owned(name.into());
        self
    }

    pub fn class(&self) -> GrammarClass {
        self.class
    }

    pub fn end_of_input(&self) -> &str {
        &self.end_of_input
    }

    /// Construct the parse table of `grammar` with these settings.
    pub fn generate<'g>(&self, grammar: &'g Grammar) -> Result<ParseTable<'g>, BuildError> {
        ParseTable::generate(grammar, self)
    }
}

/// The worklist driver building every state reachable from the start state.
#[derive(Debug)]
pub struct Parser<'g> {
    grammar: &'g Grammar,
    class: GrammarClass,
    end_of_input: Symbol,
    first_sets: FirstSets,
    states: Vec<ParserState<'g>>,
    // 同じLR(0)コアを持つ状態の番号
    same_cores: Map<Vec<ItemCore>, Vec<StateID>>,
}

impl<'g> Parser<'g> {
    pub fn new(grammar: &'g Grammar, class: GrammarClass, end_of_input: &str) -> Self {
        Self {
            grammar,
            class,
            end_of_input: Symbol::terminal(end_of_input),
            first_sets: FirstSets::new(grammar),
            states: vec![],
            same_cores: Map::default(),
        }
    }

    pub fn grammar(&self) -> &'g Grammar {
        self.grammar
    }

    pub fn class(&self) -> GrammarClass {
        self.class
    }

    pub fn end_of_input(&self) -> &Symbol {
        &self.end_of_input
    }

    pub fn states(&self) -> &[ParserState<'g>] {
        &self.states[..]
    }

    pub fn into_states(self) -> Vec<ParserState<'g>> {
        self.states
    }

    /// Build the canonical collection of states.
    ///
    /// Fails only if the grammar has no start rule, before any state is
    /// built. Calling this again after a success does nothing.
    pub fn generate_states(&mut self) -> Result<(), BuildError> {
        if !self.states.is_empty() {
            return Ok(());
        }

        let start = ParserState::create_start_state(self.class, self.grammar, &self.end_of_input)?;
        self.add_new_state(start);

        // 新規に状態が生成されなくなるまで後続状態の生成を繰り返す
        let mut current = 0;
        while current < self.states.len() {
            let id = StateID::from_index(current);
            let lookaheads_before = self.states[current].lookahead_count();

            for (symbol, draft) in self.states[current].create_successor_states() {
                let target = self.add_new_state(draft);
                self.states[current].assign_successors(symbol, target);
            }

            // Drafts taken above miss lookaheads merged into this state while
            // its successors were being recorded.
            if self.states[current].lookahead_count() != lookaheads_before {
                self.propagate(id);
            }

            current += 1;
        }

        tracing::info!(
            "built {} automaton with {} states",
            self.class,
            self.states.len()
        );
        Ok(())
    }

    fn add_new_state(&mut self, mut state: ParserState<'g>) -> StateID {
        state.close(self.grammar, &self.first_sets);
        self.add_or_merge_state(state)
    }

    /// Append `state` to the collection, or merge it into the first
    /// existing state compatible with it.
    fn add_or_merge_state(&mut self, mut state: ParserState<'g>) -> StateID {
        let cores = state.cores();

        // 互換性のある状態が存在する場合はその状態を修正し、新規に状態は生成しない
        let found = self.same_cores.get(&cores).and_then(|candidates| {
            candidates
                .iter()
                .copied()
                .find(|id| self.states[id.index()].is_mergeable_with(&state))
        });
        if let Some(id) = found {
            if self.states[id.index()].merge(&state) {
                tracing::debug!("merged new lookaheads into state {}", id);
                self.propagate(id);
            }
            return id;
        }

        let id = StateID::from_index(self.states.len());
        state.set_number(id);
        self.states.push(state);
        self.same_cores.entry(cores).or_default().push(id);
        tracing::debug!("added state {}", id);
        id
    }

    /// Carry lookaheads that grew in `from` over to the states already
    /// derived from it, transitively.
    fn propagate(&mut self, from: StateID) {
        let mut worklist = Worklist::default();
        worklist.push(from);

        while let Some(id) = worklist.pop() {
            let drafts = self.states[id.index()].create_successor_states();
            for (symbol, mut draft) in drafts {
                // 後続状態が未生成の場合は、その生成時に先読み記号が反映される
                let target = match self.states[id.index()].successor(symbol) {
                    Some(target) => target,
                    None => continue,
                };

                draft.close(self.grammar, &self.first_sets);
                let successor = &mut self.states[target.index()];
                if !successor.is_mergeable_with(&draft) {
                    tracing::warn!(
                        "state {} does not match the successor of state {} on {}",
                        target,
                        id,
                        symbol
                    );
                    continue;
                }
                if successor.merge(&draft) {
                    tracing::debug!("propagated lookaheads from state {} to state {}", id, target);
                    worklist.push(target);
                }
            }
        }
    }
}

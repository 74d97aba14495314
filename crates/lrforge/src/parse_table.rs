//! The finished automaton, as handed to code generators.

use crate::{
    error::{BuildError, Errors, GeneratingError},
    grammar::{Grammar, START_RULE_NAME},
    parser::{Config, Parser},
    state::{Action, GrammarClass, ParserState, StateID},
    util::display_fn,
};
use std::fmt;

#[derive(Debug)]
pub struct ParseTable<'g> {
    grammar: &'g Grammar,
    class: GrammarClass,
    end_of_input: String,
    states: Vec<ParserState<'g>>,
}

impl<'g> ParseTable<'g> {
    /// Build the automaton of `grammar` as configured.
    pub fn generate(grammar: &'g Grammar, config: &Config) -> Result<Self, BuildError> {
        let mut parser = Parser::new(grammar, config.class(), config.end_of_input());
        parser.generate_states()?;
        Ok(Self {
            grammar,
            class: config.class(),
            end_of_input: config.end_of_input().to_owned(),
            states: parser.into_states(),
        })
    }

    pub fn grammar(&self) -> &'g Grammar {
        self.grammar
    }

    pub fn class(&self) -> GrammarClass {
        self.class
    }

    pub fn end_of_input(&self) -> &str {
        &self.end_of_input
    }

    pub fn states(&self) -> impl Iterator<Item = (StateID, &ParserState<'g>)> + '_ {
        self.states
            .iter()
            .enumerate()
            .map(|(i, state)| (StateID::from_index(i), state))
    }

    pub fn state(&self, id: StateID) -> &ParserState<'g> {
        &self.states[id.index()]
    }

    pub fn start_state(&self) -> &ParserState<'g> {
        self.state(StateID::START)
    }

    pub fn len(&self) -> usize {
        self.states.len()
    }

    pub fn is_empty(&self) -> bool {
        self.states.is_empty()
    }

    pub fn action(&self, state: StateID, terminal: &str) -> Action {
        self.state(state).action(terminal, &self.end_of_input)
    }

    pub fn goto(&self, state: StateID, intermediate: &str) -> Option<StateID> {
        self.state(state).goto(intermediate)
    }

    /// Collect the conflicts of every state.
    pub fn check(&self) -> Errors<GeneratingError> {
        let mut errors = Errors::default();
        for state in &self.states {
            state.check(&mut errors);
        }
        for err in &errors {
            tracing::warn!("{}", err);
        }
        errors
    }

    fn terminal_columns(&self) -> Vec<&str> {
        let mut columns: Vec<&str> = self.grammar.terminals().collect();
        if !self.grammar.is_terminal(&self.end_of_input) {
            columns.push(&self.end_of_input);
        }
        columns
    }

    fn intermediate_columns(&self) -> Vec<&str> {
        self.grammar
            .intermediates()
            .filter(|name| *name != START_RULE_NAME)
            .collect()
    }

    /// Render the rules, the action/goto grid and the item sets.
    pub fn display(&self) -> impl fmt::Display + '_ {
        display_fn(move |f| {
            writeln!(f, "## rules")?;
            write!(f, "{}", self.grammar.display_rules())?;

            writeln!(f, "\n## {} table", self.class)?;
            let terminals = self.terminal_columns();
            let intermediates = self.intermediate_columns();

            let mut rows = vec![];
            let mut header = vec![String::new()];
            header.extend(terminals.iter().map(|t| t.to_string()));
            header.extend(intermediates.iter().map(|n| n.to_string()));
            rows.push(header);
            for (id, state) in self.states() {
                let mut row = vec![id.to_string()];
                for terminal in &terminals {
                    row.push(match state.action(terminal, &self.end_of_input) {
                        Action::Shift(next) => format!("S{}", next),
                        Action::Reduce(rule) => format!("R{}", rule),
                        Action::Accept => "ACC".to_owned(),
                        Action::Error => String::new(),
                    });
                }
                for intermediate in &intermediates {
                    row.push(
                        state
                            .goto(intermediate)
                            .map_or_else(String::new, |next| next.to_string()),
                    );
                }
                rows.push(row);
            }

            let mut widths = vec![0; terminals.len() + intermediates.len() + 1];
            for row in &rows {
                for (width, cell) in widths.iter_mut().zip(row) {
                    *width = (*width).max(cell.chars().count());
                }
            }
            for row in &rows {
                let mut line = String::new();
                for (i, (cell, &width)) in row.iter().zip(&widths).enumerate() {
                    if i == terminals.len() + 1 {
                        line.push_str(" |");
                    }
                    if i > 0 {
                        line.push(' ');
                    }
                    line.push_str(&format!("{:<width$}", cell, width = width));
                }
                writeln!(f, "{}", line.trim_end())?;
            }

            writeln!(f, "\n## states")?;
            for (id, state) in self.states() {
                writeln!(f, "State {}:", id)?;
                for item in state.items() {
                    writeln!(f, "  {}", item)?;
                }
            }
            Ok(())
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::grammar::Symbol;

    #[test]
    fn dump_layout() {
        let mut g = Grammar::new();
        g.add_rule(START_RULE_NAME, [Symbol::intermediate("S")], "{ $1 }");
        g.add_rule("S", [Symbol::terminal("a")], "{ 1 }");

        let table = Config::new().use_lr0().generate(&g).unwrap();
        let dump = table.display().to_string();
        let expected = "\
## rules
[1] START ::= S  { $1 }
[2] S ::= a  { 1 }

## LR(0) table
  a  EOI | S
0 S2     | 1
1    ACC |
2 R2 R2  |

## states
State 0:
  START ::= • S
  S ::= • a
State 1:
  START ::= S •
State 2:
  S ::= a •
";
        assert_eq!(dump, expected);
    }

    #[test]
    fn unmatched_lookups() {
        let mut g = Grammar::new();
        g.add_rule(START_RULE_NAME, [Symbol::intermediate("S")], "");
        g.add_rule("S", [Symbol::terminal("a")], "");

        let table = Config::new().generate(&g).unwrap();
        assert_eq!(table.len(), 3);
        assert_eq!(table.action(StateID::START, "b"), Action::Error);
        assert_eq!(table.action(StateID::START, "EOI"), Action::Error);
        assert_eq!(table.goto(StateID::START, "T"), None);
        assert_eq!(table.goto(StateID::START, "S"), Some(StateID::from_raw(1)));
        assert!(table.check().is_empty());
    }
}

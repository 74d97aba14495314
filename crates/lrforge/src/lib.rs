//! Construction of LR(0), LR(1) and LALR(1) parse automata.

pub mod error;
pub mod first_sets;
pub mod grammar;
pub mod item;
pub mod parse_table;
pub mod parser;
pub mod state;
pub mod syntax;
pub mod types;
pub mod util;

pub use crate::{
    error::{BuildError, Errors, GeneratingError},
    grammar::{Grammar, Rule, RuleID, Symbol, START_RULE_NAME},
    parse_table::ParseTable,
    parser::Config,
    state::{Action, GrammarClass, StateID},
};

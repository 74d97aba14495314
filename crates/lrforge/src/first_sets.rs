//! Calculation of first set function.

use crate::{
    grammar::{Grammar, Symbol},
    types::{Map, Set},
};

/// The FIRST sets and nullable intermediates of a grammar.
#[derive(Debug)]
pub struct FirstSets {
    nulls: Set<String>,
    map: Map<String, Set<Symbol>>,
}

impl FirstSets {
    pub fn new(grammar: &Grammar) -> Self {
        let nulls = nulls_set(grammar);

        // First(N) = {} と初期化する
        let mut map: Map<String, Set<Symbol>> = grammar
            .intermediates()
            .map(|name| (name.to_owned(), Set::default()))
            .collect();

        // X ::= Y1 ... Yn について、Yk を最初の非nullableな記号としたとき
        // First(X) ⊇ First(Yi) (i <= k) を課す
        #[derive(Debug)]
        struct Constraint<'g> {
            sup: &'g str,
            sub: &'g Symbol,
        }
        let mut constraints = vec![];
        for rule in grammar.rules() {
            for symbol in rule.right() {
                // X -> X ... contributes nothing new to First(X)
                if !(symbol.is_intermediate() && symbol.name() == rule.left()) {
                    constraints.push(Constraint {
                        sup: rule.left(),
                        sub: symbol,
                    });
                }
                if !is_nullable_symbol(&nulls, symbol) {
                    break;
                }
            }
        }

        // 不動点に達するまで下位集合を上位集合へ流し込む
        let mut changed = true;
        while changed {
            changed = false;

            for Constraint { sup, sub } in &constraints {
                let added: Vec<Symbol> = if sub.is_terminal() {
                    vec![(*sub).clone()]
                } else {
                    map.get(sub.name())
                        .map(|subset| subset.iter().cloned().collect())
                        .unwrap_or_default()
                };
                let superset = map.entry((*sup).to_owned()).or_default();
                for symbol in added {
                    changed |= superset.insert(symbol);
                }
            }
        }

        Self { nulls, map }
    }

    /// `First(symbols)`
    pub fn first(&self, symbols: &[Symbol]) -> Set<Symbol> {
        self.first_with(symbols, None::<&Symbol>)
    }

    /// `First(prefix lookaheads)`: the terminals beginning `prefix`, plus
    /// `lookaheads` when the whole prefix is nullable.
    pub fn first_with<'a, L>(&self, prefix: &[Symbol], lookaheads: L) -> Set<Symbol>
    where
        L: IntoIterator<Item = &'a Symbol>,
    {
        let mut res = Set::default();
        for symbol in prefix {
            if symbol.is_terminal() {
                res.insert(symbol.clone());
                return res;
            }
            if let Some(first) = self.map.get(symbol.name()) {
                res.extend(first.iter().cloned());
            }
            if !self.nulls.contains(symbol.name()) {
                return res;
            }
        }
        res.extend(lookaheads.into_iter().cloned());
        res
    }

    /// Return whether `symbols` can derive the empty sequence.
    pub fn is_nullable(&self, symbols: &[Symbol]) -> bool {
        symbols
            .iter()
            .all(|symbol| is_nullable_symbol(&self.nulls, symbol))
    }
}

fn is_nullable_symbol(nulls: &Set<String>, symbol: &Symbol) -> bool {
    symbol.is_intermediate() && nulls.contains(symbol.name())
}

/// Calculate the set of nullable intermediates in this grammar.
fn nulls_set(grammar: &Grammar) -> Set<String> {
    let mut nulls = Set::default();

    let mut changed = true;
    while changed {
        changed = false;
        for rule in grammar.rules() {
            if nulls.contains(rule.left()) {
                continue;
            }
            if rule
                .right()
                .iter()
                .all(|symbol| is_nullable_symbol(&nulls, symbol))
            {
                changed = true;
                nulls.insert(rule.left().to_owned());
            }
        }
    }

    nulls
}

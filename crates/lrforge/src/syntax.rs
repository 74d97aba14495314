//! Loader of plain-text grammar files.
//!
//! ```text
//! %token ZERO ONE ADD MULT;
//! %type E { i64 };
//! E ::= E ADD B { $1 + $3 }
//!     | B { $1 }
//!     ;
//! ```

pub mod lexer;

use self::lexer::{Keyword, Lexer, Spanned, Token};
use crate::grammar::{Grammar, Symbol};
use crate::types::Set;
use lexgen_util::Loc;

#[derive(Debug)]
enum Stmt<'input> {
    Token(Vec<&'input str>),
    Type(&'input str, &'input str),
    Rule(&'input str, Vec<Production<'input>>),
}

#[derive(Debug)]
struct Production<'input> {
    elems: Vec<&'input str>,
    action: &'input str,
}

/// Parse the source text of a grammar file.
///
/// Names declared with `%token` are terminals wherever they appear; every
/// other name is an intermediate.
pub fn parse(source: &str) -> anyhow::Result<Grammar> {
    let span = tracing::trace_span!("parse");
    let _entered = span.enter();

    let mut tokens = vec![];
    for res in Lexer::new(source) {
        let tok = res.map_err(|err| {
            anyhow::anyhow!(
                "{}:{}: invalid token ({:?})",
                err.location.line + 1,
                err.location.col + 1,
                err.kind
            )
        })?;
        tracing::trace!("token {:?}", tok);
        tokens.push(tok);
    }

    let stmts = StmtParser {
        tokens: &tokens[..],
        pos: 0,
    }
    .parse_stmts()?;

    let mut terminals: Set<&str> = Set::default();
    for stmt in &stmts {
        if let Stmt::Token(names) = stmt {
            terminals.extend(names.iter().copied());
        }
    }

    let mut grammar = Grammar::new();
    for name in &terminals {
        grammar.add_terminal(name);
    }
    for stmt in &stmts {
        if let Stmt::Type(name, ty) = stmt {
            grammar.set_type(name, strip_braces(ty));
        }
    }
    for stmt in &stmts {
        if let Stmt::Rule(left, productions) = stmt {
            for production in productions {
                let right = production.elems.iter().map(|name| {
                    if terminals.contains(name) {
                        Symbol::terminal(*name)
                    } else {
                        Symbol::intermediate(*name)
                    }
                });
                grammar.add_rule(left, right, production.action);
            }
        }
    }

    Ok(grammar)
}

fn strip_braces(code: &str) -> &str {
    code.strip_prefix('{')
        .and_then(|code| code.strip_suffix('}'))
        .unwrap_or(code)
        .trim()
}

struct StmtParser<'t, 'input> {
    tokens: &'t [Spanned<'input>],
    pos: usize,
}

impl<'input> StmtParser<'_, 'input> {
    fn peek(&self) -> Option<&Token<'input>> {
        self.tokens.get(self.pos).map(|(_, tok, _)| tok)
    }

    fn bump(&mut self) -> Option<Token<'input>> {
        let tok = self.peek().copied();
        if tok.is_some() {
            self.pos += 1;
        }
        tok
    }

    fn unexpected(&self, expected: &str) -> anyhow::Error {
        match self.tokens.get(self.pos) {
            Some((start, tok, _)) => anyhow::anyhow!(
                "{}: expected {}, found {:?}",
                display_loc(start),
                expected,
                tok
            ),
            None => anyhow::anyhow!("expected {}, found end of input", expected),
        }
    }

    fn expect(&mut self, expected: Token<'static>, what: &str) -> anyhow::Result<()> {
        if self.peek() == Some(&expected) {
            self.pos += 1;
            Ok(())
        } else {
            Err(self.unexpected(what))
        }
    }

    fn ident(&mut self) -> anyhow::Result<&'input str> {
        match self.peek() {
            Some(Token::Ident(name)) => {
                let name = *name;
                self.pos += 1;
                Ok(name)
            }
            _ => Err(self.unexpected("an identifier")),
        }
    }

    fn parse_stmts(mut self) -> anyhow::Result<Vec<Stmt<'input>>> {
        let mut stmts = vec![];
        while let Some(&tok) = self.peek() {
            let stmt = match tok {
                Token::Kw(Keyword::Token) => self.parse_token_stmt()?,
                Token::Kw(Keyword::Type) => self.parse_type_stmt()?,
                Token::Ident(..) => self.parse_rule_stmt()?,
                _ => return Err(self.unexpected("a statement")),
            };
            stmts.push(stmt);
        }
        Ok(stmts)
    }

    // %token A B C ;
    fn parse_token_stmt(&mut self) -> anyhow::Result<Stmt<'input>> {
        self.bump();
        let mut names = vec![];
        while let Some(Token::Ident(name)) = self.peek() {
            names.push(*name);
            self.pos += 1;
        }
        self.expect(Token::Semicolon, "`;'")?;
        Ok(Stmt::Token(names))
    }

    // %type Name { ... } ;
    fn parse_type_stmt(&mut self) -> anyhow::Result<Stmt<'input>> {
        self.bump();
        let name = self.ident()?;
        let ty = match self.bump() {
            Some(Token::Code(ty)) => ty,
            _ => {
                self.pos -= 1;
                return Err(self.unexpected("a braced type"));
            }
        };
        self.expect(Token::Semicolon, "`;'")?;
        Ok(Stmt::Type(name, ty))
    }

    // Name ::= elems { action } | ... ;
    fn parse_rule_stmt(&mut self) -> anyhow::Result<Stmt<'input>> {
        let left = self.ident()?;
        self.expect(Token::ColonColonEq, "`::='")?;
        let mut productions = vec![];
        loop {
            let mut elems = vec![];
            let mut action = "";
            loop {
                match self.peek() {
                    Some(Token::Ident(name)) => {
                        elems.push(*name);
                        self.pos += 1;
                    }
                    Some(Token::Code(code)) => {
                        action = *code;
                        self.pos += 1;
                        break;
                    }
                    _ => break,
                }
            }
            productions.push(Production { elems, action });

            match self.bump() {
                Some(Token::VertBar) => continue,
                Some(Token::Semicolon) => break,
                Some(..) => {
                    self.pos -= 1;
                    return Err(self.unexpected("`|' or `;'"));
                }
                None => return Err(self.unexpected("`|' or `;'")),
            }
        }
        Ok(Stmt::Rule(left, productions))
    }
}

fn display_loc(loc: &Loc) -> String {
    format!("{}:{}", loc.line + 1, loc.col + 1)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::grammar::{RuleID, START_RULE_NAME};

    #[test]
    fn arithmetic() {
        let g = parse(
            "\
%token ZERO ONE ADD MULT;
%type START { i64 };
%type E { i64 };
%type B { i64 };

// the augmenting rule
START ::= E { $1 };
E ::= E MULT B { $1 * $3 }
    | E ADD B { $1 + $3 }
    | B { $1 }
    ;
B ::= ZERO { 0 } | ONE { 1 };
",
        )
        .unwrap();

        assert_eq!(
            g.terminals().collect::<Vec<_>>(),
            ["ZERO", "ONE", "ADD", "MULT"]
        );
        assert_eq!(g.declared_type("E"), Some("i64"));
        assert!(g.check().is_empty());

        let start = g.start_rule().unwrap();
        assert_eq!(start.id(), RuleID::START);
        assert_eq!(start.left(), START_RULE_NAME);
        assert_eq!(start.action(), "{ $1 }");

        let mult = g.alternatives("E").next().unwrap();
        assert_eq!(mult.to_string(), "E ::= E MULT B");
        assert!(mult.right()[1].is_terminal());
        assert!(mult.right()[2].is_intermediate());
        assert_eq!(g.alternatives("B").count(), 2);
    }

    #[test]
    fn tokens_declared_after_use() {
        let g = parse("S ::= a S | ; %token a;").unwrap();
        let rules: Vec<_> = g.alternatives("S").collect();
        assert_eq!(rules.len(), 2);
        assert_eq!(rules[0].right(), [Symbol::terminal("a"), Symbol::intermediate("S")]);
        assert!(rules[1].right().is_empty());
        assert_eq!(rules[1].action(), "");
    }

    #[test]
    fn trailing_comment_without_newline() {
        let g = parse("%token a;\nSTART ::= a; // trailing").unwrap();
        assert_eq!(g.start_rule().unwrap().right(), [Symbol::terminal("a")]);
    }

    #[test]
    fn syntax_errors() {
        let err = parse("S ::= a").unwrap_err();
        assert!(err.to_string().contains("end of input"), "{}", err);

        let err = parse("%type S i64;").unwrap_err();
        assert!(err.to_string().starts_with("1:9:"), "{}", err);

        let err = parse("S a;").unwrap_err();
        assert!(err.to_string().contains("`::='"), "{}", err);
    }
}

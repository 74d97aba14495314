//! Lexer of grammar files.

use lexgen_util::Loc;

#[derive(Debug, Copy, Clone, PartialEq)]
pub enum Token<'input> {
    ColonColonEq,
    Semicolon,
    VertBar,
    Kw(Keyword),
    Ident(&'input str),
    /// A brace-delimited block, braces included.
    Code(&'input str),
}

#[derive(Debug, Copy, Clone, PartialEq)]
pub enum Keyword {
    Token,
    Type,
}

pub type Spanned<'input> = (Loc, Token<'input>, Loc);

#[derive(Debug, Default)]
pub struct LexerState {
    brace_depth: usize,
}

lexgen::lexer! {
    pub Lexer(LexerState) -> Token<'input>;

    let whitespace = [' ' '\t' '\n' '\r'];
    let newline = '\r'* '\n' | '\r';
    let ident = $$XID_Start $$XID_Continue*;

    rule Init {
        $whitespace+,
        "//" => |lexer| {
            lexer.switch(LexerRule::LineComment)
        },
        "{" => |lexer| {
            lexer.state().brace_depth = 1;
            lexer.switch(LexerRule::Code)
        },
        "::=" = Token::ColonColonEq,
        ";" = Token::Semicolon,
        "|" = Token::VertBar,
        "%token" = Token::Kw(Keyword::Token),
        "%type" = Token::Kw(Keyword::Type),
        $ident => |lexer| {
            let token = Token::Ident(lexer.match_());
            lexer.return_(token)
        },
    }

    rule LineComment {
        $newline => |lexer| {
            lexer.reset_match();
            lexer.switch(LexerRule::Init)
        },
        $ => |lexer| {
            lexer.reset_match();
            lexer.switch(LexerRule::Init)
        },
        _ => |lexer| lexer.continue_(),
    }

    // ネストした波括弧を含めてブロック全体を一つのトークンにする
    rule Code {
        "{" => |lexer| {
            lexer.state().brace_depth += 1;
            lexer.continue_()
        },
        "}" => |lexer| {
            let depth = {
                let state = lexer.state();
                state.brace_depth -= 1;
                state.brace_depth
            };
            if depth == 0 {
                let code = lexer.match_();
                lexer.switch_and_return(LexerRule::Init, Token::Code(code))
            } else {
                lexer.continue_()
            }
        },
        _ => |lexer| lexer.continue_(),
    }
}

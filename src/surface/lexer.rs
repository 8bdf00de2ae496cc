// Surface-syntax lexer, used only to build test fixtures -- production
// IR-A normally arrives pre-parsed. Same `?var`-prefixed variable
// convention and flat `#[token]`/`#[regex]` enum shape as a hand-rolled
// Datalog lexer, extended with the handful of tokens this crate's richer
// IR-A needs (aggregate colon, record brackets, the full comparison set).

use logos::Logos;

#[derive(Logos, Debug, Clone, PartialEq)]
pub enum SurfaceToken<'a> {
    #[regex(r"\?[A-Za-z_][A-Za-z0-9_]*")]
    Variable(&'a str),
    #[regex(r#""[^"]*""#, |lex| { let s = lex.slice(); &s[1..s.len() - 1] })]
    SymbolConst(&'a str),
    #[regex(r"-?[0-9]+", |lex| lex.slice().parse())]
    SignedConst(i64),
    #[regex(r"[A-Za-z][A-Za-z0-9_]*")]
    Ident(&'a str),
    #[token("_")]
    Underscore,
    #[token(":-")]
    ImpliedBy,
    #[token("!=")]
    Ne,
    #[token("<=")]
    Le,
    #[token(">=")]
    Ge,
    #[token("<")]
    Lt,
    #[token(">")]
    Gt,
    #[token("=")]
    Eq,
    #[token("!")]
    Bang,
    #[token("(")]
    LParen,
    #[token(")")]
    RParen,
    #[token("[")]
    LBracket,
    #[token("]")]
    RBracket,
    #[token(",")]
    Comma,
    #[token(":")]
    Colon,
    #[token(".")]
    Dot,
    #[error]
    #[regex(r"[ \t\n\r\f]+", logos::skip)]
    Error,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn lexes_a_fact_and_a_recursive_rule() {
        let mut lex = SurfaceToken::lexer("edge(1,2). path(?x,?z) :- edge(?x,?y), path(?y,?z).");
        assert_eq!(lex.next(), Some(SurfaceToken::Ident("edge")));
        assert_eq!(lex.next(), Some(SurfaceToken::LParen));
        assert_eq!(lex.next(), Some(SurfaceToken::SignedConst(1)));
        assert_eq!(lex.next(), Some(SurfaceToken::Comma));
        assert_eq!(lex.next(), Some(SurfaceToken::SignedConst(2)));
        assert_eq!(lex.next(), Some(SurfaceToken::RParen));
        assert_eq!(lex.next(), Some(SurfaceToken::Dot));
        assert_eq!(lex.next(), Some(SurfaceToken::Ident("path")));
        assert_eq!(lex.next(), Some(SurfaceToken::LParen));
        assert_eq!(lex.next(), Some(SurfaceToken::Variable("?x")));
    }

    #[test]
    fn lexes_negation_and_comparisons() {
        let mut lex = SurfaceToken::lexer("!bad(?x) ?x != ?y ?x <= ?y");
        assert_eq!(lex.next(), Some(SurfaceToken::Bang));
        assert_eq!(lex.next(), Some(SurfaceToken::Ident("bad")));
        assert_eq!(lex.next(), Some(SurfaceToken::LParen));
        assert_eq!(lex.next(), Some(SurfaceToken::Variable("?x")));
        assert_eq!(lex.next(), Some(SurfaceToken::RParen));
        assert_eq!(lex.next(), Some(SurfaceToken::Variable("?x")));
        assert_eq!(lex.next(), Some(SurfaceToken::Ne));
        assert_eq!(lex.next(), Some(SurfaceToken::Variable("?y")));
        assert_eq!(lex.next(), Some(SurfaceToken::Variable("?x")));
        assert_eq!(lex.next(), Some(SurfaceToken::Le));
        assert_eq!(lex.next(), Some(SurfaceToken::Variable("?y")));
    }

    #[test]
    fn lexes_a_quoted_symbol_constant() {
        let mut lex = SurfaceToken::lexer(r#"score("a",10)"#);
        assert_eq!(lex.next(), Some(SurfaceToken::Ident("score")));
        assert_eq!(lex.next(), Some(SurfaceToken::LParen));
        assert_eq!(lex.next(), Some(SurfaceToken::SymbolConst("a")));
    }
}

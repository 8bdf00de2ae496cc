// Surface-syntax parser: turns the `?var`-convention fixture language
// into `models::ir_a::Program`. Same flat, hand-rolled token-slice walk
// with a running position index as a hand-rolled Datalog parser, no
// parser combinator crate -- generalized to the richer literal set
// (negation, comparisons, aggregates, record construction/destructuring)
// this crate's IR-A needs. Test-only: production code takes IR-A as an
// already-built input tree, so nothing outside `tests/` should build a
// `Program` this way.

use crate::models::ir_a::{
    AggregateA, AggregateOp, ArgumentA, AtomA, ClauseA, CompareOp, LiteralA,
};
use crate::models::symbol_table::SymbolTable;
use crate::models::value::Value;
use crate::surface::lexer::SurfaceToken;
use logos::Logos;
use std::sync::Arc;

fn lex_all(source: &str) -> Vec<SurfaceToken<'_>> {
    SurfaceToken::lexer(source).filter(|t| *t != SurfaceToken::Error).collect()
}

fn parse_arg<'a>(tokens: &[SurfaceToken<'a>], pos: &mut usize, symbols: &SymbolTable) -> ArgumentA {
    match &tokens[*pos] {
        SurfaceToken::Variable(name) => {
            *pos += 1;
            ArgumentA::Variable(Arc::from(*name))
        }
        SurfaceToken::Underscore => {
            *pos += 1;
            ArgumentA::Underscore
        }
        SurfaceToken::SignedConst(n) => {
            *pos += 1;
            ArgumentA::Constant(Value::Signed(*n))
        }
        SurfaceToken::SymbolConst(text) => {
            *pos += 1;
            ArgumentA::Constant(Value::Symbol(symbols.lookup(text)))
        }
        SurfaceToken::Ident(keyword) if *keyword == "new" => {
            *pos += 1;
            let type_name = match &tokens[*pos] {
                SurfaceToken::Ident(name) => *name,
                other => panic!("expected a record type name, found {other:?}"),
            };
            *pos += 1;
            *pos += 1; // '('
            let mut fields = Vec::new();
            if tokens[*pos] != SurfaceToken::RParen {
                loop {
                    fields.push(parse_arg(tokens, pos, symbols));
                    if tokens[*pos] == SurfaceToken::Comma {
                        *pos += 1;
                        continue;
                    }
                    break;
                }
            }
            *pos += 1; // ')'
            ArgumentA::RecordCtor { type_name: Arc::from(type_name), fields }
        }
        other => panic!("unexpected token in argument position: {other:?}"),
    }
}

fn parse_args<'a>(tokens: &[SurfaceToken<'a>], pos: &mut usize, symbols: &SymbolTable) -> Vec<ArgumentA> {
    *pos += 1; // '('
    let mut args = Vec::new();
    if tokens[*pos] != SurfaceToken::RParen {
        loop {
            args.push(parse_arg(tokens, pos, symbols));
            if tokens[*pos] == SurfaceToken::Comma {
                *pos += 1;
                continue;
            }
            break;
        }
    }
    *pos += 1; // ')'
    args
}

fn parse_atom<'a>(tokens: &[SurfaceToken<'a>], pos: &mut usize, symbols: &SymbolTable) -> AtomA {
    let name = match &tokens[*pos] {
        SurfaceToken::Ident(name) => *name,
        other => panic!("expected a relation name, found {other:?}"),
    };
    *pos += 1;
    let args = parse_args(tokens, pos, symbols);
    AtomA { relation: Arc::from(name), args }
}

fn agg_op(keyword: &str) -> AggregateOp {
    match keyword {
        "count" => AggregateOp::Count,
        "sum" => AggregateOp::Sum,
        "max" => AggregateOp::Max,
        "min" => AggregateOp::Min,
        "mean" => AggregateOp::Mean,
        other => panic!("unknown aggregate operator `{other}`"),
    }
}

fn parse_literal<'a>(tokens: &[SurfaceToken<'a>], pos: &mut usize, symbols: &SymbolTable) -> LiteralA {
    if tokens[*pos] == SurfaceToken::Bang {
        *pos += 1;
        return LiteralA::Negative(parse_atom(tokens, pos, symbols));
    }

    if let SurfaceToken::Ident(_) = &tokens[*pos] {
        if matches!(tokens.get(*pos + 1), Some(SurfaceToken::LParen)) {
            return LiteralA::Positive(parse_atom(tokens, pos, symbols));
        }
    }

    let lhs = parse_arg(tokens, pos, symbols);
    match &tokens[*pos] {
        SurfaceToken::Eq => {
            *pos += 1;
            match &tokens[*pos] {
                SurfaceToken::Ident(keyword) if matches!(*keyword, "count" | "sum" | "max" | "min" | "mean") => {
                    let op = agg_op(keyword);
                    *pos += 1;
                    let binding = match lhs {
                        ArgumentA::Variable(name) => name,
                        other => panic!("aggregate result must bind a variable, found {other:?}"),
                    };
                    let target = Box::new(parse_arg(tokens, pos, symbols));
                    *pos += 1; // ':'
                    let body = vec![LiteralA::Positive(parse_atom(tokens, pos, symbols))];
                    LiteralA::Aggregate { binding, aggregate: AggregateA { op, target, body } }
                }
                SurfaceToken::LBracket => {
                    *pos += 1;
                    let mut fields = Vec::new();
                    if tokens[*pos] != SurfaceToken::RBracket {
                        loop {
                            fields.push(parse_arg(tokens, pos, symbols));
                            if tokens[*pos] == SurfaceToken::Comma {
                                *pos += 1;
                                continue;
                            }
                            break;
                        }
                    }
                    *pos += 1; // ']'
                    LiteralA::RecordMatch { source: lhs, fields }
                }
                _ => {
                    let rhs = parse_arg(tokens, pos, symbols);
                    LiteralA::Compare { op: CompareOp::Eq, lhs, rhs }
                }
            }
        }
        SurfaceToken::Ne | SurfaceToken::Lt | SurfaceToken::Le | SurfaceToken::Gt | SurfaceToken::Ge => {
            let op = match tokens[*pos] {
                SurfaceToken::Ne => CompareOp::Ne,
                SurfaceToken::Lt => CompareOp::Lt,
                SurfaceToken::Le => CompareOp::Le,
                SurfaceToken::Gt => CompareOp::Gt,
                SurfaceToken::Ge => CompareOp::Ge,
                _ => unreachable!(),
            };
            *pos += 1;
            let rhs = parse_arg(tokens, pos, symbols);
            LiteralA::Compare { op, lhs, rhs }
        }
        other => panic!("expected a comparison, `=`, or `:` after an argument, found {other:?}"),
    }
}

fn parse_clause<'a>(tokens: &[SurfaceToken<'a>], symbols: &SymbolTable) -> ClauseA {
    let mut pos = 0;
    let head = parse_atom(tokens, &mut pos, symbols);
    if pos == tokens.len() {
        return ClauseA { head, body: Vec::new() };
    }
    assert_eq!(tokens[pos], SurfaceToken::ImpliedBy, "expected `:-` after a non-fact head");
    pos += 1;
    let mut body = vec![parse_literal(tokens, &mut pos, symbols)];
    while pos < tokens.len() && tokens[pos] == SurfaceToken::Comma {
        pos += 1;
        body.push(parse_literal(tokens, &mut pos, symbols));
    }
    ClauseA { head, body }
}

/// Parses a whole fixture program: a sequence of `.`-terminated clauses.
/// Symbol constants are interned against `symbols` as they're parsed, so
/// callers should pass the same table the evaluator will run against.
pub fn parse_program(source: &str, symbols: &SymbolTable) -> crate::models::ir_a::Program {
    let tokens = lex_all(source);
    let clauses = tokens
        .split(|t| *t == SurfaceToken::Dot)
        .map(|chunk| chunk.to_vec())
        .filter(|chunk| !chunk.is_empty())
        .map(|chunk| parse_clause(&chunk, symbols))
        .collect();
    crate::models::ir_a::Program { clauses, outputs: Vec::new(), plan: None }
}

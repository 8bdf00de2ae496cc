// Intrinsic and user-defined functor dispatch. Intrinsics are a closed,
// fixed set (`IntrinsicOp`) so dispatch is a plain match -- a tagged
// variant with O(1) kind dispatch, without reaching for an open
// trait-object registry for the handful of builtins. User functors are
// the one genuinely external seam: a host embeds an `UserFunctors`
// implementation and the evaluator prepares arguments/interns results
// around it per the external calling convention.

use crate::error::Diagnostics;
use crate::models::ir_a::{BinOp, IntrinsicOp};
use crate::models::symbol_table::SymbolTable;
use crate::models::value::Value;

pub fn eval_binop(op: BinOp, lhs: Value, rhs: Value, diagnostics: &Diagnostics) -> Value {
    use BinOp::*;
    if matches!(lhs, Value::Float(_)) || matches!(rhs, Value::Float(_)) {
        let (a, b) = (lhs.float_view(), rhs.float_view());
        return match op {
            Add => Value::Float(ordered_float::OrderedFloat(a + b)),
            Sub => Value::Float(ordered_float::OrderedFloat(a - b)),
            Mul => Value::Float(ordered_float::OrderedFloat(a * b)),
            Div => {
                if b == 0.0 {
                    diagnostics.warn("float division by zero");
                    Value::Float(ordered_float::OrderedFloat(f64::NAN))
                } else {
                    Value::Float(ordered_float::OrderedFloat(a / b))
                }
            }
            Mod | BitAnd | BitOr | BitXor | ShiftLeft | ShiftRight => {
                diagnostics.warn("bitwise/modulo operator applied to a float operand");
                Value::Undefined
            }
        };
    }
    if matches!(lhs, Value::Unsigned(_)) || matches!(rhs, Value::Unsigned(_)) {
        let (a, b) = (lhs.unsigned_view(), rhs.unsigned_view());
        return match op {
            Add => Value::Unsigned(a.wrapping_add(b)),
            Sub => Value::Unsigned(a.wrapping_sub(b)),
            Mul => Value::Unsigned(a.wrapping_mul(b)),
            Div => checked_div_u(a, b, diagnostics),
            Mod => checked_rem_u(a, b, diagnostics),
            BitAnd => Value::Unsigned(a & b),
            BitOr => Value::Unsigned(a | b),
            BitXor => Value::Unsigned(a ^ b),
            ShiftLeft => Value::Unsigned(a.wrapping_shl(b as u32)),
            ShiftRight => Value::Unsigned(a.wrapping_shr(b as u32)),
        };
    }
    let (a, b) = (lhs.signed_view(), rhs.signed_view());
    match op {
        Add => Value::Signed(a.wrapping_add(b)),
        Sub => Value::Signed(a.wrapping_sub(b)),
        Mul => Value::Signed(a.wrapping_mul(b)),
        Div => checked_div_i(a, b, diagnostics),
        Mod => checked_rem_i(a, b, diagnostics),
        BitAnd => Value::Signed(a & b),
        BitOr => Value::Signed(a | b),
        BitXor => Value::Signed(a ^ b),
        ShiftLeft => Value::Signed(a.wrapping_shl(b as u32)),
        ShiftRight => Value::Signed(a.wrapping_shr(b as u32)),
    }
}

fn checked_div_i(a: i64, b: i64, diagnostics: &Diagnostics) -> Value {
    if b == 0 {
        diagnostics.warn("integer division by zero");
        Value::Undefined
    } else {
        Value::Signed(a.wrapping_div(b))
    }
}

fn checked_rem_i(a: i64, b: i64, diagnostics: &Diagnostics) -> Value {
    if b == 0 {
        diagnostics.warn("integer modulo by zero");
        Value::Undefined
    } else {
        Value::Signed(a.wrapping_rem(b))
    }
}

fn checked_div_u(a: u64, b: u64, diagnostics: &Diagnostics) -> Value {
    if b == 0 {
        diagnostics.warn("unsigned division by zero");
        Value::Undefined
    } else {
        Value::Unsigned(a / b)
    }
}

fn checked_rem_u(a: u64, b: u64, diagnostics: &Diagnostics) -> Value {
    if b == 0 {
        diagnostics.warn("unsigned modulo by zero");
        Value::Undefined
    } else {
        Value::Unsigned(a % b)
    }
}

pub fn eval_intrinsic(
    op: IntrinsicOp,
    args: &[Value],
    symtab: &SymbolTable,
    diagnostics: &Diagnostics,
) -> Value {
    match op {
        IntrinsicOp::Max => args.iter().copied().max().unwrap_or(Value::Undefined),
        IntrinsicOp::Min => args.iter().copied().min().unwrap_or(Value::Undefined),
        IntrinsicOp::Ord => args.first().map(|v| Value::Signed(v.signed_view())).unwrap_or(Value::Undefined),
        IntrinsicOp::Cat => {
            let mut buf = String::new();
            for arg in args {
                buf.push_str(&resolve_text(*arg, symtab));
            }
            Value::Symbol(symtab.lookup(&buf))
        }
        IntrinsicOp::StrLen => {
            let Some(text) = args.first() else { return Value::Undefined };
            Value::Signed(resolve_text(*text, symtab).chars().count() as i64)
        }
        IntrinsicOp::Substr => {
            let (Some(text), Some(start), Some(len)) = (args.first(), args.get(1), args.get(2)) else {
                diagnostics.warn("substr called with too few arguments");
                return Value::Undefined;
            };
            let s = resolve_text(*text, symtab);
            let chars: Vec<char> = s.chars().collect();
            let start = start.signed_view().max(0) as usize;
            let len = len.signed_view().max(0) as usize;
            if start > chars.len() {
                diagnostics.warn("substr start index out of range");
                return Value::Symbol(symtab.lookup(""));
            }
            let end = (start + len).min(chars.len());
            let slice: String = chars[start..end].iter().collect();
            Value::Symbol(symtab.lookup(&slice))
        }
        IntrinsicOp::ToNumber => {
            let Some(text) = args.first() else { return Value::Undefined };
            let s = resolve_text(*text, symtab);
            match s.parse::<i64>() {
                Ok(n) => Value::Signed(n),
                Err(_) => {
                    diagnostics.warn(format!("to_number: `{s}` is not a valid integer"));
                    Value::Signed(0)
                }
            }
        }
        IntrinsicOp::ToString => {
            let Some(value) = args.first() else { return Value::Undefined };
            Value::Symbol(symtab.lookup(&value.to_string()))
        }
    }
}

fn resolve_text(value: Value, symtab: &SymbolTable) -> String {
    match value.symbol_view() {
        Some(id) => symtab.resolve(id).to_string(),
        None => value.to_string(),
    }
}

/// Argument prepared for a user functor call: symbol arguments are
/// resolved through the symbol table before the external call.
#[derive(Clone, Debug)]
pub enum FunctorArg {
    Signed(i64),
    Unsigned(u64),
    Float(f64),
    Text(String),
}

#[derive(Clone, Debug)]
pub enum FunctorResult {
    Signed(i64),
    Unsigned(u64),
    Float(f64),
    Text(String),
}

/// External calling convention for user-defined functors.
/// A host embedding the evaluator implements this; the crate ships a
/// no-op default so programs that declare no functors still evaluate.
pub trait UserFunctors: Send + Sync {
    fn call(&self, name: &str, args: &[FunctorArg]) -> Option<FunctorResult>;
}

#[derive(Default)]
pub struct NoUserFunctors;

impl UserFunctors for NoUserFunctors {
    fn call(&self, _name: &str, _args: &[FunctorArg]) -> Option<FunctorResult> {
        None
    }
}

pub fn prepare_arg(value: Value, symtab: &SymbolTable) -> FunctorArg {
    match value {
        Value::Signed(v) => FunctorArg::Signed(v),
        Value::Unsigned(v) => FunctorArg::Unsigned(v),
        Value::Float(v) => FunctorArg::Float(v.into_inner()),
        Value::Symbol(id) => FunctorArg::Text(symtab.resolve(id).to_string()),
        Value::Undefined => FunctorArg::Signed(0),
    }
}

/// Invokes `name` via `table`, returning `None` (a fatal "missing
/// user-functor symbol" condition) when the host recognizes no such
/// functor.
pub fn call_user_functor(
    table: &dyn UserFunctors,
    name: &str,
    args: &[Value],
    returns_symbol: bool,
    symtab: &SymbolTable,
) -> Option<Value> {
    let prepared: Vec<FunctorArg> = args.iter().map(|v| prepare_arg(*v, symtab)).collect();
    let result = table.call(name, &prepared)?;
    Some(match (returns_symbol, result) {
        (true, FunctorResult::Text(s)) => Value::Symbol(symtab.lookup(&s)),
        (true, FunctorResult::Signed(v)) => Value::Symbol(symtab.lookup(&v.to_string())),
        (true, FunctorResult::Unsigned(v)) => Value::Symbol(symtab.lookup(&v.to_string())),
        (true, FunctorResult::Float(v)) => Value::Symbol(symtab.lookup(&v.to_string())),
        (false, FunctorResult::Signed(v)) => Value::Signed(v),
        (false, FunctorResult::Unsigned(v)) => Value::Unsigned(v),
        (false, FunctorResult::Float(v)) => Value::Float(ordered_float::OrderedFloat(v)),
        (false, FunctorResult::Text(s)) => Value::Signed(s.parse().unwrap_or(0)),
    })
}

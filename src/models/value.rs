// The scalar domain: a machine word reinterpreted as one of four views.
// We keep the tag explicit (a plain enum) rather than reaching for raw
// transmutes -- the
// `*_view` accessors below give the same "bit-cast between views" contract
// without unsafe code.

use lasso::Spur;
use ordered_float::OrderedFloat;
use std::cmp::Ordering;
use std::fmt::{Display, Formatter};
use std::hash::{Hash, Hasher};

pub type SymbolId = Spur;

#[derive(Clone, Copy, Debug)]
pub enum Value {
    Signed(i64),
    Unsigned(u64),
    Float(OrderedFloat<f64>),
    Symbol(SymbolId),
    /// The designated "undefined" word: open-ended range bound, or an
    /// absent argument in an existence check.
    Undefined,
}

impl Value {
    pub fn signed_view(self) -> i64 {
        match self {
            Value::Signed(v) => v,
            Value::Unsigned(v) => v as i64,
            Value::Float(v) => v.into_inner().to_bits() as i64,
            Value::Symbol(v) => v.into_inner().get() as i64,
            Value::Undefined => i64::MIN,
        }
    }

    pub fn unsigned_view(self) -> u64 {
        match self {
            Value::Signed(v) => v as u64,
            Value::Unsigned(v) => v,
            Value::Float(v) => v.into_inner().to_bits(),
            Value::Symbol(v) => v.into_inner().get() as u64,
            Value::Undefined => 0,
        }
    }

    pub fn float_view(self) -> f64 {
        match self {
            Value::Float(v) => v.into_inner(),
            Value::Signed(v) => v as f64,
            Value::Unsigned(v) => v as f64,
            Value::Symbol(v) => v.into_inner().get() as f64,
            Value::Undefined => f64::NAN,
        }
    }

    pub fn symbol_view(self) -> Option<SymbolId> {
        match self {
            Value::Symbol(s) => Some(s),
            _ => None,
        }
    }

    pub fn is_undefined(self) -> bool {
        matches!(self, Value::Undefined)
    }

    /// Domain minimum sentinel, used as the open lower bound of a range scan.
    pub const fn min_sentinel() -> Value {
        Value::Signed(i64::MIN)
    }

    /// Domain maximum sentinel, used as the open upper bound of a range scan.
    pub const fn max_sentinel() -> Value {
        Value::Signed(i64::MAX)
    }
}

impl PartialEq for Value {
    fn eq(&self, other: &Self) -> bool {
        self.cmp(other) == Ordering::Equal
    }
}
impl Eq for Value {}

impl PartialOrd for Value {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for Value {
    fn cmp(&self, other: &Self) -> Ordering {
        // Cross-kind comparisons only happen in malformed programs; order by
        // tag first so the result is at least total and stable.
        fn tag(v: &Value) -> u8 {
            match v {
                Value::Signed(_) => 0,
                Value::Unsigned(_) => 1,
                Value::Float(_) => 2,
                Value::Symbol(_) => 3,
                Value::Undefined => 4,
            }
        }
        match (self, other) {
            (Value::Signed(a), Value::Signed(b)) => a.cmp(b),
            (Value::Unsigned(a), Value::Unsigned(b)) => a.cmp(b),
            (Value::Float(a), Value::Float(b)) => a.cmp(b),
            (Value::Symbol(a), Value::Symbol(b)) => a.into_inner().cmp(&b.into_inner()),
            (Value::Undefined, Value::Undefined) => Ordering::Equal,
            _ => tag(self).cmp(&tag(other)),
        }
    }
}

impl Hash for Value {
    fn hash<H: Hasher>(&self, state: &mut H) {
        match self {
            Value::Signed(v) => v.hash(state),
            Value::Unsigned(v) => v.hash(state),
            Value::Float(v) => v.hash(state),
            Value::Symbol(v) => v.into_inner().hash(state),
            Value::Undefined => 0xDEAD_u64.hash(state),
        }
    }
}

impl Display for Value {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Value::Signed(v) => write!(f, "{v}"),
            Value::Unsigned(v) => write!(f, "{v}u"),
            Value::Float(v) => write!(f, "{v}"),
            Value::Symbol(v) => write!(f, "sym#{}", v.into_inner()),
            Value::Undefined => write!(f, "_"),
        }
    }
}

/// A fixed-arity tuple of domain values. Equality is component-wise.
pub type Tuple = Box<[Value]>;

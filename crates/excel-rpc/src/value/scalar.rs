//! Fixed-width numeric scalars, as produced by numeric array libraries.

use serde_json::Value;

/// A fixed-width numeric or boolean scalar.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Scalar {
    Bool(bool),
    I8(i8),
    I16(i16),
    I32(i32),
    I64(i64),
    U8(u8),
    U16(u16),
    U32(u32),
    U64(u64),
    F32(f32),
    F64(f64),
}

impl Scalar {
    /// Unwrap to the native JSON form: integers stay integers, floats stay
    /// floats.
    pub fn to_json(self) -> Value {
        match self {
            Scalar::Bool(b) => Value::Bool(b),
            Scalar::I8(n) => Value::from(n),
            Scalar::I16(n) => Value::from(n),
            Scalar::I32(n) => Value::from(n),
            Scalar::I64(n) => Value::from(n),
            Scalar::U8(n) => Value::from(n),
            Scalar::U16(n) => Value::from(n),
            Scalar::U32(n) => Value::from(n),
            Scalar::U64(n) => Value::from(n),
            Scalar::F32(x) => float_to_json(f64::from(x)),
            Scalar::F64(x) => float_to_json(x),
        }
    }

    pub fn as_f64(self) -> f64 {
        match self {
            Scalar::Bool(b) => f64::from(u8::from(b)),
            Scalar::I8(n) => f64::from(n),
            Scalar::I16(n) => f64::from(n),
            Scalar::I32(n) => f64::from(n),
            Scalar::I64(n) => n as f64,
            Scalar::U8(n) => f64::from(n),
            Scalar::U16(n) => f64::from(n),
            Scalar::U32(n) => f64::from(n),
            Scalar::U64(n) => n as f64,
            Scalar::F32(x) => f64::from(x),
            Scalar::F64(x) => x,
        }
    }
}

/// Finite floats become JSON numbers; NaN and infinities have no JSON form
/// and fall back to their textual representation.
pub(crate) fn float_to_json(x: f64) -> Value {
    serde_json::Number::from_f64(x)
        .map(Value::Number)
        .unwrap_or_else(|| Value::String(x.to_string()))
}

macro_rules! scalar_from {
    ($($ty:ty => $variant:ident),* $(,)?) => {
        $(
            impl From<$ty> for Scalar {
                fn from(v: $ty) -> Self {
                    Scalar::$variant(v)
                }
            }
        )*
    };
}

scalar_from! {
    bool => Bool,
    i8 => I8,
    i16 => I16,
    i32 => I32,
    i64 => I64,
    u8 => U8,
    u16 => U16,
    u32 => U32,
    u64 => U64,
    f32 => F32,
    f64 => F64,
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_unwrap_integers() {
        assert_eq!(Scalar::I8(-3).to_json(), json!(-3));
        assert_eq!(Scalar::U32(7).to_json(), json!(7));
        assert_eq!(Scalar::Bool(true).to_json(), json!(true));
    }

    #[test]
    fn test_large_u64_stays_exact() {
        assert_eq!(Scalar::U64(5).to_json(), json!(5));
        let big = Scalar::U64(u64::MAX).to_json();
        assert_eq!(big.as_u64(), Some(u64::MAX));
    }

    #[test]
    fn test_non_finite_floats() {
        assert_eq!(Scalar::F64(f64::NAN).to_json(), json!("NaN"));
        assert_eq!(Scalar::F32(f32::INFINITY).to_json(), json!("inf"));
        assert_eq!(Scalar::F64(f64::NEG_INFINITY).to_json(), json!("-inf"));
        assert_eq!(Scalar::F64(2.5).to_json(), json!(2.5));
    }
}

//! Typed rows returned by an executor.
//!
//! A [`Row`] is an ordered list of scalar [`Value`]s. Callers scan it into a
//! tuple; arity and type are checked, nothing is coerced.

use bigdecimal::BigDecimal;
use chrono::{DateTime, Utc};

use super::errors::StoreError;

#[derive(Debug, Clone, PartialEq)]
pub enum Value {
    Int(i32),
    Text(String),
    Decimal(BigDecimal),
    Timestamp(DateTime<Utc>),
}

impl Value {
    fn kind(&self) -> &'static str {
        match self {
            Value::Int(_) => "integer",
            Value::Text(_) => "string",
            Value::Decimal(_) => "decimal",
            Value::Timestamp(_) => "timestamp",
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct Row(Vec<Value>);

impl Row {
    pub fn new(values: Vec<Value>) -> Self {
        Self(values)
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn scan<T: FromRow>(self) -> Result<T, StoreError> {
        T::from_row(self)
    }
}

impl IntoIterator for Row {
    type Item = Value;
    type IntoIter = std::vec::IntoIter<Value>;

    fn into_iter(self) -> Self::IntoIter {
        self.0.into_iter()
    }
}

pub trait FromValue: Sized {
    fn from_value(value: Value) -> Result<Self, StoreError>;
}

fn mismatch(expected: &str, found: &Value) -> StoreError {
    StoreError::Scan(format!("expected {expected}, found {}", found.kind()))
}

impl FromValue for i32 {
    fn from_value(value: Value) -> Result<Self, StoreError> {
        match value {
            Value::Int(v) => Ok(v),
            other => Err(mismatch("integer", &other)),
        }
    }
}

impl FromValue for String {
    fn from_value(value: Value) -> Result<Self, StoreError> {
        match value {
            Value::Text(v) => Ok(v),
            other => Err(mismatch("string", &other)),
        }
    }
}

impl FromValue for BigDecimal {
    fn from_value(value: Value) -> Result<Self, StoreError> {
        match value {
            Value::Decimal(v) => Ok(v),
            other => Err(mismatch("decimal", &other)),
        }
    }
}

impl FromValue for DateTime<Utc> {
    fn from_value(value: Value) -> Result<Self, StoreError> {
        match value {
            Value::Timestamp(v) => Ok(v),
            other => Err(mismatch("timestamp", &other)),
        }
    }
}

pub trait FromRow: Sized {
    fn from_row(row: Row) -> Result<Self, StoreError>;
}

macro_rules! impl_from_row_for_tuple {
    ($arity:expr; $($ty:ident),+) => {
        impl<$($ty: FromValue),+> FromRow for ($($ty,)+) {
            fn from_row(row: Row) -> Result<Self, StoreError> {
                if row.len() != $arity {
                    return Err(StoreError::Scan(format!(
                        "expected {} columns, found {}",
                        $arity,
                        row.len()
                    )));
                }
                let mut values = row.into_iter();
                Ok(($(
                    <$ty as FromValue>::from_value(values.next().ok_or_else(|| {
                        StoreError::Scan("row ended early".to_string())
                    })?)?,
                )+))
            }
        }
    };
}

impl_from_row_for_tuple!(1; A);
impl_from_row_for_tuple!(2; A, B);
impl_from_row_for_tuple!(3; A, B, C);
impl_from_row_for_tuple!(4; A, B, C, D);
impl_from_row_for_tuple!(5; A, B, C, D, E);
impl_from_row_for_tuple!(6; A, B, C, D, E, F);

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn scans_matching_row() {
        let row = Row::new(vec![Value::Int(7), Value::Text("Mouse".to_string())]);
        let (id, name): (i32, String) = row.scan().expect("scan");
        assert_eq!(id, 7);
        assert_eq!(name, "Mouse");
    }

    #[test]
    fn wrong_arity_is_an_error() {
        let row = Row::new(vec![Value::Int(7)]);
        let err = row.scan::<(i32, String)>().unwrap_err();
        assert!(matches!(err, StoreError::Scan(ref m) if m == "expected 2 columns, found 1"));
    }

    #[test]
    fn wrong_type_is_not_coerced() {
        let row = Row::new(vec![Value::Text("7".to_string())]);
        let err = row.scan::<(i32,)>().unwrap_err();
        assert!(matches!(err, StoreError::Scan(ref m) if m == "expected integer, found string"));
    }
}

//! Rectangular numeric arrays.

use super::{HostValue, Scalar};
use crate::error::{HostError, HostResult};

/// An n-dimensional array stored row-major.
#[derive(Debug, Clone, PartialEq)]
pub struct NdArray {
    shape: Vec<usize>,
    data: Vec<Scalar>,
}

impl NdArray {
    /// Build an array, checking that `data` fills `shape` exactly.
    /// An empty shape describes a 0-d array holding one scalar.
    pub fn new(shape: Vec<usize>, data: Vec<Scalar>) -> HostResult<Self> {
        let expected: usize = shape.iter().product();
        if expected != data.len() {
            return Err(HostError::invalid_argument(format!(
                "array of shape {shape:?} needs {expected} elements, got {}",
                data.len()
            )));
        }
        Ok(Self { shape, data })
    }

    /// A 2-d array from equally long rows.
    pub fn from_rows<T: Into<Scalar> + Copy>(rows: &[Vec<T>]) -> HostResult<Self> {
        let cols = rows.first().map_or(0, Vec::len);
        if rows.iter().any(|r| r.len() != cols) {
            return Err(HostError::invalid_argument("array rows differ in length"));
        }
        let data = rows.iter().flatten().map(|&v| v.into()).collect();
        Self::new(vec![rows.len(), cols], data)
    }

    pub fn shape(&self) -> &[usize] {
        &self.shape
    }

    pub fn data(&self) -> &[Scalar] {
        &self.data
    }

    /// The nested-list form of the array. A 0-d array collapses to its scalar.
    pub fn to_nested(&self) -> HostValue {
        if self.shape.is_empty() {
            return self
                .data
                .first()
                .map_or(HostValue::Null, |&s| HostValue::Scalar(s));
        }
        nest(&self.shape, &self.data)
    }
}

fn nest(shape: &[usize], data: &[Scalar]) -> HostValue {
    match shape {
        [] => HostValue::Null,
        [_] => HostValue::List(data.iter().map(|&s| HostValue::Scalar(s)).collect()),
        [outer, inner @ ..] => {
            let stride: usize = inner.iter().product();
            let items = (0..*outer)
                .map(|i| nest(inner, &data[i * stride..(i + 1) * stride]))
                .collect();
            HostValue::List(items)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::serialize::serialize;
    use serde_json::json;

    #[test]
    fn test_shape_mismatch_rejected() {
        let err = NdArray::new(vec![2, 2], vec![Scalar::I32(1); 3]).unwrap_err();
        assert!(matches!(err, HostError::InvalidArgument(_)));
    }

    #[test]
    fn test_nested_form() {
        let arr = NdArray::from_rows(&[vec![1i32, 2], vec![3, 4]]).unwrap();
        assert_eq!(arr.shape(), &[2, 2]);
        assert_eq!(serialize(&arr.to_nested()), json!([[1, 2], [3, 4]]));
    }

    #[test]
    fn test_three_dimensions() {
        let data = (0..8).map(Scalar::I64).collect();
        let arr = NdArray::new(vec![2, 2, 2], data).unwrap();
        assert_eq!(
            serialize(&arr.to_nested()),
            json!([[[0, 1], [2, 3]], [[4, 5], [6, 7]]])
        );
    }

    #[test]
    fn test_zero_dimensional() {
        let arr = NdArray::new(vec![], vec![Scalar::F64(1.5)]).unwrap();
        assert_eq!(serialize(&arr.to_nested()), json!(1.5));
    }

    #[test]
    fn test_empty_axis() {
        let arr = NdArray::new(vec![0, 3], vec![]).unwrap();
        assert_eq!(serialize(&arr.to_nested()), json!([]));
    }
}

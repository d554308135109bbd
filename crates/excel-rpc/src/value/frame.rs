//! Labeled tabular data: frames and series.

use super::HostValue;
use crate::error::{HostError, HostResult};

/// A rectangular table with row labels (`index`) and column labels.
#[derive(Debug, Clone)]
pub struct DataFrame {
    index: Vec<HostValue>,
    columns: Vec<HostValue>,
    data: Vec<Vec<HostValue>>,
}

impl DataFrame {
    /// Build a frame, checking that there is one row per index label and one
    /// cell per column label in every row.
    pub fn new(
        index: Vec<HostValue>,
        columns: Vec<HostValue>,
        data: Vec<Vec<HostValue>>,
    ) -> HostResult<Self> {
        if data.len() != index.len() {
            return Err(HostError::invalid_argument(format!(
                "dataframe has {} rows but {} index labels",
                data.len(),
                index.len()
            )));
        }
        if let Some((i, row)) = data
            .iter()
            .enumerate()
            .find(|(_, row)| row.len() != columns.len())
        {
            return Err(HostError::invalid_argument(format!(
                "dataframe row {i} has {} cells but there are {} columns",
                row.len(),
                columns.len()
            )));
        }
        Ok(Self {
            index,
            columns,
            data,
        })
    }

    /// A frame with a default `0..n` integer index.
    pub fn from_rows(columns: Vec<HostValue>, data: Vec<Vec<HostValue>>) -> HostResult<Self> {
        let index = (0..data.len() as i64).map(HostValue::Int).collect();
        Self::new(index, columns, data)
    }

    pub fn index(&self) -> &[HostValue] {
        &self.index
    }

    pub fn columns(&self) -> &[HostValue] {
        &self.columns
    }

    pub fn rows(&self) -> &[Vec<HostValue>] {
        &self.data
    }

    pub fn shape(&self) -> (usize, usize) {
        (self.index.len(), self.columns.len())
    }
}

/// A 1-d sequence with one label per element.
#[derive(Debug, Clone)]
pub struct Series {
    index: Vec<HostValue>,
    data: Vec<HostValue>,
}

impl Series {
    pub fn new(index: Vec<HostValue>, data: Vec<HostValue>) -> HostResult<Self> {
        if index.len() != data.len() {
            return Err(HostError::invalid_argument(format!(
                "series has {} values but {} index labels",
                data.len(),
                index.len()
            )));
        }
        Ok(Self { index, data })
    }

    pub fn index(&self) -> &[HostValue] {
        &self.index
    }

    pub fn values(&self) -> &[HostValue] {
        &self.data
    }

    pub fn len(&self) -> usize {
        self.data.len()
    }

    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }
}

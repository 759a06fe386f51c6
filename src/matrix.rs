use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};
use crate::problem::NodeIndex;

/// Index convention of node references in tabular records.
///
/// Internally every node index is zero-based, clients first and depots after.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum IndexBase {
    #[default]
    Zero,
    One,
}

impl IndexBase {
    /// Converts an index read from a record into an internal index
    pub fn to_internal(self, index: usize) -> Result<NodeIndex> {
        match self {
            IndexBase::Zero => Ok(index),
            IndexBase::One => index
                .checked_sub(1)
                .ok_or_else(|| Error::InvalidInput("node index 0 in a one-based table".into())),
        }
    }

    /// Converts an internal index into the index written to a record
    pub fn to_external(self, index: NodeIndex) -> usize {
        match self {
            IndexBase::Zero => index,
            IndexBase::One => index + 1,
        }
    }
}

/// A sparse matrix of values between ordered node pairs.
///
/// A pair that is not present is unknown, it is never treated as zero.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct TravelMatrix {
    entries: BTreeMap<(NodeIndex, NodeIndex), f64>,
}

impl TravelMatrix {
    pub fn new() -> TravelMatrix {
        TravelMatrix::default()
    }

    /// Builds a matrix from a dense table where `None` marks an unknown pair
    pub fn from_dense(rows: &[Vec<Option<f64>>]) -> TravelMatrix {
        let mut matrix = TravelMatrix::new();
        for (i, row) in rows.iter().enumerate() {
            for (j, value) in row.iter().enumerate() {
                if let Some(value) = value {
                    matrix.insert(i, j, *value);
                }
            }
        }
        matrix
    }

    pub fn insert(&mut self, from: NodeIndex, to: NodeIndex, value: f64) {
        self.entries.insert((from, to), value);
    }

    pub fn get(&self, from: NodeIndex, to: NodeIndex) -> Option<f64> {
        self.entries.get(&(from, to)).copied()
    }

    pub fn contains(&self, from: NodeIndex, to: NodeIndex) -> bool {
        self.entries.contains_key(&(from, to))
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// All known pairs in (from, to) order
    pub fn iter(&self) -> impl Iterator<Item = ((NodeIndex, NodeIndex), f64)> + '_ {
        self.entries.iter().map(|(k, v)| (*k, *v))
    }
}

impl FromIterator<((NodeIndex, NodeIndex), f64)> for TravelMatrix {
    fn from_iter<T: IntoIterator<Item = ((NodeIndex, NodeIndex), f64)>>(iter: T) -> Self {
        TravelMatrix {
            entries: iter.into_iter().collect(),
        }
    }
}

/// Pairwise distances (metres) and durations (seconds) between a set of points
#[derive(Debug, Clone, Default, PartialEq)]
pub struct TravelMatrices {
    pub distances: TravelMatrix,
    pub durations: TravelMatrix,
}

use crate::types::EdgeId;

/// One value per edge, with a sentinel for edges that were never written.
#[derive(Debug, Clone, PartialEq, rkyv::Archive, rkyv::Serialize, rkyv::Deserialize)]
pub struct EdgeValueStore<T> {
    values: Vec<T>,
    unknown: T,
}

impl<T: Copy + PartialEq> EdgeValueStore<T> {
    pub fn new(unknown: T) -> Self {
        EdgeValueStore {
            values: Vec::new(),
            unknown,
        }
    }

    pub fn with_capacity(edges: usize, unknown: T) -> Self {
        EdgeValueStore {
            values: Vec::with_capacity(edges),
            unknown,
        }
    }

    pub fn set(&mut self, edge_id: EdgeId, value: T) {
        if edge_id >= self.values.len() {
            self.values.resize(edge_id + 1, self.unknown);
        }
        self.values[edge_id] = value;
    }

    /// `None` for edges that hold the unknown sentinel.
    pub fn get(&self, edge_id: EdgeId) -> Option<T> {
        self.values
            .get(edge_id)
            .copied()
            .filter(|value| *value != self.unknown)
    }

    pub fn get_or_unknown(&self, edge_id: EdgeId) -> T {
        self.get(edge_id).unwrap_or(self.unknown)
    }

    pub fn unknown(&self) -> T {
        self.unknown
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    /// Number of edges holding a known value
    pub fn known_count(&self) -> usize {
        self.values
            .iter()
            .filter(|value| **value != self.unknown)
            .count()
    }
}

/// Fixed width byte records per edge, the width being chosen at runtime.
#[derive(Debug, Clone, PartialEq, rkyv::Archive, rkyv::Serialize, rkyv::Deserialize)]
pub struct EdgeRecordStore {
    width: usize,
    unknown: u8,
    bytes: Vec<u8>,
}

impl EdgeRecordStore {
    pub fn new(width: usize, unknown: u8) -> Self {
        EdgeRecordStore {
            width,
            unknown,
            bytes: Vec::new(),
        }
    }

    pub fn width(&self) -> usize {
        self.width
    }

    pub fn set(&mut self, edge_id: EdgeId, record: &[u8]) {
        debug_assert_eq!(record.len(), self.width);

        let start = edge_id * self.width;
        if start + self.width > self.bytes.len() {
            self.bytes.resize(start + self.width, self.unknown);
        }

        let count = record.len().min(self.width);
        self.bytes[start..start + count].copy_from_slice(&record[..count]);
    }

    /// The record of an edge, `None` when every byte is unknown.
    pub fn get(&self, edge_id: EdgeId) -> Option<&[u8]> {
        let start = edge_id * self.width;
        self.bytes
            .get(start..start + self.width)
            .filter(|record| record.iter().any(|byte| *byte != self.unknown))
    }

    pub fn value(&self, edge_id: EdgeId, column: usize) -> Option<u8> {
        self.get(edge_id)
            .and_then(|record| record.get(column).copied())
            .filter(|value| *value != self.unknown)
    }

    pub fn edge_count(&self) -> usize {
        self.bytes.len().checked_div(self.width).unwrap_or(0)
    }
}

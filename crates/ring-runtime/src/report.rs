//! # Sweep Reports
//!
//! Sweeps have no acknowledgment, so the operator reads every node before and
//! after and compares.

use ring_storage::domain::entities::NodeView;
use serde::Serialize;
use std::collections::BTreeMap;
use std::fmt;

/// Per-node result of a Clean sweep.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CleanRow {
    /// Ring index.
    pub index: u32,
    /// Payload size before the sweep.
    pub size_before: Option<u64>,
    /// Payload size after the sweep.
    pub size_after: Option<u64>,
    /// Node reports itself cleaned after the sweep.
    pub is_cleaned: bool,
}

impl CleanRow {
    /// True if the payload got strictly smaller.
    #[must_use]
    pub fn shrunk(&self) -> bool {
        matches!((self.size_before, self.size_after), (Some(before), Some(after)) if after < before)
    }
}

/// Before/after payload sizes for a Clean sweep.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct CleanReport {
    /// One row per index present in either scan.
    pub rows: Vec<CleanRow>,
}

impl CleanReport {
    /// Pairs two scans by index.
    #[must_use]
    pub fn compare(before: &[NodeView], after: &[NodeView]) -> Self {
        let mut rows: BTreeMap<u32, CleanRow> = BTreeMap::new();
        for view in before {
            rows.entry(view.index).or_insert_with(|| empty_clean_row(view.index)).size_before = view.payload_size;
        }
        for view in after {
            let row = rows.entry(view.index).or_insert_with(|| empty_clean_row(view.index));
            row.size_after = view.payload_size;
            row.is_cleaned = view.is_cleaned;
        }
        Self {
            rows: rows.into_values().collect(),
        }
    }

    /// Number of nodes that report cleaned.
    #[must_use]
    pub fn cleaned(&self) -> usize {
        self.rows.iter().filter(|row| row.is_cleaned).count()
    }

    /// Number of nodes whose payload strictly shrank.
    #[must_use]
    pub fn shrunk(&self) -> usize {
        self.rows.iter().filter(|row| row.shrunk()).count()
    }

    /// True when every node is cleaned and strictly smaller.
    #[must_use]
    pub fn all_shrunk(&self) -> bool {
        !self.rows.is_empty() && self.rows.iter().all(|row| row.is_cleaned && row.shrunk())
    }
}

fn empty_clean_row(index: u32) -> CleanRow {
    CleanRow {
        index,
        size_before: None,
        size_after: None,
        is_cleaned: false,
    }
}

impl fmt::Display for CleanReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "{:>6} {:>10} {:>10} {:>8}", "index", "before", "after", "cleaned")?;
        for row in &self.rows {
            writeln!(
                f,
                "{:>6} {:>10} {:>10} {:>8}",
                row.index,
                size_cell(row.size_before),
                size_cell(row.size_after),
                row.is_cleaned
            )?;
        }
        write!(f, "{}/{} nodes shrank", self.shrunk(), self.rows.len())
    }
}

fn size_cell(size: Option<u64>) -> String {
    size.map_or_else(|| "-".to_string(), |s| s.to_string())
}

/// Per-node result of a Destroy sweep.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DestroyRow {
    /// Ring index.
    pub index: u32,
    /// Node held material before the sweep.
    pub had_material: bool,
    /// Node holds material after the sweep.
    pub has_material: bool,
}

/// Presence of node material before and after a Destroy sweep.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct DestroyReport {
    /// One row per index present in either scan.
    pub rows: Vec<DestroyRow>,
}

impl DestroyReport {
    /// Pairs two scans by index.
    #[must_use]
    pub fn compare(before: &[NodeView], after: &[NodeView]) -> Self {
        let mut rows: BTreeMap<u32, DestroyRow> = BTreeMap::new();
        for view in before {
            rows.entry(view.index)
                .or_insert_with(|| empty_destroy_row(view.index))
                .had_material = view.has_material();
        }
        for view in after {
            rows.entry(view.index)
                .or_insert_with(|| empty_destroy_row(view.index))
                .has_material = view.has_material();
        }
        Self {
            rows: rows.into_values().collect(),
        }
    }

    /// Indices that still hold material.
    #[must_use]
    pub fn survivors(&self) -> Vec<u32> {
        self.rows.iter().filter(|row| row.has_material).map(|row| row.index).collect()
    }

    /// True when no node holds material.
    #[must_use]
    pub fn all_cleared(&self) -> bool {
        self.rows.iter().all(|row| !row.has_material)
    }
}

fn empty_destroy_row(index: u32) -> DestroyRow {
    DestroyRow {
        index,
        had_material: false,
        has_material: false,
    }
}

impl fmt::Display for DestroyReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "{:>6} {:>8} {:>8}", "index", "before", "after")?;
        for row in &self.rows {
            writeln!(
                f,
                "{:>6} {:>8} {:>8}",
                row.index,
                presence(row.had_material),
                presence(row.has_material)
            )?;
        }
        write!(f, "{} nodes still hold material", self.survivors().len())
    }
}

const fn presence(material: bool) -> &'static str {
    if material {
        "present"
    } else {
        "absent"
    }
}

use std::collections::BTreeMap;

use crate::Status;

pub type RowId = u64;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RowView {
    pub row_id: RowId,
    pub url: String,
    pub status: Status,
    pub symbol: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
struct Row {
    url: String,
    status: Status,
}

/// Host-side bookkeeping of candidate rows and their displayed status.
///
/// A row is requested at most once; once its status is terminal no later
/// update replaces it.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct RowTable {
    rows: BTreeMap<RowId, Row>,
    dirty: bool,
}

impl RowTable {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers a row as `Pending`. Returns false if the row was already requested,
    /// in which case the caller must not submit it again.
    pub fn request(&mut self, row_id: RowId, url: impl Into<String>) -> bool {
        if self.rows.contains_key(&row_id) {
            return false;
        }
        self.rows.insert(
            row_id,
            Row {
                url: url.into(),
                status: Status::Pending,
            },
        );
        self.dirty = true;
        true
    }

    /// Applies a status update. Unknown rows and rows already terminal are left untouched.
    pub fn apply(&mut self, row_id: RowId, status: Status) -> bool {
        let Some(row) = self.rows.get_mut(&row_id) else {
            return false;
        };
        if row.status.is_terminal() {
            return false;
        }
        row.status = status;
        self.dirty = true;
        true
    }

    pub fn status(&self, row_id: RowId) -> Option<Status> {
        self.rows.get(&row_id).map(|row| row.status)
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// True when every requested row has a terminal status.
    pub fn is_settled(&self) -> bool {
        self.rows.values().all(|row| row.status.is_terminal())
    }

    pub fn view(&self) -> Vec<RowView> {
        self.rows
            .iter()
            .map(|(row_id, row)| RowView {
                row_id: *row_id,
                url: row.url.clone(),
                status: row.status,
                symbol: row.status.symbol(),
            })
            .collect()
    }

    /// Returns whether anything changed since the last call, and clears the flag.
    pub fn consume_dirty(&mut self) -> bool {
        std::mem::take(&mut self.dirty)
    }
}

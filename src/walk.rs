//! Subtree enumeration with GETNEXT.
//!
//! [`walk_subtree`] follows GETNEXT from a root address and stops on the
//! first of:
//!
//! - an exception value (`endOfMibView`, `noSuchObject`, `noSuchInstance`)
//! - an address outside the root's subtree
//! - an address not greater than the previous one
//! - a request failure
//!
//! None of these is an error. Whatever was collected before the stop is
//! returned along with the reason in [`WalkResult::end`], so a failure
//! half-way through a table still yields the rows read so far.

use std::collections::BTreeMap;

use crate::engine::Engine;
use crate::error::Error;
use crate::oid::Oid;
use crate::value::Value;
use crate::varbind::VarBind;

/// Why a walk stopped.
#[derive(Debug)]
pub enum WalkEnd {
    EndOfMibView,
    NoSuchObject,
    NoSuchInstance,
    /// The agent returned an address outside the requested subtree.
    LeftSubtree,
    /// The agent returned an address not greater than the previous one.
    NonIncreasing,
    /// A request failed; earlier results are still valid.
    Failed(Box<Error>),
}

/// Varbinds in strictly increasing address order, all under the walk root.
#[derive(Debug)]
pub struct WalkResult {
    pub varbinds: Vec<VarBind>,
    pub end: WalkEnd,
}

impl WalkResult {
    /// True unless the walk was cut short by an error or a misbehaving agent.
    pub fn is_complete(&self) -> bool {
        !matches!(self.end, WalkEnd::Failed(_) | WalkEnd::NonIncreasing)
    }

    pub fn error(&self) -> Option<&Error> {
        match &self.end {
            WalkEnd::Failed(e) => Some(e),
            _ => None,
        }
    }

    pub fn len(&self) -> usize {
        self.varbinds.len()
    }

    pub fn is_empty(&self) -> bool {
        self.varbinds.is_empty()
    }

    pub fn iter(&self) -> std::slice::Iter<'_, VarBind> {
        self.varbinds.iter()
    }

    pub fn into_varbinds(self) -> Vec<VarBind> {
        self.varbinds
    }
}

impl IntoIterator for WalkResult {
    type Item = VarBind;
    type IntoIter = std::vec::IntoIter<VarBind>;

    fn into_iter(self) -> Self::IntoIter {
        self.varbinds.into_iter()
    }
}

/// Walk everything under `root`.
pub async fn walk_subtree<E: Engine>(engine: &E, root: &Oid) -> WalkResult {
    let mut varbinds = Vec::new();
    let mut cursor = root.clone();

    let end = loop {
        let vb = match engine.get_next(&cursor).await {
            Ok(vb) => vb,
            Err(e) => {
                tracing::warn!(target: "albedo_snmp::walk", { snmp.oid = %root, snmp.cursor = %cursor, collected = varbinds.len(), error = %e }, "walk stopped by error");
                break WalkEnd::Failed(e);
            }
        };

        match vb.value {
            Value::EndOfMibView => break WalkEnd::EndOfMibView,
            Value::NoSuchObject => break WalkEnd::NoSuchObject,
            Value::NoSuchInstance => break WalkEnd::NoSuchInstance,
            _ => {}
        }
        if !vb.oid.starts_with(root) {
            break WalkEnd::LeftSubtree;
        }
        if vb.oid <= cursor {
            tracing::warn!(target: "albedo_snmp::walk", { snmp.oid = %root, previous = %cursor, returned = %vb.oid }, "agent returned non-increasing OID");
            break WalkEnd::NonIncreasing;
        }

        cursor = vb.oid.clone();
        varbinds.push(vb);
    };

    tracing::debug!(target: "albedo_snmp::walk", { snmp.oid = %root, count = varbinds.len(), end = ?end }, "walk finished");
    WalkResult { varbinds, end }
}

/// Table cells grouped by row index.
///
/// Built from walk output and a list of column addresses. A varbind under
/// column `c` with address `column_oid.i1.i2...` lands in row `[i1, i2, ...]`
/// at position `c`; varbinds under no listed column are ignored.
#[derive(Debug, Clone, Default)]
pub struct TableRows {
    columns: Vec<Oid>,
    rows: BTreeMap<Vec<u32>, Vec<Option<Value>>>,
}

impl TableRows {
    pub fn group<'a>(columns: Vec<Oid>, varbinds: impl IntoIterator<Item = &'a VarBind>) -> Self {
        let mut rows: BTreeMap<Vec<u32>, Vec<Option<Value>>> = BTreeMap::new();
        for vb in varbinds {
            let Some((position, index)) = columns
                .iter()
                .enumerate()
                .find_map(|(i, column)| vb.oid.suffix_after(column).map(|index| (i, index)))
            else {
                continue;
            };
            if index.is_empty() {
                continue;
            }
            let cells = rows
                .entry(index.to_vec())
                .or_insert_with(|| vec![None; columns.len()]);
            cells[position] = Some(vb.value.clone());
        }
        Self { columns, rows }
    }

    pub fn columns(&self) -> &[Oid] {
        &self.columns
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// Rows in index order.
    pub fn rows(&self) -> impl Iterator<Item = (&[u32], &[Option<Value>])> {
        self.rows.iter().map(|(index, cells)| (index.as_slice(), cells.as_slice()))
    }

    pub fn cell(&self, index: &[u32], column: usize) -> Option<&Value> {
        self.rows.get(index)?.get(column)?.as_ref()
    }

    /// Index of the first row whose cell in `column` satisfies `predicate`.
    pub fn find(&self, column: usize, mut predicate: impl FnMut(&Value) -> bool) -> Option<&[u32]> {
        self.rows().find_map(|(index, cells)| {
            cells
                .get(column)?
                .as_ref()
                .filter(|value| predicate(value))
                .map(|_| index)
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::oid;

    #[test]
    fn group_by_index() {
        let class = oid!(1, 3, 6, 1, 4, 1, 39412, 1, 12, 2, 1, 2);
        let mode = oid!(1, 3, 6, 1, 4, 1, 39412, 1, 12, 2, 1, 3);
        let varbinds = vec![
            VarBind::new(class.child(1), Value::Integer(1)),
            VarBind::new(class.child(2), Value::Integer(2)),
            VarBind::new(mode.child(1), Value::Integer(0)),
            VarBind::new(mode.child(2), Value::Integer(1)),
            VarBind::new(oid!(1, 3, 6, 1, 4, 1, 39412, 1, 12, 2, 1, 4, 1), Value::Integer(9)),
        ];

        let rows = TableRows::group(vec![class, mode], &varbinds);
        assert_eq!(rows.len(), 2);
        assert_eq!(rows.cell(&[2], 1), Some(&Value::Integer(1)));
        assert_eq!(rows.find(0, |v| v.as_i32() == Some(2)), Some(&[2][..]));
        assert_eq!(rows.find(0, |v| v.as_i32() == Some(3)), None);
    }

    #[test]
    fn missing_cells_are_none() {
        let class = oid!(1, 3, 6, 1, 9, 2);
        let mode = oid!(1, 3, 6, 1, 9, 3);
        let varbinds = [VarBind::new(class.child(5), Value::Integer(1))];
        let rows = TableRows::group(vec![class, mode], &varbinds);
        assert_eq!(rows.cell(&[5], 0), Some(&Value::Integer(1)));
        assert_eq!(rows.cell(&[5], 1), None);
        assert_eq!(rows.cell(&[6], 0), None);
    }
}

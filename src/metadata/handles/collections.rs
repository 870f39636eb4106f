use std::{marker::PhantomData, ops::Range};

use crate::{codec::io::read_le_at_dyn, metadata::handles::RowHandle};

/// How a position inside a [`HandleRange`] maps to a physical row id
#[derive(Clone, Copy, Debug)]
pub(crate) enum RowMap<'a> {
    /// position == row id
    Identity,
    /// positions index a `*Ptr` table, whose single column holds the row id
    Ptr {
        /// the pointer table rows
        data: &'a [u8],
        /// width of the pointer column, 2 or 4
        width: usize,
    },
    /// positions index a permutation of row ids, e.g. a sort index
    Index(&'a [u32]),
}

impl RowMap<'_> {
    /// The row id at `position`, `None` where the map holds no row
    fn resolve(&self, position: u32) -> Option<u32> {
        let index = position.checked_sub(1)? as usize;
        let row = match self {
            RowMap::Identity => Some(position),
            RowMap::Ptr { data, width } => {
                let mut offset = index.checked_mul(*width)?;
                read_le_at_dyn(data, &mut offset, *width == 4).ok()
            }
            RowMap::Index(rows) => rows.get(index).copied(),
        };
        row.filter(|&row| row != 0)
    }
}

/// A lazily resolved run of typed handles
///
/// Produced by every query that returns "the rows of X belonging to Y": the fields of a type,
/// the custom attributes of a parent, all rows of a table. Row ids are resolved while
/// iterating, through a `*Ptr` table or a sort index where one is in effect, so callers always
/// observe logical row order.
///
/// A position whose resolved row id is 0 or not representable is skipped, so the range never
/// yields a nil handle.
#[derive(Clone, Debug)]
pub struct HandleRange<'a, H> {
    positions: Range<u32>,
    map: RowMap<'a>,
    _marker: PhantomData<H>,
}

impl<'a, H: RowHandle> HandleRange<'a, H> {
    pub(crate) fn new(positions: Range<u32>, map: RowMap<'a>) -> Self {
        HandleRange {
            positions,
            map,
            _marker: PhantomData,
        }
    }

    /// A range containing no handles
    #[must_use]
    pub fn empty() -> Self {
        HandleRange::new(0..0, RowMap::Identity)
    }

    /// Number of positions left in this range
    ///
    /// Exact when rows map to themselves. Through a `*Ptr` table or a sort index this is an
    /// upper bound, since positions holding no valid row are skipped by the iterator.
    #[must_use]
    pub fn len(&self) -> usize {
        self.positions.len()
    }

    /// Returns `true` if no positions are left; see [`HandleRange::len`]
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.positions.is_empty()
    }

    /// Returns `true` if the range would yield `handle`
    ///
    /// Linear in the length of the range unless rows map to themselves.
    #[must_use]
    pub fn contains(&self, handle: H) -> bool {
        let row = handle.row();
        match self.map {
            RowMap::Identity => self.positions.contains(&row),
            _ => self.clone().any(|candidate| candidate.row() == row),
        }
    }
}

impl<H: RowHandle> Iterator for HandleRange<'_, H> {
    type Item = H;

    fn next(&mut self) -> Option<H> {
        while let Some(position) = self.positions.next() {
            if let Some(handle) = self
                .map
                .resolve(position)
                .and_then(|row| H::from_row(row).ok())
            {
                return Some(handle);
            }
        }
        None
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        match self.map {
            RowMap::Identity => (self.positions.len(), Some(self.positions.len())),
            _ => (0, Some(self.positions.len())),
        }
    }
}

impl<H: RowHandle> DoubleEndedIterator for HandleRange<'_, H> {
    fn next_back(&mut self) -> Option<H> {
        while let Some(position) = self.positions.next_back() {
            if let Some(handle) = self
                .map
                .resolve(position)
                .and_then(|row| H::from_row(row).ok())
            {
                return Some(handle);
            }
        }
        None
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::metadata::handles::{FieldHandle, TypeDefHandle};

    #[test]
    fn identity() {
        let range = HandleRange::<TypeDefHandle>::new(2..5, RowMap::Identity);
        assert_eq!(range.len(), 3);
        assert!(range.contains(TypeDefHandle::from_row(4).unwrap()));
        assert!(!range.contains(TypeDefHandle::from_row(5).unwrap()));

        let rows: Vec<u32> = range.map(TypeDefHandle::row).collect();
        assert_eq!(rows, vec![2, 3, 4]);
    }

    #[test]
    fn through_pointer_table() {
        // FieldPtr rows: 3, 1, 2 (2-byte column)
        let data = [0x03, 0x00, 0x01, 0x00, 0x02, 0x00];
        let range = HandleRange::<FieldHandle>::new(1..4, RowMap::Ptr { data: &data, width: 2 });

        let rows: Vec<u32> = range.clone().map(FieldHandle::row).collect();
        assert_eq!(rows, vec![3, 1, 2]);

        let reversed: Vec<u32> = range.rev().map(FieldHandle::row).collect();
        assert_eq!(reversed, vec![2, 1, 3]);
    }

    #[test]
    fn zero_pointer_entries_are_skipped() {
        // FieldPtr rows: 2, 0, 4, 0 (4-byte column)
        let data = [2, 0, 0, 0, 0, 0, 0, 0, 4, 0, 0, 0, 0, 0, 0, 0];
        let range = HandleRange::<FieldHandle>::new(1..5, RowMap::Ptr { data: &data, width: 4 });

        assert_eq!(range.len(), 4);
        assert!(!range.contains(FieldHandle::NIL));
        let rows: Vec<u32> = range.clone().map(FieldHandle::row).collect();
        assert_eq!(rows, vec![2, 4]);
        assert_eq!(range.rev().count(), 2);
    }

    #[test]
    fn through_index() {
        let index = [5u32, 0x0100_0000, 0, 2];
        let range = HandleRange::<FieldHandle>::new(1..5, RowMap::Index(&index));
        let rows: Vec<u32> = range.map(FieldHandle::row).collect();
        assert_eq!(rows, vec![5, 2]);
    }

    #[test]
    fn empty() {
        let mut range = HandleRange::<FieldHandle>::empty();
        assert!(range.is_empty());
        assert_eq!(range.next(), None);
    }
}

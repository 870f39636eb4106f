use std::collections::{BTreeMap, HashMap};

use strum::IntoEnumIterator;

use crate::metadata::{
    streams::HeapSizes,
    tables::{columns, key_column, Column, TableId, TableInfo, TABLE_SLOTS},
};

/// Assembles a metadata block from heaps and raw table rows
///
/// Rows are stored as column values in schema order; missing trailing values are written as
/// 0. Reference widths are derived from the final row counts and heap sizes the same way a
/// compiler would, so the produced block is well formed unless a test asks otherwise.
///
/// ```rust,ignore
/// let mut builder = MetadataImageBuilder::new();
/// let widget = builder.type_def("Demo", "Widget", 0);
/// builder.field("count");
/// let image = builder.build();
/// ```
#[derive(Clone, Debug)]
pub struct MetadataImageBuilder {
    version: String,
    strings: Vec<u8>,
    string_offsets: HashMap<String, u32>,
    blobs: Vec<u8>,
    guids: Vec<u8>,
    user_strings: Vec<u8>,
    rows: BTreeMap<TableId, Vec<Vec<u32>>>,
    unsorted: u64,
    heap_sizes: HeapSizes,
    uncompressed: bool,
    minimal_delta: bool,
    extra_data: Option<u32>,
    pdb: Option<(u32, Vec<(TableId, u32)>)>,
    extra_streams: Vec<(String, Vec<u8>)>,
}

impl Default for MetadataImageBuilder {
    fn default() -> Self {
        Self::new()
    }
}

impl MetadataImageBuilder {
    /// An image with empty heaps and no tables
    pub fn new() -> Self {
        MetadataImageBuilder {
            version: "v4.0.30319".to_string(),
            strings: vec![0],
            string_offsets: HashMap::new(),
            blobs: vec![0],
            guids: Vec::new(),
            user_strings: vec![0],
            rows: BTreeMap::new(),
            unsorted: 0,
            heap_sizes: HeapSizes::empty(),
            uncompressed: false,
            minimal_delta: false,
            extra_data: None,
            pdb: None,
            extra_streams: Vec::new(),
        }
    }

    /// Add `value` to `#Strings`, identical strings share one entry
    pub fn string(&mut self, value: &str) -> u32 {
        if value.is_empty() {
            return 0;
        }
        if let Some(offset) = self.string_offsets.get(value) {
            return *offset;
        }

        let offset = self.raw_string(value.as_bytes());
        self.string_offsets.insert(value.to_string(), offset);
        offset
    }

    /// Add arbitrary bytes to `#Strings`, e.g. invalid UTF-8
    pub fn raw_string(&mut self, bytes: &[u8]) -> u32 {
        let offset = self.strings.len() as u32;
        self.strings.extend_from_slice(bytes);
        self.strings.push(0);
        offset
    }

    /// Add `value` to `#Blob`
    pub fn blob(&mut self, value: &[u8]) -> u32 {
        let offset = self.blobs.len() as u32;
        write_compressed(&mut self.blobs, value.len() as u32);
        self.blobs.extend_from_slice(value);
        offset
    }

    /// Add `value` to `#GUID`, returns its 1-based index
    pub fn guid(&mut self, value: [u8; 16]) -> u32 {
        self.guids.extend_from_slice(&value);
        (self.guids.len() / 16) as u32
    }

    /// Add `value` to `#US`
    pub fn user_string(&mut self, value: &str) -> u32 {
        let offset = self.user_strings.len() as u32;
        let mut bytes: Vec<u8> = value.encode_utf16().flat_map(u16::to_le_bytes).collect();
        bytes.push(0);

        write_compressed(&mut self.user_strings, bytes.len() as u32);
        self.user_strings.extend_from_slice(&bytes);
        offset
    }

    /// Append a row to `table`, returns its row id
    pub fn row(&mut self, table: TableId, values: &[u32]) -> u32 {
        let rows = self.rows.entry(table).or_default();
        rows.push(values.to_vec());
        rows.len() as u32
    }

    /// Number of rows added to `table`
    pub fn row_count(&self, table: TableId) -> u32 {
        self.rows.get(&table).map_or(0, |rows| rows.len() as u32)
    }

    /// Append a `TypeDef` row whose field and method lists start at the next rows
    pub fn type_def(&mut self, namespace: &str, name: &str, extends: u32) -> u32 {
        let name = self.string(name);
        let namespace = self.string(namespace);
        let field_list = self.row_count(TableId::Field) + 1;
        let method_list = self.row_count(TableId::MethodDef) + 1;
        self.row(
            TableId::TypeDef,
            &[0x0010_0001, name, namespace, extends, field_list, method_list],
        )
    }

    /// Append a `Field` row of type `int32`
    pub fn field(&mut self, name: &str) -> u32 {
        let name = self.string(name);
        let signature = self.blob(&[0x06, 0x08]);
        self.row(TableId::Field, &[0x0006, name, signature])
    }

    /// Append a `MethodDef` row whose parameter list starts at the next `Param` row
    pub fn method(&mut self, name: &str) -> u32 {
        let name = self.string(name);
        let signature = self.blob(&[0x20, 0x00, 0x01]);
        let param_list = self.row_count(TableId::Param) + 1;
        self.row(
            TableId::MethodDef,
            &[0, 0, 0x0086, name, signature, param_list],
        )
    }

    /// Append a `Param` row
    pub fn param(&mut self, sequence: u32, name: &str) -> u32 {
        let name = self.string(name);
        self.row(TableId::Param, &[0, sequence, name])
    }

    pub fn with_type_def(mut self, namespace: &str, name: &str) -> Self {
        self.type_def(namespace, name, 0);
        self
    }

    /// Append `count` identical rows, `count` may be 0 to mark an empty but present table
    pub fn with_rows(mut self, table: TableId, count: u32, values: &[u32]) -> Self {
        let rows = self.rows.entry(table).or_default();
        rows.extend((0..count).map(|_| values.to_vec()));
        self
    }

    pub fn with_version(mut self, version: &str) -> Self {
        self.version = version.to_string();
        self
    }

    /// Force heap index widths, large heaps set their flag on their own
    pub fn with_heap_sizes(mut self, heap_sizes: HeapSizes) -> Self {
        self.heap_sizes = heap_sizes;
        self
    }

    /// Clear the sorted bit of `table`, keyed tables are declared sorted otherwise
    pub fn with_unsorted(mut self, table: TableId) -> Self {
        self.unsorted |= table.mask();
        self
    }

    /// Emit `#-` instead of `#~`, implied by any `*Ptr` rows
    pub fn uncompressed(mut self) -> Self {
        self.uncompressed = true;
        self
    }

    /// Emit an empty `#JTD` stream, every reference becomes 4 bytes
    pub fn minimal_delta(mut self) -> Self {
        self.minimal_delta = true;
        self
    }

    pub fn with_extra_data(mut self, value: u32) -> Self {
        self.extra_data = Some(value);
        self
    }

    /// Emit a `#Pdb` stream with `entry_point` and the row counts of an external type system
    pub fn with_pdb(mut self, entry_point: u32, external: &[(TableId, u32)]) -> Self {
        let mut external = external.to_vec();
        external.sort_by_key(|(table, _)| *table);
        self.pdb = Some((entry_point, external));
        self
    }

    /// Emit an additional stream verbatim
    pub fn with_stream(mut self, name: &str, data: &[u8]) -> Self {
        self.extra_streams.push((name.to_string(), data.to_vec()));
        self
    }

    fn effective_heap_sizes(&self) -> HeapSizes {
        let mut heap_sizes = self.heap_sizes;
        if self.strings.len() > usize::from(u16::MAX) {
            heap_sizes |= HeapSizes::STRING_HEAP_LARGE;
        }
        if self.blobs.len() > usize::from(u16::MAX) {
            heap_sizes |= HeapSizes::BLOB_HEAP_LARGE;
        }
        if self.guids.len() / 16 > usize::from(u16::MAX) {
            heap_sizes |= HeapSizes::GUID_HEAP_LARGE;
        }
        heap_sizes.set(HeapSizes::EXTRA_DATA, self.extra_data.is_some());
        heap_sizes
    }

    fn tables_stream(&self) -> Vec<u8> {
        let mut rows = [0u32; TABLE_SLOTS];
        let mut valid = 0u64;
        for (table, table_rows) in &self.rows {
            rows[*table as usize] = table_rows.len() as u32;
            valid |= table.mask();
        }

        let sorted = TableId::iter()
            .filter(|table| key_column(*table).is_some())
            .fold(0u64, |mask, table| mask | table.mask())
            & !self.unsorted;

        let mut width_rows = rows;
        if let Some((_, external)) = &self.pdb {
            for (table, count) in external {
                width_rows[*table as usize] = *count;
            }
        }

        let heap_sizes = self.effective_heap_sizes();
        let info = TableInfo::new(width_rows, heap_sizes, self.minimal_delta);

        let mut data = vec![0, 0, 0, 0, 2, 0, heap_sizes.bits(), 1];
        data.extend_from_slice(&valid.to_le_bytes());
        data.extend_from_slice(&sorted.to_le_bytes());
        for table in TableId::iter().filter(|table| valid & table.mask() != 0) {
            data.extend_from_slice(&rows[table as usize].to_le_bytes());
        }
        if let Some(extra) = self.extra_data {
            data.extend_from_slice(&extra.to_le_bytes());
        }

        for (table, table_rows) in &self.rows {
            let schema = columns(*table);
            for row in table_rows {
                for (index, column) in schema.iter().enumerate() {
                    let value = row.get(index).copied().unwrap_or(0);
                    match column {
                        Column::U8 => data.extend_from_slice(&[value as u8, 0]),
                        _ if info.column_bytes(*column) == 4 => {
                            data.extend_from_slice(&value.to_le_bytes());
                        }
                        _ => data.extend_from_slice(&(value as u16).to_le_bytes()),
                    }
                }
            }
        }

        data
    }

    fn pdb_stream(&self) -> Option<Vec<u8>> {
        let (entry_point, external) = self.pdb.as_ref()?;

        let mut data = vec![0xAB; 20];
        let token = if *entry_point == 0 {
            0
        } else {
            0x0600_0000 | entry_point
        };
        data.extend_from_slice(&token.to_le_bytes());

        let referenced = external
            .iter()
            .fold(0u64, |mask, (table, _)| mask | table.mask());
        data.extend_from_slice(&referenced.to_le_bytes());
        for (_, count) in external {
            data.extend_from_slice(&count.to_le_bytes());
        }
        Some(data)
    }

    /// Lay out the root header, the stream directory and every stream
    pub fn build(&self) -> Vec<u8> {
        let tables_name = if self.uncompressed || self.rows.keys().any(|t| t.is_ptr_table()) {
            "#-"
        } else {
            "#~"
        };

        let mut streams: Vec<(&str, Vec<u8>)> = vec![
            (tables_name, self.tables_stream()),
            ("#Strings", self.strings.clone()),
        ];
        if self.user_strings.len() > 1 {
            streams.push(("#US", self.user_strings.clone()));
        }
        if !self.guids.is_empty() {
            streams.push(("#GUID", self.guids.clone()));
        }
        streams.push(("#Blob", self.blobs.clone()));
        if let Some(pdb) = self.pdb_stream() {
            streams.push(("#Pdb", pdb));
        }
        if self.minimal_delta {
            streams.push(("#JTD", Vec::new()));
        }
        for (name, data) in &self.extra_streams {
            streams.push((name.as_str(), data.clone()));
        }

        let version_len = align4(self.version.len() + 1);
        let directory: usize = streams
            .iter()
            .map(|(name, _)| 8 + align4(name.len() + 1))
            .sum();

        let mut image = Vec::new();
        image.extend_from_slice(&0x424A_5342u32.to_le_bytes());
        image.extend_from_slice(&1u16.to_le_bytes());
        image.extend_from_slice(&1u16.to_le_bytes());
        image.extend_from_slice(&0u32.to_le_bytes());
        image.extend_from_slice(&(version_len as u32).to_le_bytes());
        let mut version = self.version.as_bytes().to_vec();
        version.resize(version_len, 0);
        image.extend_from_slice(&version);
        image.extend_from_slice(&0u16.to_le_bytes());
        image.extend_from_slice(&(streams.len() as u16).to_le_bytes());

        let mut offset = image.len() + directory;
        for (name, data) in &streams {
            let size = align4(data.len());
            image.extend_from_slice(&(offset as u32).to_le_bytes());
            image.extend_from_slice(&(size as u32).to_le_bytes());
            let mut padded = name.as_bytes().to_vec();
            padded.resize(align4(name.len() + 1), 0);
            image.extend_from_slice(&padded);
            offset += size;
        }

        for (_, data) in &streams {
            image.extend_from_slice(data);
            image.resize(align4(image.len()), 0);
        }

        image
    }
}

fn align4(value: usize) -> usize {
    (value + 3) & !3
}

fn write_compressed(out: &mut Vec<u8>, value: u32) {
    if value < 0x80 {
        out.push(value as u8);
    } else if value < 0x4000 {
        out.extend_from_slice(&(value as u16 | 0x8000).to_be_bytes());
    } else {
        out.extend_from_slice(&(value | 0xC000_0000).to_be_bytes());
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::metadata::{
        root::Root,
        streams::{StreamKind, TablesHeader},
    };

    #[test]
    fn layout() {
        let mut builder = MetadataImageBuilder::new();
        builder.type_def("Demo", "Widget", 0);
        builder.field("count");
        builder.user_string("hello");
        builder.guid([1; 16]);
        let image = builder.build();

        let root = Root::read(&image).unwrap();
        assert_eq!(root.version, "v4.0.30319");
        assert_eq!(root.stream_headers.len(), 5);

        let tables = root.stream(StreamKind::Tables).unwrap();
        let header = TablesHeader::from(tables.data(&image).unwrap()).unwrap();
        assert_eq!(header.row_count(TableId::TypeDef), 1);
        assert_eq!(header.row_count(TableId::Field), 1);
        assert_eq!(header.column(TableId::TypeDef, 1, 4).unwrap(), 1);
    }

    #[test]
    fn strings_are_shared() {
        let mut builder = MetadataImageBuilder::new();
        let first = builder.string("Widget");
        assert_eq!(first, 1);
        assert_eq!(builder.string("Widget"), first);
        assert_eq!(builder.string(""), 0);
        assert_eq!(builder.string("Gadget"), 8);
    }
}

use std::{
    collections::{HashMap, hash_map::Entry},
    fs::File,
    io::{ErrorKind, Read, Seek, SeekFrom},
    path::{Path, PathBuf},
};

use crate::error::GethDbError;

const INDEX_ENTRY_SIZE: u64 = 6;

/// One anchor in a freezer index file: 6 bytes, big-endian
/// `u16 file_number || u32 offset`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct IndexEntry {
    pub file_number: u16,
    pub offset: u32,
}

impl IndexEntry {
    fn from_bytes(bytes: [u8; 6]) -> Self {
        Self {
            file_number: u16::from_be_bytes([bytes[0], bytes[1]]),
            offset: u32::from_be_bytes([bytes[2], bytes[3], bytes[4], bytes[5]]),
        }
    }
}

/// Random access into one column of geth's append-only freezer.
///
/// The index holds `entries + 1` anchors: anchor `i` marks the start of item
/// `i` and anchor `i + 1` its end. Data lives in numbered shard files next to
/// the index; shard handles are opened lazily and kept for the lifetime of
/// the table.
pub struct FreezerTable {
    dir: PathBuf,
    name: String,
    compressed: bool,
    entries: u64,
    index: File,
    data_files: HashMap<u16, File>,
}

impl FreezerTable {
    pub fn open(
        dir: impl AsRef<Path>,
        name: &str,
        compressed: bool,
    ) -> Result<Self, GethDbError> {
        let dir = dir.as_ref().to_path_buf();
        let extension = if compressed { "cidx" } else { "ridx" };
        let index_path = dir.join(format!("{name}.{extension}"));
        let index = open_file(&index_path)?;

        let index_size = index.metadata()?.len();
        // even an empty table carries one terminator anchor
        if index_size == 0 || index_size % INDEX_ENTRY_SIZE != 0 {
            return Err(GethDbError::Corrupt(format!(
                "index {} has size {index_size}, not a positive multiple of {INDEX_ENTRY_SIZE}",
                index_path.display()
            )));
        }

        Ok(Self {
            dir,
            name: name.to_string(),
            compressed,
            entries: index_size / INDEX_ENTRY_SIZE - 1,
            index,
            data_files: HashMap::new(),
        })
    }

    /// Number of items in the table.
    pub fn len(&self) -> u64 {
        self.entries
    }

    pub fn is_empty(&self) -> bool {
        self.entries == 0
    }

    pub fn first_index(&mut self) -> Result<IndexEntry, GethDbError> {
        self.read_index_entry(0)
    }

    pub fn last_index(&mut self) -> Result<IndexEntry, GethDbError> {
        self.read_index_entry(self.entries)
    }

    /// Reads item `index` back exactly as the producer appended it.
    pub fn get(&mut self, index: u64) -> Result<Vec<u8>, GethDbError> {
        if index >= self.entries {
            return Err(GethDbError::OutOfRange {
                index,
                entries: self.entries,
            });
        }

        let mut start = self.read_index_entry(index)?;
        let end = self.read_index_entry(index + 1)?;
        if start.file_number != end.file_number {
            // items never straddle shards: the first item of a shard keeps a
            // start anchor pointing into the previous file, and really spans
            // [0, end.offset) of the end anchor's file
            start = IndexEntry {
                file_number: end.file_number,
                offset: 0,
            };
        }
        if end.offset < start.offset {
            return Err(GethDbError::Corrupt(format!(
                "item {index} of table {} ends at {} before its start {}",
                self.name, end.offset, start.offset
            )));
        }

        let length = (end.offset - start.offset) as usize;
        let name = self.name.clone();
        let file = self.data_file(start.file_number)?;
        file.seek(SeekFrom::Start(start.offset as u64))?;
        let mut data = vec![0; length];
        file.read_exact(&mut data).map_err(|err| match err.kind() {
            ErrorKind::UnexpectedEof => GethDbError::Corrupt(format!(
                "short read of item {index} in table {name}"
            )),
            _ => GethDbError::Io(err),
        })?;

        if !self.compressed {
            return Ok(data);
        }
        snap::raw::Decoder::new()
            .decompress_vec(&data)
            .map_err(|err| {
                GethDbError::Corrupt(format!("item {index} of table {name}: {err}"))
            })
    }

    fn read_index_entry(&mut self, position: u64) -> Result<IndexEntry, GethDbError> {
        self.index
            .seek(SeekFrom::Start(position * INDEX_ENTRY_SIZE))?;
        let mut buf = [0u8; 6];
        self.index.read_exact(&mut buf).map_err(|err| match err.kind() {
            ErrorKind::UnexpectedEof => GethDbError::Corrupt(format!(
                "short read of index anchor {position} in table {}",
                self.name
            )),
            _ => GethDbError::Io(err),
        })?;
        Ok(IndexEntry::from_bytes(buf))
    }

    fn data_file(&mut self, number: u16) -> Result<&mut File, GethDbError> {
        match self.data_files.entry(number) {
            Entry::Occupied(entry) => Ok(entry.into_mut()),
            Entry::Vacant(entry) => {
                let extension = if self.compressed { "cdat" } else { "rdat" };
                let path = self.dir.join(format!("{}.{number:04}.{extension}", self.name));
                Ok(entry.insert(open_file(&path)?))
            }
        }
    }
}

fn open_file(path: &Path) -> Result<File, GethDbError> {
    File::open(path).map_err(|err| match err.kind() {
        ErrorKind::NotFound => GethDbError::MissingShard(path.to_path_buf()),
        _ => GethDbError::Io(err),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_utils::write_freezer_table;
    use tempdir::TempDir;

    #[test]
    fn reads_across_shard_rollover() {
        let dir = TempDir::new("freezer").unwrap();
        let shard0: Vec<u8> = (0u16..200).map(|i| i as u8).collect();
        let shard1: Vec<u8> = (0u8..50).map(|i| i ^ 0xff).collect();
        // three items: [0, 100) and [100, 200) of shard 0, then all of shard 1
        write_freezer_table(
            dir.path(),
            "bodies",
            false,
            &[(0, 0), (0, 100), (0, 200), (1, 50)],
            &[shard0.clone(), shard1.clone()],
        );

        let mut table = FreezerTable::open(dir.path(), "bodies", false).unwrap();
        assert_eq!(table.len(), 3);
        assert_eq!(table.get(0).unwrap(), shard0[..100]);
        assert_eq!(table.get(1).unwrap(), shard0[100..]);
        // the rollover rule: start and end anchors disagree on the file, so
        // the item is the head of the end anchor's shard
        assert_eq!(table.get(2).unwrap(), shard1);

        assert_eq!(
            table.first_index().unwrap(),
            IndexEntry {
                file_number: 0,
                offset: 0
            }
        );
        assert_eq!(
            table.last_index().unwrap(),
            IndexEntry {
                file_number: 1,
                offset: 50
            }
        );
    }

    #[test]
    fn roundtrips_compressed_items() {
        let dir = TempDir::new("freezer").unwrap();
        let items: Vec<Vec<u8>> = vec![b"first item".to_vec(), vec![0xab; 300], Vec::new()];

        let mut shard = Vec::new();
        let mut anchors = vec![(0u16, 0u32)];
        for item in &items {
            let compressed = snap::raw::Encoder::new().compress_vec(item).unwrap();
            shard.extend_from_slice(&compressed);
            anchors.push((0, shard.len() as u32));
        }
        write_freezer_table(dir.path(), "headers", true, &anchors, &[shard]);

        let mut table = FreezerTable::open(dir.path(), "headers", true).unwrap();
        assert_eq!(table.len(), items.len() as u64);
        for (i, item) in items.iter().enumerate() {
            assert_eq!(&table.get(i as u64).unwrap(), item);
        }
    }

    #[test]
    fn out_of_range_is_an_error() {
        let dir = TempDir::new("freezer").unwrap();
        write_freezer_table(dir.path(), "hashes", false, &[(0, 0), (0, 4)], &[vec![9; 4]]);
        let mut table = FreezerTable::open(dir.path(), "hashes", false).unwrap();
        assert!(matches!(
            table.get(1),
            Err(GethDbError::OutOfRange {
                index: 1,
                entries: 1
            })
        ));
    }

    #[test]
    fn missing_index_is_a_missing_shard() {
        let dir = TempDir::new("freezer").unwrap();
        assert!(matches!(
            FreezerTable::open(dir.path(), "receipts", true),
            Err(GethDbError::MissingShard(_))
        ));
    }

    #[test]
    fn missing_data_shard_is_reported() {
        let dir = TempDir::new("freezer").unwrap();
        // anchors claim a shard that was never written
        write_freezer_table(dir.path(), "bodies", false, &[(0, 0), (0, 10)], &[]);
        let mut table = FreezerTable::open(dir.path(), "bodies", false).unwrap();
        assert!(matches!(table.get(0), Err(GethDbError::MissingShard(_))));
    }

    #[test]
    fn truncated_index_is_corrupt() {
        let dir = TempDir::new("freezer").unwrap();
        std::fs::write(dir.path().join("hashes.ridx"), [0u8; 7]).unwrap();
        assert!(matches!(
            FreezerTable::open(dir.path(), "hashes", false),
            Err(GethDbError::Corrupt(_))
        ));
        // an empty table still needs its terminator anchor
        std::fs::write(dir.path().join("hashes.ridx"), []).unwrap();
        assert!(matches!(
            FreezerTable::open(dir.path(), "hashes", false),
            Err(GethDbError::Corrupt(_))
        ));
    }

    #[test]
    fn short_data_read_is_corrupt() {
        let dir = TempDir::new("freezer").unwrap();
        // index claims 10 bytes, shard only has 4
        write_freezer_table(dir.path(), "bodies", false, &[(0, 0), (0, 10)], &[vec![1; 4]]);
        let mut table = FreezerTable::open(dir.path(), "bodies", false).unwrap();
        assert!(matches!(table.get(0), Err(GethDbError::Corrupt(_))));
    }

    #[test]
    fn garbage_compressed_item_is_corrupt() {
        let dir = TempDir::new("freezer").unwrap();
        write_freezer_table(
            dir.path(),
            "headers",
            true,
            &[(0, 0), (0, 8)],
            &[vec![0xff; 8]],
        );
        let mut table = FreezerTable::open(dir.path(), "headers", true).unwrap();
        assert!(matches!(table.get(0), Err(GethDbError::Corrupt(_))));
    }
}

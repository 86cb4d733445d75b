use std::{fs, path::Path};

/// Lays a freezer table out on disk: packed 6-byte anchors in the index
/// file, shard `i` of `shards` as data file `i`.
pub(crate) fn write_freezer_table(
    dir: &Path,
    name: &str,
    compressed: bool,
    anchors: &[(u16, u32)],
    shards: &[Vec<u8>],
) {
    let (index_ext, data_ext) = if compressed {
        ("cidx", "cdat")
    } else {
        ("ridx", "rdat")
    };

    let mut index = Vec::with_capacity(anchors.len() * 6);
    for (file_number, offset) in anchors {
        index.extend_from_slice(&file_number.to_be_bytes());
        index.extend_from_slice(&offset.to_be_bytes());
    }
    fs::write(dir.join(format!("{name}.{index_ext}")), index).unwrap();

    for (number, shard) in shards.iter().enumerate() {
        fs::write(dir.join(format!("{name}.{number:04}.{data_ext}")), shard).unwrap();
    }
}

/// Compresses each item and writes a single-shard compressed table,
/// returning nothing; anchors are derived from the compressed sizes.
pub(crate) fn write_compressed_items(dir: &Path, name: &str, items: &[Vec<u8>]) {
    let mut shard = Vec::new();
    let mut anchors = vec![(0u16, 0u32)];
    for item in items {
        let compressed = snap::raw::Encoder::new().compress_vec(item).unwrap();
        shard.extend_from_slice(&compressed);
        anchors.push((0, shard.len() as u32));
    }
    write_freezer_table(dir, name, true, &anchors, &[shard]);
}

/// Writes an uncompressed single-shard table of fixed-size items.
pub(crate) fn write_raw_items(dir: &Path, name: &str, items: &[Vec<u8>]) {
    let mut shard = Vec::new();
    let mut anchors = vec![(0u16, 0u32)];
    for item in items {
        shard.extend_from_slice(item);
        anchors.push((0, shard.len() as u32));
    }
    write_freezer_table(dir, name, false, &anchors, &[shard]);
}

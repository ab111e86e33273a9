use crate::constants::MAX_PART_COUNT;

/// A contiguous byte range of the local file uploaded as one part.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct PartRange {
    /// 1-based, as the storage service numbers parts.
    pub part_number: i32,
    pub offset: u64,
    pub size: u64,
}

/// Returns the part size to use for a file of `file_size` bytes.
///
/// The requested size is kept unless the file would need more than
/// [MAX_PART_COUNT] parts, in which case the parts grow just enough to fit.
pub fn effective_part_size(file_size: u64, requested_part_size: u64) -> u64 {
    requested_part_size.max(1).max(file_size.div_ceil(MAX_PART_COUNT))
}

/// Splits a file into consecutive parts of `part_size` bytes; the last part
/// holds the remainder.  An empty file has no parts.
pub fn plan_parts(file_size: u64, part_size: u64) -> Vec<PartRange> {
    let part_size = part_size.max(1);
    let n_parts = file_size.div_ceil(part_size);

    (0..n_parts)
        .map(|i| {
            let offset = i * part_size;
            PartRange {
                part_number: (i + 1) as i32,
                offset,
                size: part_size.min(file_size - offset),
            }
        })
        .collect()
}

use crate::model::LineStats;
use similar::{ChangeTag, TextDiff};

const BINARY_PROBE_LEN: usize = 8192;

/// A NUL byte early in the blob marks it as binary, like git does.
pub fn is_binary(data: &[u8]) -> bool {
    data.iter().take(BINARY_PROBE_LEN).any(|&b| b == 0)
}

/// Line insertions and deletions between two blob contents.
///
/// Binary content on either side counts as no line change.
pub fn line_changes(old: &[u8], new: &[u8]) -> LineStats {
    if is_binary(old) || is_binary(new) {
        return LineStats::default();
    }

    let old_text = String::from_utf8_lossy(old);
    let new_text = String::from_utf8_lossy(new);
    let diff = TextDiff::from_lines(old_text.as_ref(), new_text.as_ref());

    let mut stats = LineStats::default();
    for change in diff.iter_all_changes() {
        match change.tag() {
            ChangeTag::Insert => stats.insertions += 1,
            ChangeTag::Delete => stats.deletions += 1,
            ChangeTag::Equal => {}
        }
    }
    stats
}

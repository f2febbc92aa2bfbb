//! File table entries — path, contents, and lifecycle state.

use crate::loc::Detail;

/// Index into the global file table. Id 0 is the null sentinel; real files
/// are dense starting at 1 and keep their id for the lifetime of a state.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct FileRef(pub u32);

impl FileRef {
    pub const NULL: FileRef = FileRef(0);

    pub fn new(id: u32) -> Self {
        Self(id)
    }

    pub fn id(self) -> u32 {
        self.0
    }

    pub fn exists(self) -> bool {
        self.0 != 0
    }
}

impl Default for FileRef {
    fn default() -> Self {
        FileRef::NULL
    }
}

/// Where a file's contents came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SourceType {
    /// Ordinary workspace source.
    Normal,
    /// Built-in stub source shipped with the checker; addressed by bare path.
    Payload,
    /// Logically deleted slot. Keeps its id so indexing stays dense; its
    /// accumulated diagnostics are garbage-collected on the next drain.
    TombStone,
}

/// One source file. Line starts are precomputed so location conversion is a
/// binary search.
#[derive(Debug, Clone)]
pub struct File {
    path: String,
    source: String,
    pub source_type: SourceType,
    line_starts: Vec<u32>,
}

impl File {
    pub fn new(path: impl Into<String>, source: impl Into<String>, source_type: SourceType) -> Self {
        let source = source.into();
        let line_starts = compute_line_starts(&source);
        Self {
            path: path.into(),
            source,
            source_type,
            line_starts,
        }
    }

    /// A tombstone keeping the slot of a deleted file.
    pub fn tombstone(path: impl Into<String>) -> Self {
        Self::new(path, "", SourceType::TombStone)
    }

    pub fn path(&self) -> &str {
        &self.path
    }

    pub fn source(&self) -> &str {
        &self.source
    }

    /// Convert a byte offset into a one-based (line, column) pair.
    pub fn offset_to_detail(&self, offset: u32) -> Detail {
        let line_idx = match self.line_starts.binary_search(&offset) {
            Ok(exact) => exact,
            Err(insert) => insert.saturating_sub(1),
        };
        Detail {
            line: line_idx as u32 + 1,
            column: offset - self.line_starts[line_idx] + 1,
        }
    }

    /// Convert a one-based (line, column) pair into a byte offset. Positions
    /// past the end of a line or the file are clamped.
    pub fn detail_to_offset(&self, detail: Detail) -> u32 {
        if detail.line == 0 {
            return 0;
        }
        let line_idx = ((detail.line - 1) as usize).min(self.line_starts.len() - 1);
        let line_start = self.line_starts[line_idx];
        let line_end = self
            .line_starts
            .get(line_idx + 1)
            .copied()
            .unwrap_or(self.source.len() as u32);
        (line_start + detail.column.saturating_sub(1)).min(line_end)
    }

    pub fn line_count(&self) -> usize {
        self.line_starts.len()
    }
}

fn compute_line_starts(source: &str) -> Vec<u32> {
    let mut starts = vec![0];
    for (i, b) in source.bytes().enumerate() {
        if b == b'\n' {
            starts.push(i as u32 + 1);
        }
    }
    starts
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_fileref_null() {
        assert!(!FileRef::NULL.exists());
        assert!(FileRef::new(1).exists());
    }

    #[test]
    fn test_offset_to_detail() {
        let f = File::new("a.rb", "abc\ndef\n", SourceType::Normal);
        assert_eq!(f.offset_to_detail(0), Detail { line: 1, column: 1 });
        assert_eq!(f.offset_to_detail(2), Detail { line: 1, column: 3 });
        assert_eq!(f.offset_to_detail(4), Detail { line: 2, column: 1 });
        assert_eq!(f.offset_to_detail(6), Detail { line: 2, column: 3 });
    }

    #[test]
    fn test_detail_to_offset_roundtrip() {
        let f = File::new("a.rb", "class A\n  def f\n  end\nend\n", SourceType::Normal);
        for offset in 0..f.source().len() as u32 {
            let detail = f.offset_to_detail(offset);
            assert_eq!(f.detail_to_offset(detail), offset);
        }
    }

    #[test]
    fn test_detail_to_offset_clamps() {
        let f = File::new("a.rb", "ab\ncd", SourceType::Normal);
        // Past end of line one: clamp to the newline.
        assert_eq!(f.detail_to_offset(Detail { line: 1, column: 99 }), 3);
        // Past last line: clamp to end of file.
        assert_eq!(f.detail_to_offset(Detail { line: 2, column: 99 }), 5);
    }

    #[test]
    fn test_tombstone() {
        let f = File::tombstone("gone.rb");
        assert_eq!(f.source_type, SourceType::TombStone);
        assert_eq!(f.source(), "");
    }
}

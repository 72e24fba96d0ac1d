//! Shared two-phase CSV import machinery for §6.4: every row is validated
//! before any row is written; a single invalid row rolls the whole import
//! back and returns a per-row error report instead.
//!
//! GBK fallback decoding is not implemented here — the teacher's workspace
//! and the wider example pack carry no encoding-detection crate, and adding
//! one purely for this path would be a dependency invented from nothing
//! rather than grounded on the corpus. UTF-8 (with an optional BOM) is the
//! only accepted encoding; see DESIGN.md.

pub const UTF8_BOM: [u8; 3] = [0xEF, 0xBB, 0xBF];

pub fn strip_bom(data: &[u8]) -> &[u8] {
    data.strip_prefix(&UTF8_BOM).unwrap_or(data)
}

#[derive(Debug, Clone, PartialEq)]
pub struct ImportError {
    /// 1-based, counting the header as row 1.
    pub row: usize,
    pub message: String,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct ImportReport {
    pub inserted: usize,
    pub errors: Vec<ImportError>,
}

impl ImportReport {
    pub fn is_success(&self) -> bool {
        self.errors.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn strips_bom_when_present() {
        let mut data = UTF8_BOM.to_vec();
        data.extend_from_slice(b"hostname,ip\n");
        assert_eq!(strip_bom(&data), b"hostname,ip\n");
    }

    #[test]
    fn leaves_plain_utf8_untouched() {
        assert_eq!(strip_bom(b"hostname,ip\n"), b"hostname,ip\n");
    }
}

//! VMA line parsing for `/proc/<pid>/maps`.
//!
//! Each mapping-table row has fixed-width leading fields:
//!
//! ```text
//! <hex_start>-<hex_end> <perms> <hex_offset> <dev> <inode> [<path>]
//! ```
//!
//! The optional path is taken from a fixed column by default (column 49, the
//! canonical layout), or from the sixth whitespace-delimited field when the
//! token locator is selected.

use crate::error::VmaParseError;
use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Serialize, Serializer};
use std::fmt;

/// Label for mappings without a backing file.
pub const ANON_NAME: &str = "[anon]";
/// Label the kernel reports for the process heap.
pub const HEAP_NAME: &str = "[heap]";
/// Label the kernel reports for the virtual dynamic shared object.
pub const VDSO_NAME: &str = "[vdso]";

/// Column where the path field starts in the canonical maps layout.
pub const PATH_COLUMN: usize = 49;

/// Number of leading fields before the path in the token layout.
const LEADING_FIELDS: usize = 5;

static VMA_LINE_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^([0-9a-f]+)-([0-9a-f]+)\s+(\S+)\s+([0-9a-f]+)")
        .expect("vma line pattern is valid")
});

/// How the trailing path field is located in a mapping line.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PathLocator {
    /// Everything from this column onwards, leading whitespace trimmed.
    FixedColumn(usize),
    /// Everything after the inode field.
    Tokens,
}

impl Default for PathLocator {
    fn default() -> Self {
        PathLocator::FixedColumn(PATH_COLUMN)
    }
}

/// The resource a VMA is mapped from.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Backing {
    Anonymous,
    Heap,
    Vdso,
    /// Any other bracketed kernel label, e.g. `[stack]` or `[vvar]`.
    Pseudo(String),
    File(String),
}

impl Backing {
    /// Classifies a trailing path field. An empty field is anonymous memory.
    pub fn from_field(field: &str) -> Self {
        match field {
            "" | ANON_NAME => Backing::Anonymous,
            HEAP_NAME => Backing::Heap,
            VDSO_NAME => Backing::Vdso,
            f if f.starts_with('[') && f.ends_with(']') => Backing::Pseudo(f.to_string()),
            f => Backing::File(f.to_string()),
        }
    }

    /// The label exactly as it appears in the mapping table.
    pub fn label(&self) -> &str {
        match self {
            Backing::Anonymous => ANON_NAME,
            Backing::Heap => HEAP_NAME,
            Backing::Vdso => VDSO_NAME,
            Backing::Pseudo(label) => label,
            Backing::File(path) => path,
        }
    }

    pub fn is_file_backed(&self) -> bool {
        matches!(self, Backing::File(_))
    }
}

impl fmt::Display for Backing {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

impl Serialize for Backing {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(self.label())
    }
}

/// One row of a process mapping table.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Vma {
    start: u64,
    end: u64,
    permissions: String,
    offset: u64,
    backing: Backing,
}

impl Vma {
    pub fn start(&self) -> u64 {
        self.start
    }

    pub fn end(&self) -> u64 {
        self.end
    }

    pub fn permissions(&self) -> &str {
        &self.permissions
    }

    /// Offset of the VMA start within the backing file.
    /// Meaningless unless the VMA is file backed.
    pub fn offset(&self) -> u64 {
        self.offset
    }

    pub fn backing(&self) -> &Backing {
        &self.backing
    }

    /// Length of the address range in bytes.
    pub fn vm_size(&self) -> u64 {
        self.end - self.start
    }

    pub fn is_vdso(&self) -> bool {
        self.backing == Backing::Vdso
    }

    pub fn is_file_backed(&self) -> bool {
        self.backing.is_file_backed()
    }
}

impl fmt::Display for Vma {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:x}-{:x}: {}", self.start, self.end, self.backing)
    }
}

/// Parses one mapping line using the canonical fixed path column.
pub fn parse_vma_line(line: &str) -> Result<Vma, VmaParseError> {
    parse_vma_line_with(line, PathLocator::default())
}

/// Parses one mapping line (terminator already stripped).
///
/// Returns [`VmaParseError::MalformedLine`] for input that does not have the
/// mapping shape; the caller drops such lines. [`VmaParseError::MissingField`]
/// means the pattern matched without capturing a structural field and must
/// be treated as fatal.
pub fn parse_vma_line_with(line: &str, locator: PathLocator) -> Result<Vma, VmaParseError> {
    let malformed = || VmaParseError::MalformedLine {
        line: line.to_string(),
    };

    let caps = VMA_LINE_RE.captures(line).ok_or_else(malformed)?;
    let field = |idx: usize, field: &'static str| {
        caps.get(idx)
            .map(|m| m.as_str())
            .ok_or(VmaParseError::MissingField { field })
    };

    let hex_start = field(1, "start")?;
    let hex_end = field(2, "end")?;
    let permissions = field(3, "permissions")?;
    let hex_offset = field(4, "offset")?;

    let start = u64::from_str_radix(hex_start, 16).map_err(|_| malformed())?;
    let end = u64::from_str_radix(hex_end, 16).map_err(|_| malformed())?;
    let offset = u64::from_str_radix(hex_offset, 16).map_err(|_| malformed())?;
    if start >= end {
        return Err(malformed());
    }

    let path_field = match locator {
        PathLocator::FixedColumn(column) => tail_from_column(line, column),
        PathLocator::Tokens => tail_after_fields(line, LEADING_FIELDS),
    };

    Ok(Vma {
        start,
        end,
        permissions: permissions.to_string(),
        offset,
        backing: Backing::from_field(path_field),
    })
}

/// Text from `column` onwards with leading whitespace removed. Lines shorter
/// than the column yield an empty field. A column inside a multi-byte
/// character moves forward to the next character boundary.
fn tail_from_column(line: &str, column: usize) -> &str {
    if line.len() < column {
        return "";
    }
    let mut idx = column;
    while !line.is_char_boundary(idx) {
        idx += 1;
    }
    line[idx..].trim_start()
}

/// Text following the first `count` whitespace-delimited fields.
fn tail_after_fields(line: &str, count: usize) -> &str {
    let mut rest = line;
    for _ in 0..count {
        rest = rest.trim_start();
        match rest.find(char::is_whitespace) {
            Some(idx) => rest = &rest[idx..],
            None => return "",
        }
    }
    rest.trim_start()
}

#[cfg(test)]
mod tests {
    use super::*;

    const DBUS_LINE: &str = "00400000-00452000 r-xp 00000000 08:02 173521                             /usr/bin/dbus-daemon";

    // -------------------------------------------------------------------------
    // Tests for parse_vma_line
    // -------------------------------------------------------------------------

    #[test]
    fn test_parse_file_backed_line() {
        let vma = parse_vma_line(DBUS_LINE).expect("line should parse");
        assert_eq!(vma.start(), 0x0040_0000);
        assert_eq!(vma.end(), 0x0045_2000);
        assert_eq!(vma.permissions(), "r-xp");
        assert_eq!(vma.offset(), 0);
        assert_eq!(vma.backing(), &Backing::File("/usr/bin/dbus-daemon".into()));
        assert!(vma.is_file_backed());
        assert_eq!(vma.vm_size(), 0x52000);
    }

    #[test]
    fn test_parse_short_line_is_anonymous() {
        let line = "7f2a1c000000-7f2a1c021000 rw-p 00000000 00:00 0 ";
        assert!(line.len() < PATH_COLUMN);

        let vma = parse_vma_line(line).expect("line should parse");
        assert_eq!(vma.start(), 0x7f2a_1c00_0000);
        assert_eq!(vma.end(), 0x7f2a_1c02_1000);
        assert_eq!(vma.backing(), &Backing::Anonymous);
        assert_eq!(vma.backing().label(), ANON_NAME);
    }

    #[test]
    fn test_short_line_with_label_or_path_is_anonymous() {
        for line in [
            "0804a000-0806b000 rw-p 0804a000 00:00 0 [heap]",
            "00400000-00452000 r-xp 00000000 08:02 1 /bin/sh",
        ] {
            assert!(line.len() < PATH_COLUMN);
            let vma = parse_vma_line(line).expect("line should parse");
            assert_eq!(vma.backing(), &Backing::Anonymous, "{line:?}");
            assert!(!vma.is_file_backed());
        }
    }

    #[test]
    fn test_parse_empty_trailing_field_is_anonymous() {
        // Long enough to reach the path column, but only padding beyond it.
        let line = format!("{:<60}", "08048000-08049000 rw-p 00001000 00:00 0");
        assert!(line.len() >= PATH_COLUMN);

        let vma = parse_vma_line(&line).expect("line should parse");
        assert_eq!(vma.backing(), &Backing::Anonymous);

        let exact = format!("{:<49}", "08048000-08049000 rw-p 00001000 00:00 0");
        assert_eq!(exact.len(), PATH_COLUMN);
        let vma = parse_vma_line(&exact).expect("line should parse");
        assert_eq!(vma.backing(), &Backing::Anonymous);
    }

    #[test]
    fn test_parse_markers_preserved() {
        let heap = "0804a000-0806b000 rw-p 0804a000 00:00 0          [heap]";
        let vma = parse_vma_line(heap).expect("heap line should parse");
        assert_eq!(vma.backing(), &Backing::Heap);
        assert_eq!(vma.backing().label(), "[heap]");
        assert!(!vma.is_file_backed());

        let vdso = "ffffe000-fffff000 ---p 00000000 00:00 0          [vdso]";
        let vma = parse_vma_line(vdso).expect("vdso line should parse");
        assert!(vma.is_vdso());
        assert_eq!(vma.backing().label(), VDSO_NAME);

        let stack = "bffeb000-c0000000 rw-p bffeb000 00:00 0          [stack]";
        let vma = parse_vma_line(stack).expect("stack line should parse");
        assert_eq!(vma.backing(), &Backing::Pseudo("[stack]".into()));
        assert_eq!(vma.backing().label(), "[stack]");
    }

    #[test]
    fn test_parse_garbage_is_malformed() {
        let err = parse_vma_line("garbage text").unwrap_err();
        assert_eq!(
            err,
            VmaParseError::MalformedLine {
                line: "garbage text".into()
            }
        );
        assert!(parse_vma_line("").unwrap_err().is_malformed_line());
        assert!(parse_vma_line("00400000 r-xp 00000000").unwrap_err().is_malformed_line());
    }

    #[test]
    fn test_parse_rejects_inverted_and_overflowing_ranges() {
        let inverted = "00452000-00400000 r-xp 00000000 08:02 173521";
        assert!(parse_vma_line(inverted).unwrap_err().is_malformed_line());

        let empty_range = "00400000-00400000 r-xp 00000000 08:02 173521";
        assert!(parse_vma_line(empty_range).unwrap_err().is_malformed_line());

        let overflow = "1ffffffffffffffff-2ffffffffffffffff r-xp 00000000 08:02 1";
        assert!(parse_vma_line(overflow).unwrap_err().is_malformed_line());
    }

    #[test]
    fn test_parse_hex_fields_round_trip() {
        let lines = [
            DBUS_LINE,
            "7f2a1c000000-7f2a1c021000 rw-p 00000000 00:00 0 ",
            "7fff5e1d4000-7fff5e1f5000 rw-p 0001a000 00:00 0",
            "ffffffffff600000-ffffffffff601000 --xp 00000000 00:00 0",
        ];

        for line in lines {
            let vma = parse_vma_line(line).expect("line should parse");
            let mut tokens = line.split_whitespace();
            let range = tokens.next().unwrap();
            let (start, end) = range.split_once('-').unwrap();
            let _perms = tokens.next().unwrap();
            let offset = tokens.next().unwrap();

            assert_eq!(format!("{:0w$x}", vma.start(), w = start.len()), start);
            assert_eq!(format!("{:0w$x}", vma.end(), w = end.len()), end);
            assert_eq!(format!("{:0w$x}", vma.offset(), w = offset.len()), offset);
        }
    }

    #[test]
    fn test_fixed_column_on_wide_layout() {
        // 64-bit layout puts the path at column 73; the fixed column keeps
        // whatever it finds at column 49.
        let line = "7f0d4c3b1000-7f0d4c3d3000 r-xp 00000000 fd:01 1835028                    /usr/lib/libc.so.6";
        let vma = parse_vma_line(line).expect("line should parse");
        assert!(vma.backing().label().starts_with("5028 "));
        assert!(vma.backing().label().ends_with("/usr/lib/libc.so.6"));

        let vma = parse_vma_line_with(line, PathLocator::Tokens).expect("line should parse");
        assert_eq!(vma.backing(), &Backing::File("/usr/lib/libc.so.6".into()));
    }

    #[test]
    fn test_token_locator() {
        let vma = parse_vma_line_with(DBUS_LINE, PathLocator::Tokens).unwrap();
        assert_eq!(vma.backing().label(), "/usr/bin/dbus-daemon");

        let anon = "7f2a1c000000-7f2a1c021000 rw-p 00000000 00:00 0 ";
        let vma = parse_vma_line_with(anon, PathLocator::Tokens).unwrap();
        assert_eq!(vma.backing(), &Backing::Anonymous);

        let spaced = "00400000-00452000 r-xp 00000000 08:02 173521 /opt/my app/bin (deleted)";
        let vma = parse_vma_line_with(spaced, PathLocator::Tokens).unwrap();
        assert_eq!(vma.backing().label(), "/opt/my app/bin (deleted)");
    }

    #[test]
    fn test_fixed_column_inside_multibyte_char() {
        let line = format!("{:<48}é/tmp/x", "08048000-08049000 r--p 00000000 08:01 7");
        let vma = parse_vma_line(&line).expect("line should parse");
        assert_eq!(vma.backing().label(), "/tmp/x");
    }

    #[test]
    fn test_vma_display() {
        let vma = parse_vma_line(DBUS_LINE).unwrap();
        assert_eq!(vma.to_string(), "400000-452000: /usr/bin/dbus-daemon");
    }

    // -------------------------------------------------------------------------
    // Tests for Backing
    // -------------------------------------------------------------------------

    #[test]
    fn test_backing_from_field() {
        assert_eq!(Backing::from_field(""), Backing::Anonymous);
        assert_eq!(Backing::from_field("[anon]"), Backing::Anonymous);
        assert_eq!(Backing::from_field("[heap]"), Backing::Heap);
        assert_eq!(Backing::from_field("[vdso]"), Backing::Vdso);
        assert_eq!(Backing::from_field("[vvar]"), Backing::Pseudo("[vvar]".into()));
        assert_eq!(
            Backing::from_field("/lib/ld.so"),
            Backing::File("/lib/ld.so".into())
        );
    }

    #[test]
    fn test_backing_serializes_as_label() {
        let json = serde_json::to_string(&Backing::Heap).unwrap();
        assert_eq!(json, "\"[heap]\"");

        let vma = parse_vma_line(DBUS_LINE).unwrap();
        let value = serde_json::to_value(&vma).unwrap();
        assert_eq!(value["backing"], "/usr/bin/dbus-daemon");
        assert_eq!(value["permissions"], "r-xp");
        assert_eq!(value["start"], 0x0040_0000u64);
    }
}

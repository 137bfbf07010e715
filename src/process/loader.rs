//! Loading one process's mapping table into a [`Process`].

use crate::error::{ProcError, VmaParseError};
use crate::process::scanner::read_cmdline;
use crate::process::vma::{parse_vma_line_with, Vma};
use crate::process::{LoadOptions, MAX_MAPS_BUFFER_KB};
use serde::Serialize;
use std::fs;
use std::io::{BufRead, BufReader};
use std::path::{Path, PathBuf};
use tracing::{debug, warn};

/// Placeholder for processes without a readable command line (kernel threads).
pub const NO_CMDLINE: &str = "[nocmdline]";

/// Line counts from a single mapping-table load.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct LoadReport {
    pub parsed: usize,
    pub dropped: usize,
}

/// One operating-system process snapshot.
#[derive(Debug, Clone, Serialize)]
pub struct Process {
    pid: u32,
    cmdline: String,
    vmas: Vec<Vma>,
}

impl Process {
    pub fn new(pid: u32) -> Self {
        Self {
            pid,
            cmdline: NO_CMDLINE.to_string(),
            vmas: Vec::new(),
        }
    }

    pub fn pid(&self) -> u32 {
        self.pid
    }

    pub fn cmdline(&self) -> &str {
        &self.cmdline
    }

    /// VMAs in mapping-table order.
    pub fn vmas(&self) -> &[Vma] {
        &self.vmas
    }

    /// False for processes without an address space (kernel threads).
    pub fn has_mm(&self) -> bool {
        !self.vmas.is_empty()
    }

    /// Distinct backing files in order of first appearance.
    pub fn mapped_files(&self) -> Vec<&str> {
        let mut files: Vec<&str> = Vec::new();
        for vma in self.vmas.iter().filter(|v| v.is_file_backed()) {
            let name = vma.backing().label();
            if !files.contains(&name) {
                files.push(name);
            }
        }
        files
    }

    /// Path of this process's mapping table under `proc_root`.
    pub fn maps_path(&self, proc_root: &Path) -> PathBuf {
        proc_root.join(self.pid.to_string()).join("maps")
    }

    /// Reads the mapping table and rebuilds the VMA sequence.
    ///
    /// Malformed lines are logged and skipped. An unopenable or unreadable
    /// file fails the load as a unit with a recoverable
    /// [`ProcError::MappingFileUnavailable`]; a parser invariant violation
    /// is returned as [`ProcError::InternalInvariant`].
    pub fn load(&mut self, opts: &LoadOptions) -> Result<LoadReport, ProcError> {
        let path = self.maps_path(&opts.proc_root);

        let unavailable = |source: std::io::Error| ProcError::MappingFileUnavailable {
            path: path.clone(),
            source,
        };

        let file = fs::File::open(&path).map_err(unavailable)?;
        let capacity = opts.maps_buffer_kb.clamp(1, MAX_MAPS_BUFFER_KB) * 1024;
        let reader = BufReader::with_capacity(capacity, file);

        let mut vmas = Vec::new();
        let mut report = LoadReport::default();

        for line in reader.split(b'\n') {
            let raw = line.map_err(unavailable)?;
            let bytes = raw.strip_suffix(b"\r").unwrap_or(&raw[..]);
            let text = String::from_utf8_lossy(bytes);

            match parse_vma_line_with(&text, opts.path_locator) {
                Ok(vma) => {
                    vmas.push(vma);
                    report.parsed += 1;
                }
                Err(err @ VmaParseError::MalformedLine { .. }) => {
                    warn!("pid {}: {}", self.pid, err);
                    report.dropped += 1;
                }
                Err(source) => {
                    return Err(ProcError::InternalInvariant {
                        pid: self.pid,
                        source,
                    });
                }
            }
        }

        self.vmas = vmas;
        let proc_path = opts.proc_root.join(self.pid.to_string());
        self.cmdline = read_cmdline(&proc_path).unwrap_or_else(|| NO_CMDLINE.to_string());

        debug!(
            "pid {}: loaded {} vmas ({} lines dropped)",
            self.pid, report.parsed, report.dropped
        );
        Ok(report)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::process::vma::Backing;
    use tempfile::tempdir;

    const MAPS: &str = "\
00400000-00452000 r-xp 00000000 08:02 173521     /usr/bin/dbus-daemon
00651000-00652000 rw-p 00051000 08:02 173521     /usr/bin/dbus-daemon
00652000-00673000 rw-p 00000000 00:00 0          [heap]
garbage text
b7e00000-b7e21000 rw-p 00000000 00:00 0
ffffe000-fffff000 ---p 00000000 00:00 0          [vdso]
";

    fn write_process(root: &Path, pid: u32, maps: &str) {
        let dir = root.join(pid.to_string());
        fs::create_dir_all(&dir).expect("Failed to create process dir");
        fs::write(dir.join("maps"), maps).expect("Failed to write maps");
    }

    // -------------------------------------------------------------------------
    // Tests for Process::load
    // -------------------------------------------------------------------------

    #[test]
    fn test_load_keeps_table_order_and_drops_garbage() {
        let dir = tempdir().expect("Failed to create temp dir");
        write_process(dir.path(), 1234, MAPS);

        let opts = LoadOptions::with_root(dir.path());
        let mut proc = Process::new(1234);
        let report = proc.load(&opts).expect("maps file is readable");

        assert_eq!(report, LoadReport { parsed: 5, dropped: 1 });
        let starts: Vec<u64> = proc.vmas().iter().map(|v| v.start()).collect();
        assert_eq!(
            starts,
            vec![0x0040_0000, 0x0065_1000, 0x0065_2000, 0xb7e0_0000, 0xffff_e000]
        );
        assert_eq!(proc.vmas()[2].backing(), &Backing::Heap);
        assert_eq!(proc.vmas()[3].backing(), &Backing::Anonymous);
        assert!(proc.vmas()[4].is_vdso());
        assert!(proc.has_mm());
        assert_eq!(proc.mapped_files(), vec!["/usr/bin/dbus-daemon"]);
    }

    #[test]
    fn test_load_missing_maps_is_recoverable() {
        let dir = tempdir().expect("Failed to create temp dir");
        fs::create_dir(dir.path().join("77")).unwrap();

        let mut proc = Process::new(77);
        let err = proc.load(&LoadOptions::with_root(dir.path())).unwrap_err();

        assert!(err.is_recoverable());
        assert!(matches!(err, ProcError::MappingFileUnavailable { .. }));
        assert!(proc.vmas().is_empty());
    }

    #[test]
    fn test_load_empty_maps_is_valid() {
        let dir = tempdir().unwrap();
        write_process(dir.path(), 2, "");

        let mut proc = Process::new(2);
        let report = proc.load(&LoadOptions::with_root(dir.path())).unwrap();

        assert_eq!(report, LoadReport::default());
        assert!(!proc.has_mm());
        assert_eq!(proc.cmdline(), NO_CMDLINE);
    }

    #[test]
    fn test_load_reads_cmdline() {
        let dir = tempdir().unwrap();
        write_process(dir.path(), 9, MAPS);
        fs::write(dir.path().join("9").join("cmdline"), b"dbus-daemon\0--system\0").unwrap();

        let mut proc = Process::new(9);
        proc.load(&LoadOptions::with_root(dir.path())).unwrap();
        assert_eq!(proc.cmdline(), "dbus-daemon --system");
    }

    #[test]
    fn test_load_tolerates_non_utf8_and_crlf() {
        let dir = tempdir().unwrap();
        let proc_dir = dir.path().join("5");
        fs::create_dir(&proc_dir).unwrap();

        let mut content = b"08048000-08049000 r--p 00000000 08:01 7          /tmp/\xff\xfe\n".to_vec();
        content.extend_from_slice(b"08049000-0804a000 rw-p 00000000 00:00 0\r\n");
        fs::write(proc_dir.join("maps"), content).unwrap();

        let mut proc = Process::new(5);
        let report = proc.load(&LoadOptions::with_root(dir.path())).unwrap();

        assert_eq!(report.parsed, 2);
        assert!(proc.vmas()[0].backing().label().starts_with("/tmp/"));
        assert_eq!(proc.vmas()[1].backing(), &Backing::Anonymous);
    }

    #[test]
    fn test_load_clamps_oversized_buffer() {
        let dir = tempdir().unwrap();
        write_process(dir.path(), 1, MAPS);

        let mut opts = LoadOptions::with_root(dir.path());
        opts.maps_buffer_kb = usize::MAX / 512;
        let mut proc = Process::new(1);
        let report = proc.load(&opts).expect("huge buffer setting is clamped");

        assert_eq!(report, LoadReport { parsed: 5, dropped: 1 });
    }

    #[test]
    fn test_maps_path() {
        let proc = Process::new(31);
        assert_eq!(
            proc.maps_path(Path::new("/proc")),
            PathBuf::from("/proc/31/maps")
        );
    }
}

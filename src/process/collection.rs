//! The pid-indexed pool of loaded processes.
//!
//! A collection is built by a single discovery + load pass and is read-only
//! afterwards. Processes whose mapping table could not be read are never
//! admitted; malformed lines only reduce the VMA count of their process.

use crate::error::ProcError;
use crate::process::loader::Process;
use crate::process::scanner::{collect_proc_entries, read_process_name};
use crate::process::LoadOptions;
use ahash::AHashMap as HashMap;
use serde::{Serialize, Serializer};
use tracing::{debug, info, warn};

/// Counters from one collection pass.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct ScanStats {
    pub discovered: usize,
    pub admitted: usize,
    pub unreadable: usize,
    pub filtered: usize,
    pub duplicates: usize,
    pub parsed_vmas: usize,
    pub malformed_lines: usize,
}

/// Admitted processes in discovery order plus a pid index into them.
#[derive(Debug, Default)]
pub struct ProcessCollection {
    processes: Vec<Process>,
    by_pid: HashMap<u32, usize>,
    stats: ScanStats,
}

impl ProcessCollection {
    pub fn new() -> Self {
        Self::default()
    }

    /// Discovers processes under `opts.proc_root` and loads each one.
    ///
    /// Fails only when the process directory cannot be listed or a parser
    /// invariant is violated. Unreadable mapping tables just leave their
    /// process out.
    pub fn load(opts: &LoadOptions) -> Result<Self, ProcError> {
        let entries = collect_proc_entries(&opts.proc_root, opts.max_processes)?;
        let self_pid = std::process::id();

        let mut pool = Self::new();
        pool.stats.discovered = entries.len();

        for entry in entries {
            if opts.skip_self && entry.pid == self_pid {
                debug!("Skipping own pid {}", entry.pid);
                pool.stats.filtered += 1;
                continue;
            }

            if !opts.names.is_empty() {
                let name = read_process_name(&entry.proc_path).unwrap_or_default();
                if !opts.names.should_include(&name) {
                    pool.stats.filtered += 1;
                    continue;
                }
            }

            let mut process = Process::new(entry.pid);
            match process.load(opts) {
                Ok(report) => {
                    if pool.admit(process) {
                        pool.stats.parsed_vmas += report.parsed;
                        pool.stats.malformed_lines += report.dropped;
                    }
                }
                Err(e) if e.is_recoverable() => {
                    debug!("pid {} not admitted: {}", entry.pid, e);
                    pool.stats.unreadable += 1;
                }
                Err(e) => return Err(e),
            }
        }

        info!(
            "Loaded {} of {} processes ({} vmas, {} malformed lines, {} unreadable)",
            pool.stats.admitted,
            pool.stats.discovered,
            pool.stats.parsed_vmas,
            pool.stats.malformed_lines,
            pool.stats.unreadable
        );
        Ok(pool)
    }

    /// Adds a loaded process. Returns false if its pid is already present.
    pub fn admit(&mut self, process: Process) -> bool {
        let pid = process.pid();
        if self.by_pid.contains_key(&pid) {
            warn!("Duplicate pid {} rejected", pid);
            self.stats.duplicates += 1;
            return false;
        }
        self.by_pid.insert(pid, self.processes.len());
        self.processes.push(process);
        self.stats.admitted += 1;
        true
    }

    pub fn get(&self, pid: u32) -> Option<&Process> {
        self.by_pid.get(&pid).map(|&idx| &self.processes[idx])
    }

    pub fn contains(&self, pid: u32) -> bool {
        self.by_pid.contains_key(&pid)
    }

    /// Processes in admission order.
    pub fn processes(&self) -> &[Process] {
        &self.processes
    }

    pub fn iter(&self) -> std::slice::Iter<'_, Process> {
        self.processes.iter()
    }

    pub fn pids(&self) -> impl Iterator<Item = u32> + '_ {
        self.processes.iter().map(Process::pid)
    }

    pub fn len(&self) -> usize {
        self.processes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.processes.is_empty()
    }

    pub fn stats(&self) -> &ScanStats {
        &self.stats
    }
}

impl FromIterator<Process> for ProcessCollection {
    fn from_iter<I: IntoIterator<Item = Process>>(iter: I) -> Self {
        let mut pool = Self::new();
        for process in iter {
            pool.admit(process);
        }
        pool
    }
}

impl<'a> IntoIterator for &'a ProcessCollection {
    type Item = &'a Process;
    type IntoIter = std::slice::Iter<'a, Process>;

    fn into_iter(self) -> Self::IntoIter {
        self.iter()
    }
}

impl Serialize for ProcessCollection {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        self.processes.serialize(serializer)
    }
}

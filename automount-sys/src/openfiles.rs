// SPDX-License-Identifier: GPL-3.0-only

use std::path::Path;

use automount_contracts::OpenFileScanner;
use automount_types::OpenFileEntry;

/// Open-file scanner backed by procfs.
///
/// Walks every process's file descriptor table and collects descriptors
/// whose target path lies under the mount point. Processes and descriptors
/// that vanish mid-scan, or that we lack permission to inspect, are skipped
/// silently.
#[derive(Debug, Default)]
pub struct ProcScanner;

impl ProcScanner {
    pub fn new() -> Self {
        Self
    }
}

impl OpenFileScanner for ProcScanner {
    fn open_files_under(&self, mount_point: &Path) -> Vec<OpenFileEntry> {
        let mut entries = Vec::new();

        let all_procs = match procfs::process::all_processes() {
            Ok(procs) => procs,
            Err(e) => {
                tracing::warn!("failed to enumerate processes: {e}");
                return entries;
            }
        };

        for proc_result in all_procs {
            let process = match proc_result {
                Ok(p) => p,
                Err(_) => continue, // process vanished
            };

            let fds = match process.fd() {
                Ok(fds) => fds,
                Err(_) => continue, // permission denied or vanished
            };

            for fd_result in fds {
                let fd = match fd_result {
                    Ok(f) => f,
                    Err(_) => continue,
                };

                let target = match &fd.target {
                    procfs::process::FDTarget::Path(path) => path,
                    _ => continue, // socket, pipe, ...
                };

                if !target.starts_with(mount_point) {
                    continue;
                }

                entries.push(OpenFileEntry {
                    pid: process.pid(),
                    path: target.clone(),
                    command: command_name(&process),
                    exe: process.exe().ok(),
                });
            }
        }

        entries
    }
}

fn command_name(process: &procfs::process::Process) -> String {
    if let Ok(cmdline) = process.cmdline()
        && let Some(argv0) = cmdline.first()
    {
        return Path::new(argv0)
            .file_name()
            .and_then(|s| s.to_str())
            .unwrap_or(argv0)
            .to_string();
    }

    if let Ok(stat) = process.stat() {
        return stat.comm;
    }

    format!("<pid {}>", process.pid())
}

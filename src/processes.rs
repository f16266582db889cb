//! Running process enumeration.
//!
//! Names are read from procfs. The kernel truncates `comm` to 15 bytes, so
//! for names at that limit the basename of `argv[0]` is used instead.

use std::fs;
use std::path::{Path, PathBuf};

use glob::glob;

use crate::error::Result;

const COMM_LEN: usize = 15;

pub trait ProcessSource {
    /// Names of the processes running right now. May contain duplicates.
    fn running(&mut self) -> Result<Vec<String>>;
}

pub struct ProcFs {
    root: PathBuf,
}

impl ProcFs {
    pub fn new() -> Self {
        Self::at("/proc")
    }

    pub fn at(root: impl Into<PathBuf>) -> Self {
        ProcFs { root: root.into() }
    }

    fn process_name(pid_dir: &Path) -> Option<String> {
        let comm = fs::read_to_string(pid_dir.join("comm")).ok()?;
        let comm = comm.trim_end_matches('\n');
        if comm.len() < COMM_LEN {
            return Some(comm.to_owned());
        }

        // comm may have been cut short; argv[0] has the full name unless
        // the process rewrote it. Wine programs carry a Windows path there.
        let cmdline = match fs::read(pid_dir.join("cmdline")) {
            Ok(cmdline) => cmdline,
            Err(_) => return Some(comm.to_owned()),
        };
        let argv0 = cmdline.split(|b| *b == 0).next().unwrap_or_default();
        let argv0 = String::from_utf8_lossy(argv0);
        let base = argv0
            .rsplit(|c: char| c == '/' || c == '\\')
            .next()
            .unwrap_or_default();
        if base.starts_with(comm) {
            Some(base.to_owned())
        } else {
            Some(comm.to_owned())
        }
    }
}

impl Default for ProcFs {
    fn default() -> Self {
        Self::new()
    }
}

impl ProcessSource for ProcFs {
    fn running(&mut self) -> Result<Vec<String>> {
        let pattern = format!(
            "{}/[0-9]*/comm",
            glob::Pattern::escape(&self.root.to_string_lossy())
        );
        let entries = glob(&pattern).map_err(|e| {
            std::io::Error::new(std::io::ErrorKind::InvalidInput, e.to_string())
        })?;

        let mut names = Vec::new();
        for entry in entries {
            // Processes exit while we walk the tree; skip whatever vanished.
            let comm_path = match entry {
                Ok(path) => path,
                Err(e) => {
                    tracing::trace!("skipping process: {}", e);
                    continue;
                }
            };
            if let Some(name) = comm_path.parent().and_then(Self::process_name) {
                names.push(name);
            }
        }
        Ok(names)
    }
}

/// A fixed process list.
pub struct StaticProcesses(pub Vec<String>);

impl ProcessSource for StaticProcesses {
    fn running(&mut self) -> Result<Vec<String>> {
        Ok(self.0.clone())
    }
}

/// Sorted, de-duplicated names, as offered when picking a process to watch.
pub fn picker_list(source: &mut dyn ProcessSource) -> Result<Vec<String>> {
    let mut names = source.running()?;
    names.sort();
    names.dedup();
    Ok(names)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::guard::{permits, GuardConfig};

    fn fake_process(root: &Path, pid: u32, comm: &str, cmdline: &[u8]) -> std::io::Result<()> {
        let dir = root.join(pid.to_string());
        fs::create_dir_all(&dir)?;
        fs::write(dir.join("comm"), format!("{}\n", comm))?;
        fs::write(dir.join("cmdline"), cmdline)
    }

    #[test]
    fn reads_names_from_proc_tree() -> Result<()> {
        let root = tempfile::tempdir()?;
        fake_process(root.path(), 1, "systemd", b"/sbin/init\0splash\0")?;
        fake_process(root.path(), 42, "Game.exe", b"C:\\Game\\Game.exe\0")?;
        // Not a pid directory.
        fs::create_dir_all(root.path().join("sys"))?;
        fs::write(root.path().join("sys").join("comm"), "nope\n")?;

        let mut names = ProcFs::at(root.path()).running()?;
        names.sort();
        assert_eq!(names, vec!["Game.exe".to_owned(), "systemd".to_owned()]);
        Ok(())
    }

    #[test]
    fn long_names_come_from_argv0() -> Result<()> {
        let root = tempfile::tempdir()?;
        fake_process(
            root.path(),
            7,
            "very-long-proce",
            b"/usr/bin/very-long-process-name\0--flag\0",
        )?;
        // argv[0] rewritten to something unrelated: keep comm.
        fake_process(root.path(), 8, "another-long-na", b"worker: idle\0")?;
        fake_process(
            root.path(),
            9,
            "VeryLongGameNam",
            b"C:\\Games\\VeryLongGameName.exe\0",
        )?;

        let mut names = ProcFs::at(root.path()).running()?;
        names.sort();
        assert_eq!(
            names,
            vec![
                "VeryLongGameName.exe".to_owned(),
                "another-long-na".to_owned(),
                "very-long-process-name".to_owned()
            ]
        );
        Ok(())
    }

    #[test]
    fn long_wine_name_satisfies_guard() -> Result<()> {
        let root = tempfile::tempdir()?;
        fake_process(
            root.path(),
            31,
            "VeryLongGameNam",
            b"C:\\Games\\VeryLongGameName.exe\0",
        )?;
        let config = GuardConfig {
            watch_process_name: Some("VeryLongGameName.exe".into()),
            dev_mode: false,
        };
        assert!(permits(&config, &mut ProcFs::at(root.path())));
        Ok(())
    }

    #[test]
    fn vanished_processes_are_skipped() -> Result<()> {
        let root = tempfile::tempdir()?;
        fake_process(root.path(), 1, "systemd", b"/sbin/init\0")?;
        // Exited between the glob and the read: comm is gone, but the
        // pattern still matched something at its path.
        fs::create_dir_all(root.path().join("77").join("comm"))?;
        // Long name whose cmdline disappeared: the truncated comm stays.
        let dir = root.path().join("78");
        fs::create_dir_all(&dir)?;
        fs::write(dir.join("comm"), "short-lived-wor\n")?;

        let mut names = ProcFs::at(root.path()).running()?;
        names.sort();
        assert_eq!(names, vec!["short-lived-wor".to_owned(), "systemd".to_owned()]);
        Ok(())
    }

    #[test]
    fn picker_list_is_sorted_and_unique() -> Result<()> {
        let mut source = StaticProcesses(vec!["zsh".into(), "bash".into(), "zsh".into()]);
        assert_eq!(picker_list(&mut source)?, vec!["bash", "zsh"]);
        Ok(())
    }
}

//! Guard evaluation.
//!
//! Hotkeys only act while the watched process is running, unless dev mode
//! is on. The check runs on every hotkey press; the watched process may
//! come and go at any time, so nothing is cached.

use lazy_static::lazy_static;
use regex::Regex;

use crate::processes::ProcessSource;

#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct GuardConfig {
    pub watch_process_name: Option<String>,
    pub dev_mode: bool,
}

/// Strip a trailing executable suffix, so "App.exe" and "App" compare equal.
pub fn executable_stem(name: &str) -> &str {
    lazy_static! {
        static ref EXE_SUFFIX: Regex = Regex::new(r"(?i)\.exe$").unwrap();
    }
    match EXE_SUFFIX.find(name) {
        Some(suffix) => &name[..suffix.start()],
        None => name,
    }
}

/// Whether `config` permits an action, given the running process names.
pub fn permits_with(config: &GuardConfig, running: &[String]) -> bool {
    if config.dev_mode {
        return true;
    }
    let watched = match config.watch_process_name.as_deref().map(executable_stem) {
        Some(name) if !name.is_empty() => name,
        _ => return false,
    };
    running.iter().any(|p| executable_stem(p) == watched)
}

/// Whether `config` permits an action right now.
///
/// A failed process scan denies.
pub fn permits(config: &GuardConfig, processes: &mut dyn ProcessSource) -> bool {
    if config.dev_mode {
        return true;
    }
    match processes.running() {
        Ok(running) => permits_with(config, &running),
        Err(e) => {
            tracing::warn!("Unable to list processes, denying: {}", e);
            false
        }
    }
}

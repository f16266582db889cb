//! Start the daemon with the desktop session, through an XDG autostart
//! entry.

use std::fs;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use crate::error::{Error, Result};

const ENTRY_NAME: &str = "rotkey.desktop";

pub fn autostart_dir() -> Option<PathBuf> {
    dirs::config_dir().map(|dir| dir.join("autostart"))
}

/// Turn autostart on or off for the running executable.
pub fn set_enabled(enable: bool) -> Result<()> {
    let dir = autostart_dir().ok_or_else(|| {
        Error::IOError(std::io::Error::new(
            ErrorKind::NotFound,
            "no config directory for autostart entries",
        ))
    })?;
    let exe = std::env::current_exe()?;
    set_enabled_in(&dir, &exe, enable)
}

pub fn set_enabled_in(dir: &Path, exe: &Path, enable: bool) -> Result<()> {
    let entry = dir.join(ENTRY_NAME);
    if enable {
        fs::create_dir_all(dir)?;
        fs::write(&entry, desktop_entry(exe))?;
        tracing::info!("Autostart enabled: {}", entry.display());
        return Ok(());
    }
    match fs::remove_file(&entry) {
        Ok(()) => tracing::info!("Autostart disabled"),
        Err(e) if e.kind() == ErrorKind::NotFound => {}
        Err(e) => return Err(e.into()),
    }
    Ok(())
}

pub fn is_enabled_in(dir: &Path) -> bool {
    dir.join(ENTRY_NAME).is_file()
}

fn desktop_entry(exe: &Path) -> String {
    format!(
        "[Desktop Entry]\n\
         Type=Application\n\
         Name=rotkey\n\
         Comment=Rotate the display with Ctrl+Alt+arrow keys\n\
         Exec=\"{}\" run\n\
         X-GNOME-Autostart-enabled=true\n\
         NoDisplay=true\n",
        exe.display()
    )
}

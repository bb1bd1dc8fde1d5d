//! The on-disk config file layer: a small `serde`/`toml` document read once
//! at startup from `$HOME/.config/oxidized/config.toml` (via `dirs`), applied
//! onto the `OptionStore` before the command line and `LESS` environment
//! variable are layered on top. Everything here is optional — a missing or
//! unreadable file just leaves the built-in defaults in place.

use serde::Deserialize;
use std::path::PathBuf;

#[derive(Debug, Deserialize, Default, PartialEq)]
pub struct DiskConfig {
    pub ignore_case: Option<bool>,
    pub line_numbers: Option<bool>,
    pub chop_long_lines: Option<bool>,
    pub tabs: Option<i64>,
    pub quit_at_eof: Option<bool>,
}

pub fn config_path() -> Option<PathBuf> {
    dirs::config_dir().map(|d| d.join("oxidized").join("config.toml"))
}

/// Read and parse the config file, if it exists. A missing file is not an
/// error; a malformed one is reported to the caller so it can warn and
/// proceed with defaults.
pub fn load(path: &std::path::Path) -> Result<Option<DiskConfig>, DiskConfigError> {
    match std::fs::read_to_string(path) {
        Ok(text) => Ok(Some(toml::from_str(&text)?)),
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(None),
        Err(e) => Err(DiskConfigError::Io(e)),
    }
}

#[derive(Debug, thiserror::Error)]
pub enum DiskConfigError {
    #[error("reading config file: {0}")]
    Io(#[from] std::io::Error),
    #[error("parsing config file: {0}")]
    Parse(#[from] toml::de::Error),
}

/// Apply whatever fields `disk` sets onto the live registry.
pub fn apply(store: &mut crate::OptionStore, disk: &DiskConfig) {
    if let Some(v) = disk.ignore_case {
        let _ = store.set_triple('i', if v { crate::Triple::On } else { crate::Triple::Off });
    }
    if let Some(v) = disk.line_numbers {
        let _ = store.set_bool('N', v);
    }
    if let Some(v) = disk.chop_long_lines {
        let _ = store.set_bool('S', v);
    }
    if let Some(v) = disk.tabs {
        let _ = store.set_numeric('x', &v.to_string());
    }
    if let Some(v) = disk.quit_at_eof {
        let _ = store.set_triple('e', if v { crate::Triple::On } else { crate::Triple::Off });
    }
}

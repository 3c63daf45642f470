//! Persisted board preferences: last scope, selected column, column widths.
//!
//! Everything here is best-effort. A missing or broken file yields defaults,
//! and a failed write is logged and forgotten.

use crate::data::Scope;
use anyhow::{Context, Result};
use fs2::FileExt;
use serde::{Deserialize, Serialize};
use std::fs::{self, File, OpenOptions};
use std::io::{Read, Write};
use std::path::{Path, PathBuf};

pub const ENV_IGNORE_UI_PREFS: &str = "BRANCHBOARD_IGNORE_UI_PREFS";
pub const DEFAULT_COLUMN_WIDTHS: [u16; 3] = [35, 35, 30];
pub const MIN_COLUMN_WIDTH: u16 = 15;
pub const COLUMN_WIDTH_STEP: u16 = 5;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct UiPrefs {
    pub last_scope: Option<Scope>,
    pub last_selected_col: usize,
    /// Percentage of the board width per column
    pub column_widths: [u16; 3],
    pub show_extra_fields: bool,
}

impl Default for UiPrefs {
    fn default() -> Self {
        Self {
            last_scope: None,
            last_selected_col: 0,
            column_widths: DEFAULT_COLUMN_WIDTHS,
            show_extra_fields: false,
        }
    }
}

impl UiPrefs {
    /// Clamp values a hand-edited file could have broken.
    pub fn sanitized(mut self) -> Self {
        if self.last_selected_col > 2 {
            self.last_selected_col = 0;
        }
        if !widths_valid(&self.column_widths) {
            self.column_widths = DEFAULT_COLUMN_WIDTHS;
        }
        self
    }
}

fn widths_valid(widths: &[u16; 3]) -> bool {
    // u32 sum: hand-edited widths may be arbitrarily large
    widths.iter().all(|w| *w >= MIN_COLUMN_WIDTH)
        && widths.iter().map(|w| u32::from(*w)).sum::<u32>() == 100
}

/// Grow (`delta > 0`) or shrink column `col`, trading width with its neighbour.
/// Returns the widths unchanged when either side would drop below the minimum.
pub fn adjust_column_width(widths: [u16; 3], col: usize, delta: i16) -> [u16; 3] {
    if col > 2 || delta == 0 {
        return widths;
    }
    let neighbour = if col == 2 { 1 } else { col + 1 };
    let mut out = widths;
    let step = delta.unsigned_abs();
    let (grow, shrink) = if delta > 0 { (col, neighbour) } else { (neighbour, col) };
    if out[shrink] < MIN_COLUMN_WIDTH + step {
        return widths;
    }
    out[shrink] -= step;
    out[grow] += step;
    out
}

/// Where prefs live, or nowhere when disabled.
#[derive(Debug, Clone)]
pub struct PrefsStore {
    path: Option<PathBuf>,
}

impl PrefsStore {
    pub fn at(path: impl Into<PathBuf>) -> Self {
        Self {
            path: Some(path.into()),
        }
    }

    pub fn disabled() -> Self {
        Self { path: None }
    }

    /// Default location, honouring `BRANCHBOARD_IGNORE_UI_PREFS`.
    pub fn from_env() -> Self {
        if std::env::var(ENV_IGNORE_UI_PREFS).is_ok_and(|v| !v.is_empty() && v != "0") {
            tracing::debug!("UI prefs disabled by {}", ENV_IGNORE_UI_PREFS);
            return Self::disabled();
        }
        match super::state_dir() {
            Ok(dir) => Self::at(dir.join("ui_state.toml")),
            Err(e) => {
                tracing::warn!("No state directory, UI prefs disabled: {}", e);
                Self::disabled()
            }
        }
    }

    pub fn path(&self) -> Option<&Path> {
        self.path.as_deref()
    }

    pub fn load(&self) -> UiPrefs {
        let Some(path) = &self.path else {
            return UiPrefs::default();
        };
        if !path.exists() {
            return UiPrefs::default();
        }
        match read_prefs(path) {
            Ok(prefs) => prefs.sanitized(),
            Err(e) => {
                tracing::warn!("Ignoring UI prefs at {}: {:#}", path.display(), e);
                UiPrefs::default()
            }
        }
    }

    pub fn save(&self, prefs: &UiPrefs) {
        let Some(path) = &self.path else {
            return;
        };
        if let Err(e) = write_prefs(path, prefs) {
            tracing::warn!("Could not save UI prefs to {}: {:#}", path.display(), e);
        }
    }
}

fn read_prefs(path: &Path) -> Result<UiPrefs> {
    let file = File::open(path)?;
    file.lock_shared()?; // Shared lock for reading

    let mut content = String::new();
    (&file).read_to_string(&mut content)?;
    file.unlock()?;

    toml::from_str(&content).context("Failed to parse UI prefs")
}

fn write_prefs(path: &Path, prefs: &UiPrefs) -> Result<()> {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent)?;
    }
    let content = toml::to_string_pretty(prefs)?;

    // Truncate only once the lock is held
    let file = OpenOptions::new().write(true).create(true).truncate(false).open(path)?;
    file.lock_exclusive()?; // Exclusive lock for writing
    file.set_len(0)?;
    (&file).write_all(content.as_bytes())?;
    file.unlock()?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn sanitize_resets_broken_values() {
        let prefs = UiPrefs {
            last_selected_col: 9,
            column_widths: [90, 5, 5],
            ..Default::default()
        }
        .sanitized();
        assert_eq!(prefs.last_selected_col, 0);
        assert_eq!(prefs.column_widths, DEFAULT_COLUMN_WIDTHS);
    }

    #[test]
    fn huge_widths_are_rejected_without_overflow() {
        assert!(!widths_valid(&[u16::MAX, u16::MAX, 2]));
        assert!(widths_valid(&[35, 35, 30]));
    }

    #[test]
    fn widening_takes_from_the_neighbour() {
        assert_eq!(adjust_column_width([35, 35, 30], 0, 5), [40, 30, 30]);
        assert_eq!(adjust_column_width([35, 35, 30], 2, 5), [35, 30, 35]);
        assert_eq!(adjust_column_width([35, 35, 30], 1, -5), [35, 30, 35]);
    }

    #[test]
    fn widths_never_drop_below_minimum() {
        assert_eq!(adjust_column_width([70, 15, 15], 0, 5), [70, 15, 15]);
        assert_eq!(adjust_column_width([15, 45, 40], 0, -5), [15, 45, 40]);
    }

    #[test]
    fn disabled_store_is_inert() {
        let store = PrefsStore::disabled();
        assert_eq!(store.load(), UiPrefs::default());
        store.save(&UiPrefs::default());
        assert!(store.path().is_none());
    }
}

//! Font discovery: map each scoreboard [`Font`] to its BDF file.
//!
//! Expected layout under the fonts directory:
//! ```text
//! fonts/
//!   Terminus/ter-u32b.bdf
//!   Terminus/ter-u18b.bdf
//!   symbols.bdf
//! ```

use crate::surface::Font;
use std::fs;
use std::path::{Path, PathBuf};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum FontError {
    #[error("Font file not found: {} (available: {})", path.display(), available.join(", "))]
    Missing {
        path: PathBuf,
        available: Vec<String>,
    },
}

impl Font {
    /// Path of this font's BDF file relative to the fonts directory.
    pub fn relative_path(self) -> &'static str {
        match self {
            Font::Large => "Terminus/ter-u32b.bdf",
            Font::Small => "Terminus/ter-u18b.bdf",
            Font::Symbols => "symbols.bdf",
        }
    }
}

/// Resolved, existing BDF files for every scoreboard font.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct FontPaths {
    pub large: PathBuf,
    pub small: PathBuf,
    pub symbols: PathBuf,
}

impl FontPaths {
    /// Check that every font file exists under `fonts_dir`.
    pub fn locate(fonts_dir: &Path) -> Result<Self, FontError> {
        let resolve = |font: Font| {
            let path = fonts_dir.join(font.relative_path());
            if path.is_file() {
                Ok(path)
            } else {
                Err(FontError::Missing {
                    path,
                    available: list_fonts(fonts_dir),
                })
            }
        };

        Ok(Self {
            large: resolve(Font::Large)?,
            small: resolve(Font::Small)?,
            symbols: resolve(Font::Symbols)?,
        })
    }

    pub fn path(&self, font: Font) -> &Path {
        match font {
            Font::Large => &self.large,
            Font::Small => &self.small,
            Font::Symbols => &self.symbols,
        }
    }
}

/// List BDF fonts under `fonts_dir` and its immediate subdirectories, as
/// relative paths without the `.bdf` extension.
pub fn list_fonts(fonts_dir: &Path) -> Vec<String> {
    let mut fonts = Vec::new();
    collect_bdf(fonts_dir, None, &mut fonts);

    if let Ok(read_dir) = fs::read_dir(fonts_dir) {
        for entry in read_dir.flatten() {
            let path = entry.path();
            if path.is_dir() {
                let prefix = entry.file_name().to_string_lossy().into_owned();
                collect_bdf(&path, Some(&prefix), &mut fonts);
            }
        }
    }

    fonts.sort();
    fonts
}

fn collect_bdf(dir: &Path, prefix: Option<&str>, fonts: &mut Vec<String>) {
    let Ok(read_dir) = fs::read_dir(dir) else {
        return;
    };

    for entry in read_dir.flatten() {
        let path = entry.path();
        if !path.is_file() {
            continue;
        }

        let is_bdf = path
            .extension()
            .and_then(|e| e.to_str())
            .is_some_and(|e| e == "bdf");

        if is_bdf {
            if let Some(name) = path.file_stem().and_then(|s| s.to_str()) {
                match prefix {
                    Some(prefix) => fonts.push(format!("{prefix}/{name}")),
                    None => fonts.push(name.to_string()),
                }
            }
        }
    }
}

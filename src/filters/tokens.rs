//! `${token}` substitution for filter expressions.

use log::{debug, warn};
use regex::{Captures, Regex};
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::LazyLock;

/// Font used by text-drawing filters.
pub const FONT_FILE_NAME: &str = "Anonymous_Pro_B.ttf";
/// Subdirectory of the system temp dir holding runtime resources.
pub const TEMP_SUBDIR: &str = "qcplay";

static TOKEN_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\$\{([a-z_]+)\}").expect("token pattern is valid"));

/// Replace every `${name}` for which `lookup` has a value. Others stay as is.
pub fn substitute<F>(text: &str, lookup: F) -> String
where
    F: Fn(&str) -> Option<String>,
{
    TOKEN_RE
        .replace_all(text, |caps: &Captures| {
            lookup(&caps[1]).unwrap_or_else(|| caps[0].to_string())
        })
        .into_owned()
}

/// Token names referenced by `text`, in order of appearance.
pub fn placeholders(text: &str) -> Vec<String> {
    TOKEN_RE
        .captures_iter(text)
        .map(|caps| caps[1].to_string())
        .collect()
}

/// Format like a `%g` with 6 significant digits: `1.77778`, `2`, `0.5`.
fn format_number(value: f64) -> String {
    if !value.is_finite() {
        return "0".to_string();
    }
    let int_digits = if value.abs() >= 1.0 {
        value.abs().log10().floor() as i32 + 1
    } else {
        1
    };
    let decimals = (6 - int_digits).max(0) as usize;
    let text = format!("{:.*}", decimals, value);
    if text.contains('.') {
        text.trim_end_matches('0').trim_end_matches('.').to_string()
    } else {
        text
    }
}

/// Geometry values for the compose-time token pass.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct TokenContext {
    pub width: u32,
    pub height: u32,
    pub dar: f64,
    pub window_width: u32,
    pub window_height: u32,
    /// Escaped font path, `None` when the font resource is unavailable.
    pub fontfile: Option<String>,
}

impl TokenContext {
    pub fn lookup(&self, name: &str) -> Option<String> {
        match name {
            "width" => Some(self.width.to_string()),
            "height" => Some(self.height.to_string()),
            "dar" => Some(format_number(self.dar)),
            "window_width" => Some(self.window_width.to_string()),
            "window_height" => Some(self.window_height.to_string()),
            "fontfile" => self.fontfile.clone(),
            _ => None,
        }
    }

    pub fn apply(&self, text: &str) -> String {
        substitute(text, |name| self.lookup(name))
    }
}

/// Escape `:` for use inside a filter option value.
pub fn escape_filter_path(path: &Path) -> String {
    path.to_string_lossy().replace(':', "\\\\:")
}

/// Font resource materialized in the temp directory on first use.
#[derive(Debug, Clone)]
pub struct FontResource {
    source: Option<PathBuf>,
    dir: PathBuf,
}

impl FontResource {
    /// `source` is the bundled font to copy from, `temp_root` the system
    /// temp directory.
    pub fn new(source: Option<PathBuf>, temp_root: &Path) -> Self {
        Self {
            source,
            dir: temp_root.join(TEMP_SUBDIR),
        }
    }

    pub fn target(&self) -> PathBuf {
        self.dir.join(FONT_FILE_NAME)
    }

    /// Copy the font into place if missing. Returns its path when present.
    pub fn ensure(&self) -> Option<PathBuf> {
        let target = self.target();
        if target.exists() {
            return Some(target);
        }
        let Some(source) = self.source.as_deref() else {
            warn!("Font {} unavailable: no source configured", FONT_FILE_NAME);
            return None;
        };
        if let Err(e) = fs::create_dir_all(&self.dir) {
            warn!("Cannot create {}: {}", self.dir.display(), e);
            return None;
        }
        match fs::copy(source, &target) {
            Ok(_) => {
                debug!("Copied font {} -> {}", source.display(), target.display());
                Some(target)
            }
            Err(e) => {
                warn!("Cannot copy font from {}: {}", source.display(), e);
                None
            }
        }
    }

    /// Escaped path for `${fontfile}`, or `None` to leave the token as is.
    pub fn token_value(&self) -> Option<String> {
        self.ensure().map(|path| escape_filter_path(&path))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn temp_root(name: &str) -> PathBuf {
        let dir = std::env::temp_dir().join(format!("qcplay_tokens_{}_{}", name, std::process::id()));
        let _ = fs::remove_dir_all(&dir);
        fs::create_dir_all(&dir).unwrap();
        dir
    }

    #[test]
    fn test_geometry_tokens() {
        let ctx = TokenContext {
            width: 720,
            height: 486,
            dar: 4.0 / 3.0,
            window_width: 1280,
            window_height: 960,
            fontfile: None,
        };
        assert_eq!(ctx.apply("scale=${width}:${height}"), "scale=720:486");
        assert_eq!(ctx.apply("setdar=${dar}"), "setdar=1.33333");
        assert_eq!(ctx.apply("${window_width}x${window_height}"), "1280x960");
    }

    #[test]
    fn test_unknown_and_missing_tokens_untouched() {
        let ctx = TokenContext::default();
        assert_eq!(ctx.apply("a=${nope}"), "a=${nope}");
        assert_eq!(ctx.apply("f=${fontfile}"), "f=${fontfile}");
    }

    #[test]
    fn test_format_number() {
        assert_eq!(format_number(16.0 / 9.0), "1.77778");
        assert_eq!(format_number(2.0), "2");
        assert_eq!(format_number(0.5), "0.5");
        assert_eq!(format_number(f64::NAN), "0");
    }

    #[test]
    fn test_escape_colon() {
        assert_eq!(escape_filter_path(Path::new("C:/tmp/f.ttf")), "C\\\\:/tmp/f.ttf");
    }

    #[test]
    fn test_font_copied_once() {
        let root = temp_root("font");
        let source = root.join("bundled.ttf");
        fs::write(&source, b"font").unwrap();

        let font = FontResource::new(Some(source.clone()), &root);
        let path = font.ensure().unwrap();
        assert_eq!(path, root.join(TEMP_SUBDIR).join(FONT_FILE_NAME));

        // source gone: the copy in place is still used
        fs::remove_file(&source).unwrap();
        assert_eq!(font.ensure(), Some(path));
        let _ = fs::remove_dir_all(&root);
    }

    #[test]
    fn test_font_unavailable() {
        let root = temp_root("nofont");
        let font = FontResource::new(Some(root.join("missing.ttf")), &root);
        assert_eq!(font.token_value(), None);
        let font = FontResource::new(None, &root);
        assert_eq!(font.ensure(), None);
        let _ = fs::remove_dir_all(&root);
    }
}

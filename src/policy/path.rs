//! File path policy: renders a pattern into a file system path for a song.

use super::{FormatPolicy, PolicyKind};
use crate::config::PathOptions;
use crate::error::{PatternError, Result};
use crate::song::Song;
use std::borrow::Cow;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PlatformFamily {
    Unix,
    Windows,
}

/// The operating system facts the path policy depends on
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Platform {
    pub family: PlatformFamily,
    /// Replacement for a leading `~`.
    pub home: Option<String>,
}

impl Platform {
    /// Detect the platform this process runs on.
    pub fn current() -> Self {
        let family = if cfg!(windows) {
            PlatformFamily::Windows
        } else {
            PlatformFamily::Unix
        };
        let home = std::env::var("HOME")
            .or_else(|_| std::env::var("USERPROFILE"))
            .ok()
            .filter(|h| !h.is_empty());
        Self { family, home }
    }

    pub fn unix(home: Option<&str>) -> Self {
        Self {
            family: PlatformFamily::Unix,
            home: home.map(str::to_string),
        }
    }

    pub fn windows(home: Option<&str>) -> Self {
        Self {
            family: PlatformFamily::Windows,
            home: home.map(str::to_string),
        }
    }

    pub fn separator(&self) -> char {
        match self.family {
            PlatformFamily::Unix => '/',
            PlatformFamily::Windows => '\\',
        }
    }

    fn is_separator(&self, c: char) -> bool {
        c == self.separator() || (self.family == PlatformFamily::Windows && c == '/')
    }

    /// Split a leading `X:` drive off a Windows path.
    fn split_drive<'a>(&self, path: &'a str) -> (&'a str, &'a str) {
        let bytes = path.as_bytes();
        if self.family == PlatformFamily::Windows
            && bytes.len() >= 2
            && bytes[0].is_ascii_alphabetic()
            && bytes[1] == b':'
        {
            path.split_at(2)
        } else {
            ("", path)
        }
    }

    pub fn is_absolute(&self, path: &str) -> bool {
        let (_, tail) = self.split_drive(path);
        tail.chars().next().is_some_and(|c| self.is_separator(c))
    }

    fn expand_home(&self, path: String) -> String {
        let Some(home) = &self.home else {
            return path;
        };
        let Some(rest) = path.strip_prefix('~') else {
            return path;
        };
        if rest.is_empty() || rest.chars().next().is_some_and(|c| self.is_separator(c)) {
            format!("{}{}", home, rest)
        } else {
            path
        }
    }
}

/// Renders patterns into file paths.
///
/// Values have separators replaced so they cannot introduce directories,
/// track and disc numbers are zero-padded, and the joined result is made
/// safe for the platform's file system.
#[derive(Debug, Clone)]
pub struct FilePath {
    keep_extension: bool,
    options: PathOptions,
    platform: Platform,
}

impl FilePath {
    /// With `keep_extension`, the extension of the song's `~filename` is
    /// appended unless the rendered path already ends with it.
    pub fn new(keep_extension: bool, options: PathOptions, platform: Platform) -> Self {
        Self {
            keep_extension,
            options,
            platform,
        }
    }

    fn append_extension(&self, value: String, song: &dyn Song) -> String {
        let Some(filename) = song.get("~filename").map(|v| v.decode()) else {
            return value;
        };
        let basename_start = filename
            .rfind(|c| self.platform.is_separator(c))
            .map_or(0, |i| i + 1);
        let Some(dot) = filename[basename_start..].rfind('.') else {
            return value;
        };
        let ext = filename[basename_start + dot..].to_lowercase();

        let ext_len = ext.chars().count();
        let value_len = value.chars().count();
        let tail: String = value.chars().skip(value_len.saturating_sub(ext_len)).collect();
        if tail.to_lowercase() == ext {
            value
        } else {
            value + &ext
        }
    }

    fn strip_incompatible(&self, path: &str) -> String {
        let (drive, tail) = self.platform.split_drive(path);
        let parts: Vec<String> = tail.split('\\').map(strip_win32_segment).collect();
        format!("{}{}", drive, parts.join("\\"))
    }
}

impl FormatPolicy for FilePath {
    fn kind(&self) -> PolicyKind {
        if self.keep_extension {
            PolicyKind::File
        } else {
            PolicyKind::ArbitraryExtensionFile
        }
    }

    fn preprocess<'a>(&self, pattern: &'a str) -> Cow<'a, str> {
        // a bare backslash is a path separator on Windows, not an escape
        if self.platform.family == PlatformFamily::Windows && pattern.contains('\\') {
            Cow::Owned(pattern.replace('\\', "\\\\"))
        } else {
            Cow::Borrowed(pattern)
        }
    }

    fn format_value(&self, key: &str, value: String) -> String {
        let value = pad_number(key, value);
        let sep = self.platform.separator();
        value
            .chars()
            .map(|c| if c == sep || c == '\u{ff0f}' { '_' } else { c })
            .collect::<String>()
            .trim()
            .to_string()
    }

    fn post(&self, value: String, song: &dyn Song) -> Result<String> {
        if value.is_empty() {
            return Ok(value);
        }

        let mut value = if self.keep_extension {
            self.append_extension(value, song)
        } else {
            value
        };

        if self.platform.family == PlatformFamily::Windows {
            value = self.strip_incompatible(&value);
        }

        let value = self.platform.expand_home(value);
        let value = limit_path(
            &value,
            self.platform.separator(),
            self.options.max_segment_len,
            self.options.ellipsis,
        );

        if value.contains(self.platform.separator()) && !self.platform.is_absolute(&value) {
            return Err(PatternError::NotRooted { path: value });
        }
        Ok(value)
    }
}

/// Zero-pad `tracknumber` to the digits of the total (at least two) and
/// `discnumber` to two digits. Anything unparsable passes through.
fn pad_number(key: &str, value: String) -> String {
    let mut parts = value.split('/');
    let Some(Ok(number)) = parts.next().map(|p| p.trim().parse::<i64>()) else {
        return value;
    };

    match key {
        "tracknumber" => {
            let width = parts
                .next()
                .and_then(|total| total.trim().parse::<i64>().ok())
                .map_or(2, |total| total.to_string().len().max(2));
            format!("{:0width$}", number, width = width)
        }
        "discnumber" => format!("{:02}", number),
        _ => value,
    }
}

/// Replace characters Windows forbids in a path segment; a segment may not
/// end in `.` or a space either.
fn strip_win32_segment(segment: &str) -> String {
    let mut out: String = segment
        .chars()
        .map(|c| if "\\:*?;\"<>|/".contains(c) { '_' } else { c })
        .collect();
    if out.ends_with('.') || out.ends_with(' ') {
        out.pop();
        out.push('_');
    }
    out
}

/// Split `path` into stem and extension, where the extension starts at the
/// last dot of the final component unless that component is all leading dots.
fn split_extension(path: &str, sep: char) -> (&str, &str) {
    let name_start = path.rfind(sep).map_or(0, |i| i + sep.len_utf8());
    match path.rfind('.') {
        Some(dot) if dot >= name_start && path[name_start..dot].chars().any(|c| c != '.') => {
            path.split_at(dot)
        }
        _ => (path, ""),
    }
}

/// Shorten every segment of `path` to at most `limit` characters. The last
/// segment shares its limit with the extension. Shortened segments end in
/// `..` when `ellipsis` is set and the limit leaves room for it.
pub fn limit_path(path: &str, sep: char, limit: usize, ellipsis: bool) -> String {
    let (main, ext) = split_extension(path, sep);
    let ext_len = ext.chars().count();
    let parts: Vec<&str> = main.split(sep).collect();
    let last = parts.len() - 1;

    let limited: Vec<String> = parts
        .iter()
        .enumerate()
        .map(|(i, part)| {
            let limit = if i == last {
                limit.saturating_sub(ext_len)
            } else {
                limit
            };
            if part.chars().count() <= limit {
                return part.to_string();
            }
            if ellipsis && limit >= 2 {
                let kept: String = part.chars().take(limit.saturating_sub(2)).collect();
                kept + ".."
            } else {
                part.chars().take(limit).collect()
            }
        })
        .collect();

    limited.join(&sep.to_string()) + ext
}

//! File naming for processed images and archives.
//!
//! - Output names: `vacation.png` → `processed_vacation.jpg` (the extension
//!   follows the single output codec, not the input).
//! - Archive names: `picsqueeze-2026-10-16T09-30-00.zip`, colons replaced so
//!   the name is valid on every filesystem.
//! - Entries inside one archive are unique: a second `processed_a.jpg`
//!   becomes `processed_a-2.jpg`.

use chrono::NaiveDateTime;
use std::collections::HashSet;
use std::path::Path;

/// Directory every archive entry is placed under.
pub const ARCHIVE_FOLDER: &str = "picsqueeze-images";

/// Extension of every processed image.
pub const OUTPUT_EXTENSION: &str = "jpg";

/// Output file name for a source display name.
pub fn output_name(display_name: &str) -> String {
    let stem = Path::new(display_name)
        .file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .filter(|s| !s.trim().is_empty())
        .unwrap_or_else(|| "image".to_string());
    format!("processed_{stem}.{OUTPUT_EXTENSION}")
}

/// Filesystem-safe timestamp, e.g. `2026-10-16T09-30-00`.
pub fn timestamp_slug(at: &NaiveDateTime) -> String {
    at.format("%Y-%m-%dT%H-%M-%S").to_string()
}

/// Archive file name for a build started at `at`.
pub fn archive_filename(at: &NaiveDateTime) -> String {
    format!("picsqueeze-{}.zip", timestamp_slug(at))
}

/// Hands out names that are unique within one archive.
#[derive(Debug, Default)]
pub struct UniqueNames {
    taken: HashSet<String>,
}

impl UniqueNames {
    pub fn new() -> Self {
        Self::default()
    }

    /// Return `name`, or `name` with a `-N` suffix before the extension if
    /// it was already handed out. Comparison ignores ASCII case.
    pub fn claim(&mut self, name: &str) -> String {
        if self.taken.insert(name.to_ascii_lowercase()) {
            return name.to_string();
        }

        let (stem, ext) = match name.rsplit_once('.') {
            Some((stem, ext)) if !stem.is_empty() => (stem, Some(ext)),
            _ => (name, None),
        };
        let mut n = 2;
        loop {
            let candidate = match ext {
                Some(ext) => format!("{stem}-{n}.{ext}"),
                None => format!("{stem}-{n}"),
            };
            if self.taken.insert(candidate.to_ascii_lowercase()) {
                return candidate;
            }
            n += 1;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    fn at() -> NaiveDateTime {
        NaiveDate::from_ymd_opt(2026, 10, 16)
            .unwrap()
            .and_hms_opt(9, 5, 7)
            .unwrap()
    }

    #[test]
    fn output_name_normalizes_extension() {
        assert_eq!(output_name("vacation.png"), "processed_vacation.jpg");
        assert_eq!(output_name("IMG_0001.JPG"), "processed_IMG_0001.jpg");
    }

    #[test]
    fn output_name_keeps_inner_dots() {
        assert_eq!(output_name("a.b.c.webp"), "processed_a.b.c.jpg");
    }

    #[test]
    fn output_name_without_extension() {
        assert_eq!(output_name("scan"), "processed_scan.jpg");
    }

    #[test]
    fn output_name_empty_falls_back() {
        assert_eq!(output_name(""), "processed_image.jpg");
    }

    #[test]
    fn timestamp_has_no_colons() {
        assert_eq!(timestamp_slug(&at()), "2026-10-16T09-05-07");
    }

    #[test]
    fn archive_filename_includes_timestamp() {
        assert_eq!(archive_filename(&at()), "picsqueeze-2026-10-16T09-05-07.zip");
    }

    #[test]
    fn unique_names_suffix_duplicates() {
        let mut names = UniqueNames::new();
        assert_eq!(names.claim("processed_a.jpg"), "processed_a.jpg");
        assert_eq!(names.claim("processed_a.jpg"), "processed_a-2.jpg");
        assert_eq!(names.claim("PROCESSED_A.jpg"), "PROCESSED_A-3.jpg");
        assert_eq!(names.claim("processed_b.jpg"), "processed_b.jpg");
    }

    #[test]
    fn unique_names_skip_taken_suffixes() {
        let mut names = UniqueNames::new();
        names.claim("x-2.jpg");
        names.claim("x.jpg");
        assert_eq!(names.claim("x.jpg"), "x-3.jpg");
    }

    #[test]
    fn unique_names_without_extension() {
        let mut names = UniqueNames::new();
        names.claim("readme");
        assert_eq!(names.claim("readme"), "readme-2");
    }
}

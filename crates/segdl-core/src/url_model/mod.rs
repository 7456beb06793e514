//! File naming for a job: final name from the URL, part files, assembly temp file.

mod path;
mod sanitize;

pub use path::filename_from_url_path;
pub use sanitize::{sanitize_filename, MAX_NAME_LEN};

use std::path::{Path, PathBuf};

/// Default filename when the URL path yields nothing usable.
pub const DEFAULT_FILENAME: &str = "download.bin";

/// Suffix of the temp file the assembler writes before renaming into place.
pub const TEMP_SUFFIX: &str = ".part";

/// Final file name for `url`: the sanitized basename of its path.
///
/// - `derive_filename("https://example.com/iso/debian.iso")` → `"debian.iso"`
/// - `derive_filename("https://example.com/")` → `"download.bin"`
pub fn derive_filename(url: &str) -> String {
    filename_from_url_path(url)
        .map(|raw| sanitize_filename(&raw))
        .filter(|name| !name.is_empty())
        .unwrap_or_else(|| DEFAULT_FILENAME.to_string())
}

/// Part file for segment `index`: `<dir>/<file_name>.part<index>`.
pub fn part_path(dir: &Path, file_name: &str, index: usize) -> PathBuf {
    dir.join(format!("{}.part{}", file_name, index))
}

/// Assembly temp file: appends `.part` to the final path.
pub fn temp_path(final_path: &Path) -> PathBuf {
    let mut o = final_path.as_os_str().to_owned();
    o.push(TEMP_SUFFIX);
    PathBuf::from(o)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn derive_filename_from_url_path() {
        assert_eq!(derive_filename("https://example.com/archive.zip"), "archive.zip");
        assert_eq!(
            derive_filename("https://cdn.example.com/path/to/debian-12.iso?sig=abc"),
            "debian-12.iso"
        );
    }

    #[test]
    fn derive_filename_fallbacks() {
        assert_eq!(derive_filename("https://example.com/"), DEFAULT_FILENAME);
        assert_eq!(derive_filename("https://example.com"), DEFAULT_FILENAME);
        assert_eq!(derive_filename("https://example.com/.."), DEFAULT_FILENAME);
        assert_eq!(derive_filename("not a url"), DEFAULT_FILENAME);
    }

    #[test]
    fn part_and_temp_paths() {
        let dir = Path::new("/tmp/dl");
        assert_eq!(part_path(dir, "file.iso", 0), Path::new("/tmp/dl/file.iso.part0"));
        assert_eq!(part_path(dir, "file.iso", 15), Path::new("/tmp/dl/file.iso.part15"));
        assert_eq!(
            temp_path(Path::new("/tmp/dl/file.iso")),
            Path::new("/tmp/dl/file.iso.part")
        );
    }
}

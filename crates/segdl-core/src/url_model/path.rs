//! Basename of a URL's path.

/// Last non-empty path segment of `url`, or `None` for unparsable URLs,
/// root paths and `.`/`..`. Query and fragment are ignored.
pub fn filename_from_url_path(url: &str) -> Option<String> {
    let parsed = url::Url::parse(url).ok()?;
    let segment = parsed.path_segments()?.filter(|s| !s.is_empty()).last()?;
    match segment {
        "." | ".." => None,
        s => Some(s.to_string()),
    }
}

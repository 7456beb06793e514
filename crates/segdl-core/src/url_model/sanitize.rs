const NAME_MAX: usize = 255;

/// Longest suffix added to a final name: `.part` plus a segment index.
const SUFFIX_RESERVE: usize = 12;

/// Longest sanitized name, so that `<name>.part<index>` still fits in a
/// 255-byte directory entry.
pub const MAX_NAME_LEN: usize = NAME_MAX - SUFFIX_RESERVE;

/// Makes a URL-derived name safe to create in the destination directory.
///
/// Path separators, NUL, control characters and the characters Windows
/// rejects (`:*?"<>|`) become `_`; runs of `_` collapse; leading and trailing
/// dots and spaces are dropped; the result is capped at [`MAX_NAME_LEN`]
/// bytes.
pub fn sanitize_filename(name: &str) -> String {
    let mut out = String::with_capacity(name.len());
    for c in name.chars() {
        let unsafe_char = c.is_control() || matches!(c, '/' | '\\' | ':' | '*' | '?' | '"' | '<' | '>' | '|');
        let c = if unsafe_char { '_' } else { c };
        if c == '_' && out.ends_with('_') {
            continue;
        }
        out.push(c);
    }

    let trimmed = out.trim_matches(|c: char| c == '.' || c == ' ');
    let mut end = trimmed.len().min(MAX_NAME_LEN);
    while !trimmed.is_char_boundary(end) {
        end -= 1;
    }
    trimmed[..end].to_string()
}

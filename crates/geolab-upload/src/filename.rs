//! Object key derivation

/// Prefix for every uploaded resource
pub const KEY_PREFIX: &str = "resources";

const MAX_NAME_LEN: usize = 128;
/// Longest suffix (dot included) kept intact when a name is shortened
const MAX_EXT_LEN: usize = 16;

/// Make a filename safe for an object key.
///
/// Keeps ASCII letters, digits, `.`, `-` and `_`; every other run of
/// characters (spaces, Arabic script, path separators) collapses to one `_`.
/// Leading dots are dropped so keys never name hidden files or `..`.
/// Long names are shortened in the stem, keeping the extension.
pub fn sanitize_filename(name: &str) -> String {
    let base = name.rsplit(['/', '\\']).next().unwrap_or(name);

    let mut out = String::with_capacity(base.len());
    let mut last_replaced = false;
    for c in base.chars() {
        if c.is_ascii_alphanumeric() || matches!(c, '.' | '-' | '_') {
            out.push(c);
            last_replaced = false;
        } else if !last_replaced {
            out.push('_');
            last_replaced = true;
        }
    }

    let trimmed = out.trim_start_matches('.');
    let mut safe = cap_length(trimmed);
    if safe.chars().all(|c| matches!(c, '_' | '.')) {
        safe = "file".to_string();
    }
    safe
}

// Only ASCII survives sanitizing, so byte offsets are char boundaries
fn cap_length(name: &str) -> String {
    if name.len() <= MAX_NAME_LEN {
        return name.to_string();
    }
    match name.rfind('.') {
        Some(dot) if name.len() - dot <= MAX_EXT_LEN => {
            let ext = &name[dot..];
            format!("{}{}", &name[..MAX_NAME_LEN - ext.len()], ext)
        }
        _ => name[..MAX_NAME_LEN].to_string(),
    }
}

/// `resources/<timestamp>-<sanitized filename>`
pub fn object_key(timestamp_ms: i64, filename: &str) -> String {
    format!("{}/{}-{}", KEY_PREFIX, timestamp_ms, sanitize_filename(filename))
}

//! Storage key derivation
//!
//! Originals live under [`UPLOADS_PREFIX`] and their thumbnails under
//! [`THUMBNAILS_PREFIX`] with the exact same name.

use std::borrow::Cow;

use uuid::Uuid;

/// Key prefix for uploaded originals
pub const UPLOADS_PREFIX: &str = "uploads/";

/// Key prefix for derived thumbnails
pub const THUMBNAILS_PREFIX: &str = "thumbnails/";

const FALLBACK_EXTENSION: &str = "bin";

/// Canonical extensions for types whose registry entry lists several
/// equally short candidates
const PREFERRED_EXTENSIONS: &[(&str, &str)] = &[
    ("application/octet-stream", "bin"),
    ("audio/mpeg", "mp3"),
    ("image/jpeg", "jpg"),
    ("text/plain", "txt"),
    ("video/quicktime", "mov"),
];

/// Key of an original
#[must_use]
pub fn original_key(name: &str) -> String {
    format!("{UPLOADS_PREFIX}{name}")
}

/// Key of the thumbnail paired with an original of the same name
#[must_use]
pub fn thumbnail_key(name: &str) -> String {
    format!("{THUMBNAILS_PREFIX}{name}")
}

/// Derives the object name for an upload
///
/// A filename hint is percent-decoded and reduced to its final path segment.
/// Without a usable hint the name is a random UUID plus an extension guessed
/// from `content_type`. The result is never empty and never contains `/` or `\`.
#[must_use]
pub fn derive_object_name(filename_hint: Option<&str>, content_type: &str) -> String {
    filename_hint
        .and_then(sanitize_filename)
        .unwrap_or_else(|| {
            format!(
                "{}.{}",
                Uuid::new_v4().simple(),
                extension_for_content_type(content_type)
            )
        })
}

/// Percent-decodes a filename hint and keeps only its basename
///
/// Returns `None` when nothing usable remains.
#[must_use]
pub fn sanitize_filename(hint: &str) -> Option<String> {
    let decoded = urlencoding::decode_binary(hint.as_bytes());
    let decoded = String::from_utf8_lossy(&decoded);

    let basename = decoded
        .rsplit(['/', '\\'])
        .next()
        .unwrap_or_default();

    match basename {
        "" | "." | ".." => None,
        name => Some(name.to_string()),
    }
}

/// Guesses a file extension (without the dot) for a content type
///
/// Registered types resolve through the `mime_guess` registry. Unknown types fall
/// back to their subtype token, e.g. `image/x-foo` gives `x-foo`.
#[must_use]
pub fn extension_for_content_type(content_type: &str) -> Cow<'static, str> {
    let essence = content_type.parse::<mime::Mime>().map_or_else(
        |_| {
            content_type
                .split(';')
                .next()
                .unwrap_or_default()
                .trim()
                .to_ascii_lowercase()
        },
        |mime| mime.essence_str().to_ascii_lowercase(),
    );

    if let Some(extension) = registered_extension(&essence) {
        return Cow::Borrowed(extension);
    }

    let subtype: String = essence
        .rsplit('/')
        .next()
        .unwrap_or_default()
        .chars()
        .filter(|c| c.is_ascii_alphanumeric() || matches!(c, '-' | '+' | '.'))
        .collect();
    let subtype = subtype.trim_matches('.');

    if subtype.is_empty() {
        Cow::Borrowed(FALLBACK_EXTENSION)
    } else {
        Cow::Owned(subtype.to_string())
    }
}

/// Picks one extension from the `mime_guess` registry
///
/// Order: preferred table, extension equal to the subtype, shortest candidate.
fn registered_extension(essence: &str) -> Option<&'static str> {
    if let Some((_, extension)) = PREFERRED_EXTENSIONS.iter().find(|(known, _)| *known == essence) {
        return Some(*extension);
    }

    let candidates = mime_guess::get_mime_extensions_str(essence)?;
    let subtype = essence.rsplit('/').next().unwrap_or_default();

    candidates
        .iter()
        .find(|extension| **extension == subtype)
        .or_else(|| candidates.iter().min_by_key(|extension| extension.len()))
        .copied()
}

use std::path::Path;

/// What a file is being taken in for. Uploads accept a wider set of formats.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum IntakePurpose {
    Crop,
    Compress,
    Upload,
}

const EDIT_EXTENSIONS: &[&str] = &["png", "jpg", "jpeg", "gif"];
const UPLOAD_EXTENSIONS: &[&str] = &["png", "jpg", "jpeg", "gif", "webp"];

fn extension(path: &Path) -> Option<String> {
    path.extension()
        .and_then(|e| e.to_str())
        .map(str::to_ascii_lowercase)
}

/// Whether `path` has an image extension accepted for `purpose`.
pub fn is_accepted(path: &Path, purpose: IntakePurpose) -> bool {
    let allowed = match purpose {
        IntakePurpose::Crop | IntakePurpose::Compress => EDIT_EXTENSIONS,
        IntakePurpose::Upload => UPLOAD_EXTENSIONS,
    };
    extension(path).is_some_and(|ext| allowed.contains(&ext.as_str()))
}

/// Image mime type derived from the file extension.
pub fn mime_for_path(path: &Path) -> Option<&'static str> {
    match extension(path)?.as_str() {
        "png" => Some("image/png"),
        "jpg" | "jpeg" => Some("image/jpeg"),
        "gif" => Some("image/gif"),
        "webp" => Some("image/webp"),
        _ => None,
    }
}

/// Short format name, the mime subtype (`image/jpeg` -> `jpeg`).
pub fn format_name(mime: &str) -> &str {
    mime.split_once('/').map_or(mime, |(_, sub)| sub)
}

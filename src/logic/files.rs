//! Uploaded files, and which of them are acceptable.

use crate::{
    dal::{FileKind, Uploads},
    logic::not_found,
};
use failure::Fallible;
use std::path::Path;

/// The extensions accepted for avatars and meal images.
pub const IMAGE_EXTENSIONS: &[&str] = &["jpeg", "jpg", "png", "gif"];

/// The extensions accepted for meal data files.
pub const DATA_EXTENSIONS: &[&str] = &["csv", "txt"];

/// A file sent in a multipart form.
#[derive(Clone, Debug)]
pub struct Upload {
    /// The name the client gave the file.
    pub filename: String,

    /// The file's contents.
    pub contents: Vec<u8>,
}

impl Upload {
    /// Returns the file's extension, lowercased, if it is one of the allowed ones.
    pub fn extension_in(&self, allowed: &[&str]) -> Option<String> {
        let ext = Path::new(&self.filename)
            .extension()?
            .to_str()?
            .to_ascii_lowercase();
        if allowed.contains(&ext.as_str()) {
            Some(ext)
        } else {
            None
        }
    }
}

/// Reads an uploaded avatar. Names that couldn't be avatars are refused outright, rather than
/// being looked up.
pub async fn avatar(uploads: &Uploads, name: &str) -> Fallible<Option<Vec<u8>>> {
    let upload = Upload {
        filename: name.to_owned(),
        contents: Vec::new(),
    };
    let unsafe_name = name.contains('/') || name.contains('\\') || name.starts_with('.');
    if unsafe_name || upload.extension_in(IMAGE_EXTENSIONS).is_none() {
        return not_found(format!("There is no avatar named {}.", name));
    }
    uploads.load(FileKind::Avatar, name).await
}

/// Guesses the MIME type of a stored file from its name.
pub fn content_type(name: &str) -> &'static str {
    let ext = Path::new(name)
        .extension()
        .and_then(|ext| ext.to_str())
        .map(|ext| ext.to_ascii_lowercase());
    match ext.as_ref().map(|ext| ext.as_str()) {
        Some("png") => "image/png",
        Some("gif") => "image/gif",
        Some("jpg") | Some("jpeg") => "image/jpeg",
        Some("csv") => "text/csv; charset=utf-8",
        Some("txt") => "text/plain; charset=utf-8",
        Some("css") => "text/css; charset=utf-8",
        _ => "application/octet-stream",
    }
}

#[cfg(test)]
mod tests {
    use super::{content_type, Upload, DATA_EXTENSIONS, IMAGE_EXTENSIONS};

    fn upload(filename: &str) -> Upload {
        Upload {
            filename: filename.to_owned(),
            contents: Vec::new(),
        }
    }

    #[test]
    fn extensions_are_case_insensitive() {
        assert_eq!(
            upload("photo.JPG").extension_in(IMAGE_EXTENSIONS),
            Some("jpg".to_owned())
        );
        assert_eq!(
            upload("results.Csv").extension_in(DATA_EXTENSIONS),
            Some("csv".to_owned())
        );
    }

    #[test]
    fn rejects_other_extensions() {
        assert_eq!(upload("results.exe").extension_in(DATA_EXTENSIONS), None);
        assert_eq!(upload("photo.csv").extension_in(IMAGE_EXTENSIONS), None);
        assert_eq!(upload("noextension").extension_in(DATA_EXTENSIONS), None);
        assert_eq!(upload("").extension_in(DATA_EXTENSIONS), None);
    }

    #[test]
    fn content_types() {
        assert_eq!(content_type("3.PNG"), "image/png");
        assert_eq!(content_type("3.csv"), "text/csv; charset=utf-8");
        assert_eq!(content_type("3"), "application/octet-stream");
    }
}

//! Uploaded files: user avatars, and the results trays send back for meals.

use failure::Fallible;
use std::{
    io::ErrorKind,
    path::{Path, PathBuf},
};
use tokio::fs;

/// What an uploaded file is. Each kind lives in its own directory.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum FileKind {
    /// A user's avatar, served publicly.
    Avatar,

    /// A data file or image a tray sent back for a meal.
    Data,
}

impl FileKind {
    fn dir_name(self) -> &'static str {
        match self {
            FileKind::Avatar => "avatars",
            FileKind::Data => "data",
        }
    }
}

/// The directory uploads are stored under.
#[derive(Clone, Debug)]
pub struct Uploads {
    root: PathBuf,
}

impl Uploads {
    /// Uses the given directory for uploads, creating it (and the per-kind directories) as
    /// needed.
    pub fn open<P: AsRef<Path>>(root: P) -> Fallible<Uploads> {
        let uploads = Uploads {
            root: root.as_ref().to_owned(),
        };
        for &kind in &[FileKind::Avatar, FileKind::Data] {
            std::fs::create_dir_all(uploads.dir(kind))?;
        }
        Ok(uploads)
    }

    /// The directory files of the given kind are stored in.
    pub fn dir(&self, kind: FileKind) -> PathBuf {
        self.root.join(kind.dir_name())
    }

    /// Stores a file, replacing any file of the same kind and name. The name must be a bare file
    /// name, not a path.
    pub async fn store(&self, kind: FileKind, name: &str, contents: Vec<u8>) -> Fallible<()> {
        let path = self.path(kind, name)?;
        fs::write(path, contents).await?;
        Ok(())
    }

    /// Reads a file back, if it exists.
    pub async fn load(&self, kind: FileKind, name: &str) -> Fallible<Option<Vec<u8>>> {
        let path = self.path(kind, name)?;
        match fs::read(path).await {
            Ok(contents) => Ok(Some(contents)),
            Err(ref err) if err.kind() == ErrorKind::NotFound => Ok(None),
            Err(err) => Err(err.into()),
        }
    }

    /// Finds the first existing file named `<stem>.<ext>` for one of the given extensions,
    /// returning its name and contents.
    pub async fn load_any(
        &self,
        kind: FileKind,
        stem: &str,
        extensions: &[&str],
    ) -> Fallible<Option<(String, Vec<u8>)>> {
        for ext in extensions {
            let name = format!("{}.{}", stem, ext);
            if let Some(contents) = self.load(kind, &name).await? {
                return Ok(Some((name, contents)));
            }
        }
        Ok(None)
    }

    /// Like `load_any`, but only returns the name of the file.
    pub async fn find_any(
        &self,
        kind: FileKind,
        stem: &str,
        extensions: &[&str],
    ) -> Fallible<Option<String>> {
        for ext in extensions {
            let name = format!("{}.{}", stem, ext);
            match fs::metadata(self.path(kind, &name)?).await {
                Ok(meta) if meta.is_file() => return Ok(Some(name)),
                Ok(_) => {}
                Err(ref err) if err.kind() == ErrorKind::NotFound => {}
                Err(err) => return Err(err.into()),
            }
        }
        Ok(None)
    }

    /// Removes every `<stem>.<ext>` file for the given extensions, so a new upload doesn't sit
    /// next to a stale one with a different extension.
    pub async fn remove_any(&self, kind: FileKind, stem: &str, extensions: &[&str]) -> Fallible<()> {
        for ext in extensions {
            let path = self.path(kind, &format!("{}.{}", stem, ext))?;
            match fs::remove_file(path).await {
                Ok(()) => {}
                Err(ref err) if err.kind() == ErrorKind::NotFound => {}
                Err(err) => return Err(err.into()),
            }
        }
        Ok(())
    }

    fn path(&self, kind: FileKind, name: &str) -> Fallible<PathBuf> {
        if name.is_empty() || name.contains('/') || name.contains('\\') || name.starts_with('.') {
            failure::bail!("Refusing to use {:?} as an upload name", name);
        }
        Ok(self.dir(kind).join(name))
    }
}

#[cfg(test)]
mod tests {
    use super::{FileKind, Uploads};

    #[tokio::test]
    async fn stores_and_finds_files_by_stem() {
        let dir = tempfile::tempdir().unwrap();
        let uploads = Uploads::open(dir.path()).unwrap();

        uploads
            .store(FileKind::Data, "3.png", b"image".to_vec())
            .await
            .unwrap();
        let found = uploads
            .load_any(FileKind::Data, "3", &["jpg", "png"])
            .await
            .unwrap();
        assert_eq!(found, Some(("3.png".to_owned(), b"image".to_vec())));
        assert_eq!(
            uploads
                .find_any(FileKind::Data, "3", &["csv", "png"])
                .await
                .unwrap(),
            Some("3.png".to_owned())
        );

        uploads
            .remove_any(FileKind::Data, "3", &["jpg", "png"])
            .await
            .unwrap();
        assert_eq!(uploads.load(FileKind::Data, "3.png").await.unwrap(), None);
    }

    #[tokio::test]
    async fn refuses_paths() {
        let dir = tempfile::tempdir().unwrap();
        let uploads = Uploads::open(dir.path()).unwrap();

        assert!(uploads
            .store(FileKind::Avatar, "../escape.png", Vec::new())
            .await
            .is_err());
    }
}

use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use tokio::io::AsyncWriteExt;

#[derive(Debug, thiserror::Error)]
pub enum PersistenceError {
    #[error("failed to read {path}: {source}")]
    Read {
        path: PathBuf,
        source: std::io::Error,
    },
    #[error("failed to write {path}: {source}")]
    Write {
        path: PathBuf,
        source: std::io::Error,
    },
}

pub trait LastSeenRepository {
    /// `None` means nothing has been stored yet.
    fn load(
        &self,
    ) -> impl std::future::Future<Output = Result<Option<String>, PersistenceError>> + Send;

    fn save(
        &mut self,
        identifier: &str,
    ) -> impl std::future::Future<Output = Result<(), PersistenceError>> + Send;
}

/// Keeps the last seen identifier as the whole content of a plain text file.
pub struct FileLastSeenRepository {
    path: PathBuf,
}

impl FileLastSeenRepository {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn write_error(&self, source: std::io::Error) -> PersistenceError {
        PersistenceError::Write {
            path: self.path.clone(),
            source,
        }
    }
}

impl LastSeenRepository for FileLastSeenRepository {
    async fn load(&self) -> Result<Option<String>, PersistenceError> {
        match tokio::fs::read_to_string(&self.path).await {
            Ok(content) => {
                let value = content.trim();
                Ok((!value.is_empty()).then(|| value.to_string()))
            }
            Err(err) if err.kind() == ErrorKind::NotFound => Ok(None),
            Err(source) => Err(PersistenceError::Read {
                path: self.path.clone(),
                source,
            }),
        }
    }

    async fn save(&mut self, identifier: &str) -> Result<(), PersistenceError> {
        if let Some(parent) = self.path.parent().filter(|p| !p.as_os_str().is_empty()) {
            tokio::fs::create_dir_all(parent)
                .await
                .map_err(|err| self.write_error(err))?;
        }

        // Rename over the old file so an interrupted write leaves it intact.
        let mut tmp = self.path.clone().into_os_string();
        tmp.push(".tmp");
        let tmp = PathBuf::from(tmp);

        if let Err(err) = write_synced(&tmp, identifier).await {
            let _ = tokio::fs::remove_file(&tmp).await;
            return Err(self.write_error(err));
        }
        if let Err(err) = tokio::fs::rename(&tmp, &self.path).await {
            let _ = tokio::fs::remove_file(&tmp).await;
            return Err(self.write_error(err));
        }
        Ok(())
    }
}

async fn write_synced(path: &Path, content: &str) -> std::io::Result<()> {
    let mut file = tokio::fs::File::create(path).await?;
    file.write_all(content.as_bytes()).await?;
    file.sync_all().await
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn missing_file_means_no_prior_state() {
        let dir = tempfile::tempdir().unwrap();
        let repository = FileLastSeenRepository::new(dir.path().join("last_seen.txt"));
        assert_eq!(repository.load().await.unwrap(), None);
    }

    #[tokio::test]
    async fn save_then_load_round_trips() {
        let dir = tempfile::tempdir().unwrap();
        let mut repository = FileLastSeenRepository::new(dir.path().join("state/last_seen.txt"));

        repository.save("https://x/job/1").await.unwrap();
        repository.save("https://x/job/2").await.unwrap();

        assert_eq!(
            repository.load().await.unwrap().as_deref(),
            Some("https://x/job/2")
        );
        let raw = std::fs::read_to_string(repository.path()).unwrap();
        assert_eq!(raw, "https://x/job/2");
        assert!(!dir.path().join("state/last_seen.txt.tmp").exists());
    }

    #[tokio::test]
    async fn stored_value_is_trimmed() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("last_seen.txt");
        std::fs::write(&path, "https://x/job/1\n").unwrap();

        let repository = FileLastSeenRepository::new(path);
        assert_eq!(
            repository.load().await.unwrap().as_deref(),
            Some("https://x/job/1")
        );
    }

    #[tokio::test]
    async fn blank_file_means_no_prior_state() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("last_seen.txt");
        std::fs::write(&path, "  \n").unwrap();

        let repository = FileLastSeenRepository::new(path);
        assert_eq!(repository.load().await.unwrap(), None);
    }

    #[tokio::test]
    async fn failed_rename_leaves_no_temp_file() {
        let dir = tempfile::tempdir().unwrap();
        // A non-empty directory cannot be replaced by a file.
        let target = dir.path().join("last_seen.txt");
        std::fs::create_dir(&target).unwrap();
        std::fs::write(target.join("keep"), "x").unwrap();

        let mut repository = FileLastSeenRepository::new(&target);
        let result = repository.save("https://x/job/1").await;

        assert!(matches!(result, Err(PersistenceError::Write { .. })));
        assert!(!dir.path().join("last_seen.txt.tmp").exists());
        assert!(target.join("keep").exists());
    }

    #[tokio::test]
    async fn unreadable_path_is_a_read_error() {
        let dir = tempfile::tempdir().unwrap();
        // A directory cannot be read as a file.
        let repository = FileLastSeenRepository::new(dir.path());
        assert!(matches!(
            repository.load().await,
            Err(PersistenceError::Read { .. })
        ));
    }
}

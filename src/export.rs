use anyhow::{Context, Result};
use async_trait::async_trait;
use std::path::PathBuf;
use tracing::info;

use crate::model::PosterFile;

/// Local save step for a captured poster.
#[async_trait]
pub trait FileSaver: Send + Sync {
    async fn save(&self, file: &PosterFile) -> Result<PathBuf>;
}

/// Writes posters into a directory, creating it on first use.
#[derive(Debug, Clone)]
pub struct LocalDownloads {
    dir: PathBuf,
}

impl LocalDownloads {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }
}

#[async_trait]
impl FileSaver for LocalDownloads {
    async fn save(&self, file: &PosterFile) -> Result<PathBuf> {
        tokio::fs::create_dir_all(&self.dir)
            .await
            .with_context(|| format!("failed to create output dir: {}", self.dir.display()))?;
        let path = self.dir.join(&file.file_name);
        tokio::fs::write(&path, &file.bytes)
            .await
            .with_context(|| format!("failed to write poster: {}", path.display()))?;
        info!(path = %path.display(), bytes = file.bytes.len(), "saved poster");
        Ok(path)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[tokio::test]
    async fn saves_into_nested_dir() {
        let td = tempdir().unwrap();
        let saver = LocalDownloads::new(td.path().join("out"));
        let file = PosterFile::new(5, vec![1, 2, 3]);
        let path = saver.save(&file).await.unwrap();
        assert_eq!(path.file_name().unwrap(), "prerna-ai-5.png");
        assert_eq!(std::fs::read(path).unwrap(), vec![1, 2, 3]);
    }
}

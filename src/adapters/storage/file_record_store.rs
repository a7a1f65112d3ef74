//! File-based record and transcript stores.
//!
//! Records are YAML files under `<base>/clients/<client-id>.yaml`, one per
//! client, rewritten on every put. Transcripts are appended as separate
//! YAML files under `<base>/transcripts/<client-id>/`.

use async_trait::async_trait;
use std::path::{Path, PathBuf};
use tokio::fs;

use crate::domain::client::ClientRecord;
use crate::domain::foundation::{ClientId, DomainError, ErrorCode};
use crate::ports::{RecordStore, TranscriptRecord, TranscriptStore};

/// File-based storage for client records.
#[derive(Debug, Clone)]
pub struct FileRecordStore {
    base_path: PathBuf,
}

impl FileRecordStore {
    /// Create a store rooted at `base_path`.
    ///
    /// # Example
    /// ```ignore
    /// let store = FileRecordStore::new("./data");
    /// ```
    pub fn new<P: AsRef<Path>>(base_path: P) -> Self {
        Self {
            base_path: base_path.as_ref().to_path_buf(),
        }
    }

    fn clients_dir(&self) -> PathBuf {
        self.base_path.join("clients")
    }

    fn record_path(&self, id: &ClientId) -> Result<PathBuf, DomainError> {
        Ok(self.clients_dir().join(format!("{}.yaml", safe_component(id)?)))
    }

    async fn read_record(path: &Path) -> Result<ClientRecord, DomainError> {
        let yaml = fs::read_to_string(path).await.map_err(|e| io_error(path, e))?;
        serde_yaml::from_str(&yaml).map_err(|e| {
            DomainError::new(ErrorCode::SerializationFailed, e.to_string())
                .with_detail("path", path.display().to_string())
        })
    }
}

#[async_trait]
impl RecordStore for FileRecordStore {
    async fn get_all(&self) -> Result<Vec<ClientRecord>, DomainError> {
        let dir = self.clients_dir();
        let mut entries = match fs::read_dir(&dir).await {
            Ok(entries) => entries,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(Vec::new()),
            Err(e) => return Err(io_error(&dir, e)),
        };

        let mut paths = Vec::new();
        while let Some(entry) = entries.next_entry().await.map_err(|e| io_error(&dir, e))? {
            let path = entry.path();
            if path.extension().is_some_and(|ext| ext == "yaml") {
                paths.push(path);
            }
        }
        paths.sort();

        let mut records = Vec::with_capacity(paths.len());
        for path in paths {
            records.push(Self::read_record(&path).await?);
        }
        Ok(records)
    }

    async fn get(&self, id: &ClientId) -> Result<Option<ClientRecord>, DomainError> {
        let path = self.record_path(id)?;
        match fs::try_exists(&path).await {
            Ok(true) => Self::read_record(&path).await.map(Some),
            Ok(false) => Ok(None),
            Err(e) => Err(io_error(&path, e)),
        }
    }

    async fn put(&self, record: &ClientRecord) -> Result<(), DomainError> {
        let dir = self.clients_dir();
        fs::create_dir_all(&dir).await.map_err(|e| io_error(&dir, e))?;

        let path = self.record_path(record.id())?;
        let yaml = serde_yaml::to_string(record)
            .map_err(|e| DomainError::new(ErrorCode::SerializationFailed, e.to_string()))?;

        // Write then rename so readers never see a half-written record.
        let tmp = path.with_extension("yaml.tmp");
        fs::write(&tmp, yaml).await.map_err(|e| io_error(&tmp, e))?;
        fs::rename(&tmp, &path).await.map_err(|e| io_error(&path, e))?;
        Ok(())
    }
}

/// File-based append-only transcript storage.
#[derive(Debug, Clone)]
pub struct FileTranscriptStore {
    base_path: PathBuf,
}

impl FileTranscriptStore {
    pub fn new<P: AsRef<Path>>(base_path: P) -> Self {
        Self {
            base_path: base_path.as_ref().to_path_buf(),
        }
    }

    fn client_dir(&self, id: &ClientId) -> Result<PathBuf, DomainError> {
        Ok(self.base_path.join("transcripts").join(safe_component(id)?))
    }
}

#[async_trait]
impl TranscriptStore for FileTranscriptStore {
    async fn put(&self, transcript: &TranscriptRecord) -> Result<(), DomainError> {
        let dir = self.client_dir(&transcript.client_id)?;
        fs::create_dir_all(&dir).await.map_err(|e| io_error(&dir, e))?;

        let stem: String = transcript
            .file_name
            .chars()
            .map(|c| if c.is_alphanumeric() || c == '-' || c == '_' { c } else { '_' })
            .collect();
        let unique = &uuid::Uuid::new_v4().simple().to_string()[..8];
        let path = dir.join(format!(
            "{}-{}-{}.yaml",
            transcript.uploaded_at.as_datetime().format("%Y%m%dT%H%M%S"),
            unique,
            stem
        ));

        let yaml = serde_yaml::to_string(transcript)
            .map_err(|e| DomainError::new(ErrorCode::SerializationFailed, e.to_string()))?;
        fs::write(&path, yaml).await.map_err(|e| io_error(&path, e))
    }
}

/// Rejects ids that would escape the storage directory.
fn safe_component(id: &ClientId) -> Result<&str, DomainError> {
    let raw = id.as_str();
    if raw.contains(['/', '\\']) || raw == "." || raw == ".." {
        return Err(DomainError::new(ErrorCode::ValidationFailed, "client id is not a valid file name")
            .with_detail("client_id", raw));
    }
    Ok(raw)
}

fn io_error(path: &Path, err: std::io::Error) -> DomainError {
    DomainError::store(err.to_string()).with_detail("path", path.display().to_string())
}

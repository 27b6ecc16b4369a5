//! JSON file progress store.
//!
//! Layout under the data directory:
//!
//! ```text
//! users/<user>.json       latest profile, replaced atomically
//! events/<user>.jsonl     one answer event per line, append-only
//! sessions/<user>.jsonl   one session summary per line, append-only
//! ```
//!
//! File names are the user id with anything outside `[A-Za-z0-9_.-]`
//! percent-encoded.

use std::path::{Path, PathBuf};

use async_trait::async_trait;
use serde::de::DeserializeOwned;
use serde::Serialize;
use tokio::io::AsyncWriteExt;

use cluecraft_core::error::StoreError;
use cluecraft_core::model::AnswerEvent;
use cluecraft_core::profile::{SessionSummary, UserProfile};
use cluecraft_core::traits::ProgressStore;

#[derive(Debug, Clone)]
pub struct JsonFileStore {
    root: PathBuf,
}

impl JsonFileStore {
    /// Open (and create if needed) a store rooted at `root`.
    pub fn open(root: impl Into<PathBuf>) -> std::io::Result<Self> {
        let root = root.into();
        for sub in ["users", "events", "sessions"] {
            std::fs::create_dir_all(root.join(sub))?;
        }
        Ok(Self { root })
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    fn path(&self, kind: &str, user_id: &str, ext: &str) -> PathBuf {
        self.root
            .join(kind)
            .join(format!("{}.{ext}", file_stem(user_id)))
    }
}

fn file_stem(user_id: &str) -> String {
    let mut stem = String::with_capacity(user_id.len());
    for byte in user_id.bytes() {
        if byte.is_ascii_alphanumeric() || matches!(byte, b'_' | b'-' | b'.') {
            stem.push(byte as char);
        } else {
            stem.push_str(&format!("%{byte:02X}"));
        }
    }
    // Keep "." and ".." from naming directories
    if stem.chars().all(|c| c == '.') {
        stem = stem.replace('.', "%2E");
    }
    stem
}

async fn append_line<T: Serialize>(path: &Path, record: &T) -> Result<(), StoreError> {
    let mut line = serde_json::to_vec(record)?;
    line.push(b'\n');
    let mut file = tokio::fs::OpenOptions::new()
        .create(true)
        .append(true)
        .open(path)
        .await?;
    file.write_all(&line).await?;
    file.flush().await?;
    Ok(())
}

/// Read a JSON-lines file, newest record first, at most `limit` records.
async fn read_lines<T: DeserializeOwned>(
    path: &Path,
    user_id: &str,
    limit: usize,
) -> Result<Vec<T>, StoreError> {
    let content = match tokio::fs::read_to_string(path).await {
        Ok(content) => content,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(Vec::new()),
        Err(e) => return Err(e.into()),
    };

    let lines: Vec<(usize, &str)> = content
        .lines()
        .enumerate()
        .filter(|(_, line)| !line.trim().is_empty())
        .collect();
    lines
        .into_iter()
        .rev()
        .take(limit)
        .map(|(n, line)| {
            serde_json::from_str(line).map_err(|e| StoreError::Corrupt {
                user_id: user_id.to_string(),
                message: format!("{} line {}: {e}", path.display(), n + 1),
            })
        })
        .collect()
}

#[async_trait]
impl ProgressStore for JsonFileStore {
    fn name(&self) -> &str {
        "json"
    }

    async fn load_profile(&self, user_id: &str) -> Result<Option<UserProfile>, StoreError> {
        let path = self.path("users", user_id, "json");
        let content = match tokio::fs::read_to_string(&path).await {
            Ok(content) => content,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(None),
            Err(e) => return Err(e.into()),
        };
        let profile: UserProfile =
            serde_json::from_str(&content).map_err(|e| StoreError::Corrupt {
                user_id: user_id.to_string(),
                message: format!("{}: {e}", path.display()),
            })?;
        if profile.user_id != user_id {
            return Err(StoreError::Corrupt {
                user_id: user_id.to_string(),
                message: format!("profile belongs to {}", profile.user_id),
            });
        }
        Ok(Some(profile))
    }

    async fn save_profile(&self, profile: &UserProfile) -> Result<(), StoreError> {
        let path = self.path("users", &profile.user_id, "json");
        let tmp = path.with_extension("json.tmp");
        let bytes = serde_json::to_vec_pretty(profile)?;
        tokio::fs::write(&tmp, bytes).await?;
        tokio::fs::rename(&tmp, &path).await?;
        tracing::debug!(user_id = %profile.user_id, path = %path.display(), "profile saved");
        Ok(())
    }

    async fn append_event(&self, event: &AnswerEvent) -> Result<(), StoreError> {
        let path = self.path("events", &event.outcome.user_id, "jsonl");
        append_line(&path, event).await
    }

    async fn recent_events(&self, user_id: &str, limit: usize) -> Result<Vec<AnswerEvent>, StoreError> {
        read_lines(&self.path("events", user_id, "jsonl"), user_id, limit).await
    }

    async fn save_session(&self, summary: &SessionSummary) -> Result<(), StoreError> {
        let path = self.path("sessions", &summary.user_id, "jsonl");
        append_line(&path, summary).await
    }

    async fn recent_sessions(
        &self,
        user_id: &str,
        limit: usize,
    ) -> Result<Vec<SessionSummary>, StoreError> {
        read_lines(&self.path("sessions", user_id, "jsonl"), user_id, limit).await
    }
}

//! Session-keyed conversation store.
//!
//! Each chat session owns exactly one [`Conversation`], created on first
//! contact and kept behind its own async lock. The lock is the
//! serialization the pipeline's concurrency model asks the caller to
//! provide: two requests racing on the same session queue up; requests on
//! different sessions never contend.
//!
//! New conversations can be pre-populated from a JSONL transcript (one
//! role-tagged message per line). Lines that fail to parse are skipped with
//! a warning; a broken seed file degrades to empty history, it does not
//! take the service down.

use std::collections::HashMap;
use std::fs::File;
use std::io::{BufRead, BufReader};
use std::path::Path;
use std::sync::Arc;

use thiserror::Error;
use tokio::sync::{Mutex, RwLock};
use tracing::{info, warn};
use uuid::Uuid;

use chat_pipeline::{Conversation, Message};

/// Errors opening a seed transcript. Parse errors inside the file are not
/// represented here; they are skipped per line.
#[derive(Debug, Error)]
pub enum SeedError {
    #[error("[Session Store] failed to read seed transcript {path}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },
}

/// Shared, session-keyed store of conversations.
pub struct SessionStore {
    sessions: RwLock<HashMap<Uuid, Arc<Mutex<Conversation>>>>,
    seed: Vec<Message>,
}

impl SessionStore {
    /// A store whose new sessions start with empty history.
    pub fn new() -> Self {
        Self::with_seed(Vec::new())
    }

    /// A store whose new sessions start with a copy of `seed`.
    pub fn with_seed(seed: Vec<Message>) -> Self {
        Self {
            sessions: RwLock::new(HashMap::new()),
            seed,
        }
    }

    /// A store seeded from a JSONL transcript file.
    ///
    /// # Errors
    /// [`SeedError::Io`] when the file cannot be opened or read.
    pub fn from_seed_file(path: impl AsRef<Path>) -> Result<Self, SeedError> {
        Ok(Self::with_seed(load_seed_messages(path)?))
    }

    /// Resolves a session: an existing id returns its conversation, a fresh
    /// or unknown id creates one seeded with the initial history.
    ///
    /// The returned id is the one the client should send on the next turn.
    pub async fn open(&self, id: Option<Uuid>) -> (Uuid, Arc<Mutex<Conversation>>) {
        if let Some(id) = id {
            if let Some(convo) = self.sessions.read().await.get(&id).cloned() {
                return (id, convo);
            }
        }

        let id = id.unwrap_or_else(Uuid::new_v4);
        let mut sessions = self.sessions.write().await;
        let convo = sessions
            .entry(id)
            .or_insert_with(|| {
                Arc::new(Mutex::new(Conversation::from_messages(self.seed.clone())))
            })
            .clone();
        (id, convo)
    }

    /// Number of live sessions.
    pub async fn len(&self) -> usize {
        self.sessions.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.sessions.read().await.is_empty()
    }
}

impl Default for SessionStore {
    fn default() -> Self {
        Self::new()
    }
}

/// Reads role-tagged messages from a JSONL transcript, one per line.
/// Unparseable lines are skipped with a warning.
///
/// # Errors
/// [`SeedError::Io`] when the file cannot be opened or a line cannot be read.
pub fn load_seed_messages(path: impl AsRef<Path>) -> Result<Vec<Message>, SeedError> {
    let path = path.as_ref();
    let file = File::open(path).map_err(|source| SeedError::Io {
        path: path.display().to_string(),
        source,
    })?;

    let mut messages = Vec::new();
    let mut skipped = 0usize;
    for (lineno, line) in BufReader::new(file).lines().enumerate() {
        let line = line.map_err(|source| SeedError::Io {
            path: path.display().to_string(),
            source,
        })?;
        if line.trim().is_empty() {
            continue;
        }
        match serde_json::from_str::<Message>(&line) {
            Ok(message) => messages.push(message),
            Err(e) => {
                skipped += 1;
                warn!(path = %path.display(), line = lineno + 1, error = %e, "skipping invalid seed line");
            }
        }
    }

    info!(
        path = %path.display(),
        loaded = messages.len(),
        skipped,
        "seed transcript loaded"
    );
    Ok(messages)
}

#[cfg(test)]
mod tests {
    use std::io::Write;

    use super::*;

    #[tokio::test]
    async fn open_without_id_creates_a_fresh_seeded_session() {
        let store = SessionStore::with_seed(vec![Message::system("campus assistant")]);
        let (id, convo) = store.open(None).await;

        assert_eq!(convo.lock().await.len(), 1);
        assert_eq!(store.len().await, 1);

        // Same id comes back to the same conversation.
        let (id2, convo2) = store.open(Some(id)).await;
        assert_eq!(id, id2);
        convo.lock().await.push(Message::user("hi"));
        assert_eq!(convo2.lock().await.len(), 2);
    }

    #[tokio::test]
    async fn sessions_are_isolated_from_each_other() {
        let store = SessionStore::new();
        let (_, a) = store.open(None).await;
        let (_, b) = store.open(None).await;

        a.lock().await.push(Message::user("only in a"));
        assert_eq!(a.lock().await.len(), 1);
        assert_eq!(b.lock().await.len(), 0);
        assert_eq!(store.len().await, 2);
    }

    #[test]
    fn seed_loader_skips_invalid_lines() {
        let mut file = tempfile();
        writeln!(file.1, r#"{{"role":"user","content":"What is LIU?"}}"#).unwrap();
        writeln!(file.1, "not json at all").unwrap();
        writeln!(file.1, r#"{{"role":"assistant","content":"A university."}}"#).unwrap();
        writeln!(file.1).unwrap();
        file.1.flush().unwrap();

        let messages = load_seed_messages(&file.0).unwrap();
        assert_eq!(messages.len(), 2);
        assert_eq!(messages[0], Message::user("What is LIU?"));
        assert_eq!(messages[1], Message::assistant("A university."));

        std::fs::remove_file(&file.0).ok();
    }

    #[test]
    fn missing_seed_file_is_an_error() {
        assert!(load_seed_messages("/definitely/not/here.jsonl").is_err());
    }

    fn tempfile() -> (std::path::PathBuf, File) {
        let path = std::env::temp_dir().join(format!("seed-{}.jsonl", Uuid::new_v4()));
        let file = File::create(&path).unwrap();
        (path, file)
    }
}

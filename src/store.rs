use std::fs;
use std::io::{self, Write};
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use tempfile::NamedTempFile;
use tracing::{debug, warn};

use crate::models::Note;

/// The note collection backed by a single JSON file.
///
/// Nothing is cached between calls: every operation reads the file again and
/// every mutation rewrites it completely.
#[derive(Clone, Debug)]
pub struct NoteStore {
    path: PathBuf,
}

impl NoteStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Read the collection from disk.
    ///
    /// A missing or unparseable file is replaced with an empty collection
    /// instead of being reported. Only a failure to write that replacement
    /// comes back as an error.
    pub fn load(&self) -> Result<Vec<Note>> {
        let raw = match fs::read_to_string(&self.path) {
            Ok(raw) => raw,
            Err(err) if err.kind() == io::ErrorKind::NotFound => {
                debug!(path = %self.path.display(), "creating notes file");
                return self.reset();
            }
            Err(err) => {
                warn!(
                    path = %self.path.display(),
                    error = %err,
                    "unreadable notes file, resetting"
                );
                return self.reset();
            }
        };

        match serde_json::from_str::<Vec<Note>>(&raw) {
            Ok(notes) => Ok(notes),
            Err(err) => {
                warn!(path = %self.path.display(), error = %err, "invalid notes file, resetting");
                self.reset()
            }
        }
    }

    fn reset(&self) -> Result<Vec<Note>> {
        self.save(&[])?;
        Ok(Vec::new())
    }

    /// Overwrite the file with `notes`.
    pub fn save(&self, notes: &[Note]) -> Result<()> {
        let dir = match self.path.parent() {
            Some(parent) if !parent.as_os_str().is_empty() => parent.to_path_buf(),
            _ => PathBuf::from("."),
        };
        fs::create_dir_all(&dir)
            .with_context(|| format!("Failed to create {}", dir.display()))?;

        let payload = serde_json::to_string(notes)?;
        let mut temp = NamedTempFile::new_in(&dir)
            .with_context(|| format!("Failed to stage write in {}", dir.display()))?;
        temp.write_all(payload.as_bytes())?;
        temp.flush()?;
        // Temp files start owner-only; keep whatever mode the notes file had.
        if let Ok(existing) = fs::metadata(&self.path) {
            if existing.is_file() {
                temp.as_file()
                    .set_permissions(existing.permissions())
                    .with_context(|| {
                        format!("Failed to copy permissions of {}", self.path.display())
                    })?;
            }
        }
        temp.persist(&self.path)
            .with_context(|| format!("Failed to write {}", self.path.display()))?;
        debug!(path = %self.path.display(), count = notes.len(), "saved notes");
        Ok(())
    }

    /// Append a note unless the title is already taken.
    pub fn add(&self, title: &str, body: &str) -> Result<bool> {
        let mut notes = self.load()?;
        if notes.iter().any(|note| note.title == title) {
            return Ok(false);
        }
        notes.push(Note::new(title, body));
        self.save(&notes)?;
        Ok(true)
    }

    pub fn get_all(&self) -> Result<Vec<Note>> {
        self.load()
    }

    pub fn read(&self, title: &str) -> Result<Option<Note>> {
        Ok(self.load()?.into_iter().find(|note| note.title == title))
    }

    /// Drop every note carrying `title`. Returns false, and leaves the file
    /// alone, when nothing matched.
    pub fn remove(&self, title: &str) -> Result<bool> {
        let notes = self.load()?;
        let before = notes.len();
        let kept: Vec<Note> = notes.into_iter().filter(|note| note.title != title).collect();
        if kept.len() == before {
            return Ok(false);
        }
        self.save(&kept)?;
        Ok(true)
    }

    pub fn remove_all(&self) -> Result<()> {
        self.save(&[])
    }

    /// Replace the body of the note titled `title`.
    pub fn edit(&self, title: &str, body: &str) -> Result<bool> {
        let mut notes = self.load()?;
        let Some(note) = notes.iter_mut().find(|note| note.title == title) else {
            return Ok(false);
        };
        note.body = body.to_string();
        self.save(&notes)?;
        Ok(true)
    }
}

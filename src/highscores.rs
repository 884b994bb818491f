use crate::consts;
use serde::{de::Deserializer, Deserialize, Serialize};
use std::path::PathBuf;
use thiserror::Error;

/// The best scores achieved so far, best first, at most
/// [`MAX_HIGH_SCORES`][consts::MAX_HIGH_SCORES] long
#[derive(Clone, Debug, Default, Eq, PartialEq, Serialize)]
#[serde(transparent)]
pub(crate) struct HighScoreTable(Vec<HighScoreEntry>);

impl HighScoreTable {
    pub(crate) fn entries(&self) -> &[HighScoreEntry] {
        &self.0
    }

    pub(crate) fn is_full(&self) -> bool {
        self.0.len() >= consts::MAX_HIGH_SCORES
    }

    /// Would `score` make it into the table?
    pub(crate) fn qualifies(&self, score: u32) -> bool {
        !self.is_full() || self.0.last().is_none_or(|e| score > e.score)
    }

    /// Insert a score below any existing entries with the same score.  Returns
    /// the index at which it was inserted, or `None` if it did not qualify.
    pub(crate) fn insert(&mut self, name: String, score: u32) -> Option<usize> {
        if !self.qualifies(score) {
            return None;
        }
        let pos = self
            .0
            .iter()
            .position(|e| score > e.score)
            .unwrap_or(self.0.len());
        self.0.insert(pos, HighScoreEntry { name, score });
        self.0.truncate(consts::MAX_HIGH_SCORES);
        Some(pos)
    }

    /// Restore the ordering & capacity invariants on data from outside
    fn normalized(mut entries: Vec<HighScoreEntry>) -> HighScoreTable {
        // Stable, so that ties keep their stored order
        entries.sort_by(|a, b| b.score.cmp(&a.score));
        entries.truncate(consts::MAX_HIGH_SCORES);
        HighScoreTable(entries)
    }
}

impl<'de> Deserialize<'de> for HighScoreTable {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        Vec::<HighScoreEntry>::deserialize(deserializer).map(HighScoreTable::normalized)
    }
}

#[derive(Clone, Debug, Deserialize, Eq, PartialEq, Serialize)]
pub(crate) struct HighScoreEntry {
    pub(crate) name: String,
    pub(crate) score: u32,
}

/// Somewhere to keep the high score table between runs
pub(crate) trait HighScoreStore {
    fn load(&self) -> Result<HighScoreTable, LoadError>;
    fn save(&self, table: &HighScoreTable) -> Result<(), SaveError>;
}

/// Disabled persistence: nothing is read, and saving does nothing
impl<S: HighScoreStore> HighScoreStore for Option<S> {
    fn load(&self) -> Result<HighScoreTable, LoadError> {
        match self {
            Some(store) => store.load(),
            None => Ok(HighScoreTable::default()),
        }
    }

    fn save(&self, table: &HighScoreTable) -> Result<(), SaveError> {
        match self {
            Some(store) => store.save(table),
            None => Ok(()),
        }
    }
}

/// High scores stored as a JSON array in a file
#[derive(Clone, Debug, Eq, PartialEq)]
pub(crate) struct FileStore {
    path: Option<PathBuf>,
}

impl FileStore {
    /// `path` is `None` when no location for the file could be determined, in
    /// which case every load & save fails.
    pub(crate) fn new(path: Option<PathBuf>) -> FileStore {
        FileStore { path }
    }

    pub(crate) fn default_path() -> Option<PathBuf> {
        dirs::data_local_dir().map(|p| p.join("gridsnake").join("highscores.json"))
    }
}

impl HighScoreStore for FileStore {
    fn load(&self) -> Result<HighScoreTable, LoadError> {
        let path = self.path.as_deref().ok_or_else(LoadError::no_path)?;
        let src = match fs_err::read(path) {
            Ok(src) => src,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                return Ok(HighScoreTable::default())
            }
            Err(e) => return Err(LoadError::read(e)),
        };
        serde_json::from_slice(&src).map_err(LoadError::deserialize)
    }

    fn save(&self, table: &HighScoreTable) -> Result<(), SaveError> {
        let path = self.path.as_deref().ok_or_else(SaveError::no_path)?;
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs_err::create_dir_all(parent).map_err(SaveError::mkdir)?;
        }
        let mut src = serde_json::to_string_pretty(table).map_err(SaveError::serialize)?;
        src.push('\n');
        fs_err::write(path, &src).map_err(SaveError::write)?;
        Ok(())
    }
}

#[derive(Debug, Error)]
#[error("Failed to save high scores to disk")]
pub(crate) struct SaveError(#[source] SaveErrorSource);

impl SaveError {
    fn no_path() -> Self {
        SaveError(SaveErrorSource::NoPath)
    }

    fn mkdir(e: std::io::Error) -> Self {
        SaveError(SaveErrorSource::Mkdir(e))
    }

    fn serialize(e: serde_json::Error) -> Self {
        SaveError(SaveErrorSource::Serialize(e))
    }

    fn write(e: std::io::Error) -> Self {
        SaveError(SaveErrorSource::Write(e))
    }
}

#[derive(Debug, Error)]
enum SaveErrorSource {
    #[error("failed to determine path to local data directory")]
    NoPath,
    #[error("failed to create parent directories")]
    Mkdir(#[source] std::io::Error),
    #[error("failed to serialize high scores")]
    Serialize(#[source] serde_json::Error),
    #[error("failed to write high scores to disk")]
    Write(#[source] std::io::Error),
}

#[derive(Debug, Error)]
#[error("Failed to read high scores from disk")]
pub(crate) struct LoadError(#[source] LoadErrorSource);

impl LoadError {
    fn no_path() -> Self {
        LoadError(LoadErrorSource::NoPath)
    }

    fn read(e: std::io::Error) -> Self {
        LoadError(LoadErrorSource::Read(e))
    }

    fn deserialize(e: serde_json::Error) -> Self {
        LoadError(LoadErrorSource::Deserialize(e))
    }
}

#[derive(Debug, Error)]
enum LoadErrorSource {
    #[error("failed to determine path to local data directory")]
    NoPath,
    #[error("failed to read high scores file")]
    Read(#[source] std::io::Error),
    #[error("failed to deserialize high scores")]
    Deserialize(#[source] serde_json::Error),
}

/**
 * Progress that outlives a single quiz: the set of questions already served in daily
 * mode and the preferred selection mode. Values are kept as JSON text in a small
 * key/value table in an SQLite file inside the application directory.
 */
use std::fs;
use std::path::{Path, PathBuf};

use rusqlite::{params, Connection, OptionalExtension};
use tracing::{info, warn};

use super::common::{Mode, QuizError, Result};
use super::repetition::SeenSet;


const KEY_SEEN: &str = "seen_daily_ids";
const KEY_MODE: &str = "mode";
const APP_DIR_NAME: &str = "prepquiz";
const STORE_FILE_NAME: &str = "progress.sqlite3";


pub struct Progress {
    connection: Connection,
}


impl Progress {
    /// Open the progress store in `app_dir`, creating it if necessary.
    pub fn open(app_dir: &Path) -> Result<Self> {
        let connection = Connection::open(app_dir.join(STORE_FILE_NAME))
            .map_err(QuizError::Sql)?;
        Progress::init(connection)
    }

    #[cfg(test)]
    pub fn open_in_memory() -> Result<Self> {
        Progress::init(Connection::open_in_memory().map_err(QuizError::Sql)?)
    }

    fn init(connection: Connection) -> Result<Self> {
        connection
            .execute(
                "
            CREATE TABLE IF NOT EXISTS kv(
              key TEXT NOT NULL PRIMARY KEY CHECK(key != ''),
              value TEXT NOT NULL,
              updated_at TEXT NOT NULL DEFAULT CURRENT_TIMESTAMP
            )
            ",
                [],
            )
            .map_err(QuizError::Sql)?;
        Ok(Progress { connection })
    }

    /// Return the IDs served in daily mode since the last reset. A stored value that
    /// cannot be read is treated as an empty set.
    pub fn load_seen(&self) -> Result<SeenSet> {
        match self.get(KEY_SEEN)? {
            Some(data) => match serde_json::from_str::<SeenSet>(&data) {
                Ok(seen) => Ok(seen),
                Err(e) => {
                    warn!(error = %e, "ignoring unreadable seen-question list");
                    Ok(SeenSet::new())
                }
            },
            None => Ok(SeenSet::new()),
        }
    }

    /// Replace the stored seen-set with `seen` in a single write.
    pub fn save_seen(&self, seen: &SeenSet) -> Result<()> {
        let data = serde_json::to_string(seen).map_err(QuizError::Json)?;
        self.set(KEY_SEEN, &data)?;
        info!(count = seen.len(), "saved seen-question list");
        Ok(())
    }

    pub fn reset_progress(&self) -> Result<()> {
        self.remove(KEY_SEEN)?;
        info!("cleared seen-question list");
        Ok(())
    }

    /// Return the saved mode, falling back to daily mode when none is saved.
    pub fn load_mode(&self) -> Result<Mode> {
        match self.get(KEY_MODE)? {
            Some(data) => match data.parse() {
                Ok(mode) => Ok(mode),
                Err(e) => {
                    warn!(error = %e, "ignoring unreadable mode preference");
                    Ok(Mode::default())
                }
            },
            None => Ok(Mode::default()),
        }
    }

    pub fn save_mode(&self, mode: Mode) -> Result<()> {
        self.set(KEY_MODE, mode.as_str())
    }

    fn get(&self, key: &str) -> Result<Option<String>> {
        self.connection
            .query_row("SELECT value FROM kv WHERE key = ?1", params![key], |row| row.get(0))
            .optional()
            .map_err(QuizError::Sql)
    }

    fn set(&self, key: &str, value: &str) -> Result<()> {
        self.connection
            .execute(
                "INSERT OR REPLACE INTO kv(key, value) VALUES (?1, ?2)",
                params![key, value],
            )
            .map_err(QuizError::Sql)?;
        Ok(())
    }

    fn remove(&self, key: &str) -> Result<()> {
        self.connection
            .execute("DELETE FROM kv WHERE key = ?1", params![key])
            .map_err(QuizError::Sql)?;
        Ok(())
    }
}


/// Return the path to the application directory, creating it if it doesn't exist.
pub fn require_app_dir_path(dir: Option<&Path>) -> Result<PathBuf> {
    let dirpath = match dir {
        Some(dir) => dir.to_path_buf(),
        None => {
            let mut dirpath = dirs::data_dir()
                .ok_or_else(|| QuizError::CannotMakeAppDir(PathBuf::from(APP_DIR_NAME)))?;
            dirpath.push(APP_DIR_NAME);
            dirpath
        }
    };

    if !dirpath.as_path().exists() {
        fs::create_dir_all(&dirpath).or(Err(QuizError::CannotMakeAppDir(dirpath.clone())))?;
    }
    Ok(dirpath)
}

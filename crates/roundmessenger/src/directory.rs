// SQLite-backed participant directory: maps teams and people to chat handles
// and private-link keys.

use std::sync::{Mutex, MutexGuard};

use rusqlite::{params, Connection, OptionalExtension};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum DirectoryError {
    #[error("failed to open participant directory at {path}: {source}")]
    Open {
        path: String,
        source: rusqlite::Error,
    },

    #[error("participant directory query failed: {0}")]
    Query(#[from] rusqlite::Error),

    #[error("participant directory lock poisoned")]
    Poisoned,
}

/// What the directory knows about one person. Either field may be empty:
/// an empty `discord_id` means the person has no linked chat account, an
/// empty `url_key` means they have no private URL.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Participant {
    pub discord_id: String,
    pub url_key: String,
}

/// Read-only lookups the draw resolver needs.
pub trait Directory {
    /// Every member of `team_id`, ordered by participant id.
    fn participants_from_team(&self, team_id: &str) -> Result<Vec<Participant>, DirectoryError>;

    /// One entry per id, aligned by index. Unknown ids yield an empty
    /// [`Participant`].
    fn participants_by_ids(&self, ids: &[String]) -> Result<Vec<Participant>, DirectoryError>;
}

/// A row to store with [`Database::upsert_participant`].
#[derive(Debug, Clone, Default)]
pub struct ParticipantRecord<'a> {
    pub id: &'a str,
    pub name: &'a str,
    /// `None` for adjudicators.
    pub team_id: Option<&'a str>,
    pub discord_id: &'a str,
    pub url_key: &'a str,
}

pub struct Database {
    conn: Mutex<Connection>,
}

impl Database {
    /// Open (or create) the directory at `path` and ensure the schema exists.
    /// Pass `":memory:"` for an ephemeral database (useful for tests).
    pub fn open(path: &str) -> Result<Self, DirectoryError> {
        let conn = Connection::open(path).map_err(|source| DirectoryError::Open {
            path: path.to_string(),
            source,
        })?;

        conn.execute_batch(
            "PRAGMA busy_timeout = 5000;

            CREATE TABLE IF NOT EXISTS participants (
                id         TEXT PRIMARY KEY,
                name       TEXT NOT NULL DEFAULT '',
                team_id    TEXT,
                discord_id TEXT NOT NULL DEFAULT '',
                url_key    TEXT NOT NULL DEFAULT ''
            );

            CREATE INDEX IF NOT EXISTS idx_participants_team_id ON participants(team_id);",
        )?;

        Ok(Self {
            conn: Mutex::new(conn),
        })
    }

    fn conn(&self) -> Result<MutexGuard<'_, Connection>, DirectoryError> {
        self.conn.lock().map_err(|_| DirectoryError::Poisoned)
    }

    /// Insert a participant, or replace the stored fields if the id exists.
    pub fn upsert_participant(&self, record: &ParticipantRecord<'_>) -> Result<(), DirectoryError> {
        let conn = self.conn()?;
        conn.execute(
            "INSERT INTO participants (id, name, team_id, discord_id, url_key)
             VALUES (?1, ?2, ?3, ?4, ?5)
             ON CONFLICT(id) DO UPDATE SET
                name       = excluded.name,
                team_id    = excluded.team_id,
                discord_id = excluded.discord_id,
                url_key    = excluded.url_key",
            params![
                record.id,
                record.name,
                record.team_id,
                record.discord_id,
                record.url_key,
            ],
        )?;
        Ok(())
    }

    pub fn participant_count(&self) -> Result<usize, DirectoryError> {
        let conn = self.conn()?;
        let count: i64 = conn.query_row("SELECT COUNT(*) FROM participants", [], |row| row.get(0))?;
        Ok(count as usize)
    }
}

impl Directory for Database {
    fn participants_from_team(&self, team_id: &str) -> Result<Vec<Participant>, DirectoryError> {
        let conn = self.conn()?;
        let mut stmt = conn.prepare(
            "SELECT discord_id, url_key FROM participants WHERE team_id = ?1 ORDER BY id",
        )?;
        let members = stmt
            .query_map(params![team_id], |row| {
                Ok(Participant {
                    discord_id: row.get(0)?,
                    url_key: row.get(1)?,
                })
            })?
            .collect::<Result<Vec<_>, _>>()?;
        Ok(members)
    }

    fn participants_by_ids(&self, ids: &[String]) -> Result<Vec<Participant>, DirectoryError> {
        let conn = self.conn()?;
        let mut stmt =
            conn.prepare("SELECT discord_id, url_key FROM participants WHERE id = ?1")?;

        let mut found = Vec::with_capacity(ids.len());
        for id in ids {
            let participant = stmt
                .query_row(params![id], |row| {
                    Ok(Participant {
                        discord_id: row.get(0)?,
                        url_key: row.get(1)?,
                    })
                })
                .optional()?
                .unwrap_or_default();
            found.push(participant);
        }
        Ok(found)
    }
}

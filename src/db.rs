//! Database operations for the vocabulary store.
//!
//! Mutations push a fresh snapshot of the whole collection (sorted
//! ascending by HSK level) to every live subscription, so list views
//! track the store without polling.

use crate::models::{EntryDraft, EntryId, VocabEntry};
use rusqlite::{params, Connection, Result as SqlResult};
use std::path::Path;
use std::sync::mpsc::{channel, Receiver, Sender};
use thiserror::Error;
use uuid::Uuid;

/// Maximum rows written in one transaction during bulk import.
/// Oversized imports commit in sequential chunks of this size.
pub const IMPORT_CHUNK_SIZE: usize = 490;

#[derive(Debug, Error)]
pub enum DbError {
    #[error("SQLite error: {0}")]
    Sqlite(#[from] rusqlite::Error),
    #[error("Not found: {0}")]
    NotFound(String),
}

pub type DbResult<T> = Result<T, DbError>;

/// Identifies a live collection subscription.
pub type SubscriptionId = u64;

/// Receiving end of a collection subscription. Snapshots arrive on
/// subscribe and after every mutation until `Database::unsubscribe`.
pub struct VocabSubscription {
    id: SubscriptionId,
    rx: Receiver<Vec<VocabEntry>>,
}

impl VocabSubscription {
    pub fn id(&self) -> SubscriptionId {
        self.id
    }

    /// Newest snapshot delivered since the last call, if any.
    pub fn latest(&self) -> Option<Vec<VocabEntry>> {
        let mut latest = None;
        while let Ok(snapshot) = self.rx.try_recv() {
            latest = Some(snapshot);
        }
        latest
    }
}

struct Subscriber {
    id: SubscriptionId,
    sender: Sender<Vec<VocabEntry>>,
}

pub struct Database {
    conn: Connection,
    subscribers: Vec<Subscriber>,
    next_subscription: SubscriptionId,
}

impl Database {
    pub fn open(path: &Path) -> DbResult<Self> {
        let conn = Connection::open(path)?;
        let db = Self {
            conn,
            subscribers: Vec::new(),
            next_subscription: 0,
        };
        db.init()?;
        Ok(db)
    }

    pub fn in_memory() -> DbResult<Self> {
        let conn = Connection::open_in_memory()?;
        let db = Self {
            conn,
            subscribers: Vec::new(),
            next_subscription: 0,
        };
        db.init()?;
        Ok(db)
    }

    fn init(&self) -> DbResult<()> {
        // `hsk` is left nullable: rows written by other tools may carry
        // missing or out-of-range levels, which reads map to 0 and the
        // level grouping drops.
        self.conn.execute_batch(
            r#"
            CREATE TABLE IF NOT EXISTS vocabulary (
                id TEXT PRIMARY KEY,
                hanzi TEXT NOT NULL,
                pinyin TEXT NOT NULL DEFAULT '',
                meaning TEXT NOT NULL,
                hsk INTEGER,
                created_at INTEGER NOT NULL
            );

            CREATE INDEX IF NOT EXISTS idx_vocabulary_hsk ON vocabulary(hsk);
            "#,
        )?;
        Ok(())
    }

    // Entry operations

    /// Persist a draft as a new entry with a fresh id and timestamp.
    pub fn create_entry(&mut self, draft: &EntryDraft) -> DbResult<VocabEntry> {
        let entry = VocabEntry::new(draft);
        insert_entry(&self.conn, &entry)?;
        self.notify_subscribers();
        Ok(entry)
    }

    /// Replace the mutable fields of an existing entry.
    pub fn update_entry(&mut self, id: EntryId, draft: &EntryDraft) -> DbResult<()> {
        let affected = self.conn.execute(
            "UPDATE vocabulary SET hanzi = ?2, pinyin = ?3, meaning = ?4, hsk = ?5 WHERE id = ?1",
            params![id.to_string(), draft.hanzi, draft.pinyin, draft.meaning, draft.hsk],
        )?;
        if affected == 0 {
            return Err(DbError::NotFound(id.to_string()));
        }
        self.notify_subscribers();
        Ok(())
    }

    /// Remove an entry. Deleting an id that is already gone is not an error.
    pub fn delete_entry(&mut self, id: EntryId) -> DbResult<()> {
        let affected = self
            .conn
            .execute("DELETE FROM vocabulary WHERE id = ?1", params![id.to_string()])?;
        if affected > 0 {
            self.notify_subscribers();
        }
        Ok(())
    }

    /// One-shot read of the whole collection, in no defined order.
    pub fn fetch_all(&self) -> DbResult<Vec<VocabEntry>> {
        let mut stmt = self.conn.prepare("SELECT * FROM vocabulary")?;
        let entries = stmt
            .query_map([], |row| parse_entry_row(row))?
            .filter_map(|row| row.transpose())
            .collect::<Result<Vec<_>, _>>()?;
        Ok(entries)
    }

    /// Register a subscription. The current snapshot is delivered
    /// immediately; further snapshots follow every mutation.
    pub fn subscribe_all(&mut self) -> DbResult<VocabSubscription> {
        let id = self.next_subscription;
        self.next_subscription += 1;

        let (tx, rx) = channel();
        let _ = tx.send(self.snapshot()?);
        self.subscribers.push(Subscriber { id, sender: tx });
        Ok(VocabSubscription { id, rx })
    }

    /// Stop snapshot delivery for a subscription.
    pub fn unsubscribe(&mut self, id: SubscriptionId) {
        self.subscribers.retain(|sub| sub.id != id);
    }

    /// Bulk-create pre-validated drafts, one atomic transaction per
    /// chunk of at most [`IMPORT_CHUNK_SIZE`] rows, chunks committed
    /// strictly in sequence. On failure, chunks already committed stay
    /// persisted. Returns the number of committed chunks.
    pub fn import_batch(&mut self, drafts: &[EntryDraft]) -> DbResult<usize> {
        let mut committed = 0;
        for chunk in drafts.chunks(IMPORT_CHUNK_SIZE) {
            let tx = self.conn.transaction()?;
            for draft in chunk {
                insert_entry(&tx, &VocabEntry::new(draft))?;
            }
            tx.commit()?;
            committed += 1;
            self.notify_subscribers();
        }
        Ok(committed)
    }

    fn snapshot(&self) -> DbResult<Vec<VocabEntry>> {
        let mut stmt = self.conn.prepare("SELECT * FROM vocabulary ORDER BY hsk")?;
        let entries = stmt
            .query_map([], |row| parse_entry_row(row))?
            .filter_map(|row| row.transpose())
            .collect::<Result<Vec<_>, _>>()?;
        Ok(entries)
    }

    fn notify_subscribers(&mut self) {
        if self.subscribers.is_empty() {
            return;
        }
        // A failed snapshot read stops delivery for this mutation only;
        // the write itself has already committed.
        let snapshot = match self.snapshot() {
            Ok(snapshot) => snapshot,
            Err(_) => return,
        };
        self.subscribers
            .retain(|sub| sub.sender.send(snapshot.clone()).is_ok());
    }
}

fn insert_entry(conn: &Connection, entry: &VocabEntry) -> SqlResult<usize> {
    conn.execute(
        "INSERT INTO vocabulary (id, hanzi, pinyin, meaning, hsk, created_at)
         VALUES (?1, ?2, ?3, ?4, ?5, ?6)",
        params![
            entry.id.to_string(),
            entry.hanzi,
            entry.pinyin,
            entry.meaning,
            entry.hsk,
            entry.created_at,
        ],
    )
}

fn parse_entry_row(row: &rusqlite::Row) -> SqlResult<Option<VocabEntry>> {
    let id_str: String = row.get("id")?;
    // A row whose id does not parse cannot be addressed by update or
    // delete, so it is skipped rather than listed under an aliased id.
    let Ok(id) = Uuid::parse_str(&id_str) else {
        return Ok(None);
    };
    Ok(Some(VocabEntry {
        id,
        hanzi: row.get("hanzi")?,
        pinyin: row.get("pinyin")?,
        meaning: row.get("meaning")?,
        hsk: row.get::<_, Option<i64>>("hsk")?.unwrap_or(0),
        created_at: row.get("created_at")?,
    }))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn draft(hanzi: &str, meaning: &str, hsk: i64) -> EntryDraft {
        EntryDraft::new(hanzi, "", meaning, hsk)
    }

    #[test]
    fn test_entry_crud() {
        let mut db = Database::in_memory().unwrap();
        let entry = db.create_entry(&draft("你好", "hello", 1)).unwrap();

        let all = db.fetch_all().unwrap();
        assert_eq!(all.len(), 1);
        assert_eq!(all[0].hanzi, "你好");

        db.update_entry(entry.id, &draft("你好", "hi", 2)).unwrap();
        let all = db.fetch_all().unwrap();
        assert_eq!(all[0].meaning, "hi");
        assert_eq!(all[0].hsk, 2);

        db.delete_entry(entry.id).unwrap();
        assert!(db.fetch_all().unwrap().is_empty());
        // Deleting again is a no-op.
        db.delete_entry(entry.id).unwrap();
    }

    #[test]
    fn test_update_unknown_id_errors() {
        let mut db = Database::in_memory().unwrap();
        let err = db.update_entry(Uuid::new_v4(), &draft("一", "one", 1));
        assert!(matches!(err, Err(DbError::NotFound(_))));
    }

    #[test]
    fn test_snapshots_sorted_by_level() {
        let mut db = Database::in_memory().unwrap();
        db.create_entry(&draft("三", "three", 3)).unwrap();
        db.create_entry(&draft("一", "one", 1)).unwrap();
        db.create_entry(&draft("二", "two", 2)).unwrap();

        let sub = db.subscribe_all().unwrap();
        let snapshot = sub.latest().unwrap();
        let levels: Vec<i64> = snapshot.iter().map(|e| e.hsk).collect();
        assert_eq!(levels, vec![1, 2, 3]);
    }

    #[test]
    fn test_subscription_tracks_mutations() {
        let mut db = Database::in_memory().unwrap();
        let sub = db.subscribe_all().unwrap();
        assert_eq!(sub.latest().unwrap().len(), 0);

        db.create_entry(&draft("一", "one", 1)).unwrap();
        db.create_entry(&draft("二", "two", 2)).unwrap();
        // Drains to the newest snapshot.
        assert_eq!(sub.latest().unwrap().len(), 2);
        assert!(sub.latest().is_none());

        db.unsubscribe(sub.id());
        db.create_entry(&draft("三", "three", 3)).unwrap();
        assert!(sub.latest().is_none());
    }

    #[test]
    fn test_import_batch_commits_in_chunks() {
        let mut db = Database::in_memory().unwrap();
        let drafts: Vec<EntryDraft> = (0..1000).map(|i| draft("字", &format!("word {i}"), 1)).collect();

        let chunks = db.import_batch(&drafts).unwrap();
        assert_eq!(chunks, 3);
        assert_eq!(db.fetch_all().unwrap().len(), 1000);
    }

    #[test]
    fn test_import_batch_empty() {
        let mut db = Database::in_memory().unwrap();
        assert_eq!(db.import_batch(&[]).unwrap(), 0);
    }

    #[test]
    fn test_null_level_rows_read_soft() {
        let mut db = Database::in_memory().unwrap();
        db.conn
            .execute(
                "INSERT INTO vocabulary (id, hanzi, pinyin, meaning, hsk, created_at)
                 VALUES (?1, '字', '', 'word', NULL, 0)",
                params![Uuid::new_v4().to_string()],
            )
            .unwrap();
        db.create_entry(&draft("一", "one", 1)).unwrap();

        let sub = db.subscribe_all().unwrap();
        let snapshot = sub.latest().unwrap();
        assert_eq!(snapshot.len(), 2);
        // NULL level reads as 0 and sorts first.
        assert_eq!(snapshot[0].hsk, 0);
    }

    #[test]
    fn test_unparseable_id_rows_skipped() {
        let mut db = Database::in_memory().unwrap();
        db.conn
            .execute(
                "INSERT INTO vocabulary (id, hanzi, pinyin, meaning, hsk, created_at)
                 VALUES ('not-a-uuid', '字', '', 'word', 1, 0)",
                [],
            )
            .unwrap();
        db.create_entry(&draft("一", "one", 1)).unwrap();

        let all = db.fetch_all().unwrap();
        assert_eq!(all.len(), 1);
        assert_eq!(all[0].hanzi, "一");
    }
}

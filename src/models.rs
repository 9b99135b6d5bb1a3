//! Data models for the HSK vocabulary trainer.

use chrono::Utc;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Unique identifier for a vocabulary entry.
pub type EntryId = Uuid;

/// Number of HSK levels (1 through 6).
pub const LEVEL_COUNT: usize = 6;

/// Clamp a level into the valid HSK range.
pub fn clamp_level(level: i64) -> i64 {
    level.clamp(1, LEVEL_COUNT as i64)
}

/// A stored vocabulary entry.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct VocabEntry {
    /// Unique identifier (storage-assigned, immutable).
    pub id: EntryId,
    /// Chinese characters.
    pub hanzi: String,
    /// Romanization; may be empty.
    pub pinyin: String,
    /// English meaning.
    pub meaning: String,
    /// HSK level. Writes normalize to 1-6; rows written by other tools
    /// may carry anything, which level grouping drops.
    pub hsk: i64,
    /// Creation time, milliseconds since the Unix epoch.
    pub created_at: i64,
}

impl VocabEntry {
    /// Create a new entry from a draft with a fresh id and timestamp.
    pub fn new(draft: &EntryDraft) -> Self {
        Self {
            id: Uuid::new_v4(),
            hanzi: draft.hanzi.clone(),
            pinyin: draft.pinyin.clone(),
            meaning: draft.meaning.clone(),
            hsk: draft.hsk,
            created_at: Utc::now().timestamp_millis(),
        }
    }

    /// Bucket index for this entry's level, if within the HSK range.
    pub fn level_index(&self) -> Option<usize> {
        if (1..=LEVEL_COUNT as i64).contains(&self.hsk) {
            Some((self.hsk - 1) as usize)
        } else {
            None
        }
    }
}

/// The mutable fields of an entry; input to create, update, and import.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EntryDraft {
    pub hanzi: String,
    pub pinyin: String,
    pub meaning: String,
    pub hsk: i64,
}

impl EntryDraft {
    /// Build a draft, trimming every text field and clamping the level.
    pub fn new(hanzi: &str, pinyin: &str, meaning: &str, hsk: i64) -> Self {
        Self {
            hanzi: hanzi.trim().to_string(),
            pinyin: pinyin.trim().to_string(),
            meaning: meaning.trim().to_string(),
            hsk: clamp_level(hsk),
        }
    }

    /// A draft is storable when both required text fields survive trimming.
    pub fn is_valid(&self) -> bool {
        !self.hanzi.is_empty() && !self.meaning.is_empty()
    }
}

/// Entries bucketed by HSK level for the home screen.
#[derive(Debug, Clone, Default)]
pub struct LevelGroups {
    buckets: [Vec<VocabEntry>; LEVEL_COUNT],
}

impl LevelGroups {
    /// Group entries by level. Entries outside 1-6 land in no bucket.
    pub fn from_entries(entries: Vec<VocabEntry>) -> Self {
        let mut groups = Self::default();
        for entry in entries {
            if let Some(idx) = entry.level_index() {
                groups.buckets[idx].push(entry);
            }
        }
        groups
    }

    /// Entries at the given level (1-6). Out-of-range levels are empty.
    pub fn at_level(&self, level: u8) -> &[VocabEntry] {
        (level as usize)
            .checked_sub(1)
            .and_then(|idx| self.buckets.get(idx))
            .map(Vec::as_slice)
            .unwrap_or(&[])
    }

    /// Word count at the given level.
    pub fn count(&self, level: u8) -> usize {
        self.at_level(level).len()
    }

    /// Word counts per level, index 0 = HSK 1.
    pub fn counts(&self) -> [usize; LEVEL_COUNT] {
        let mut counts = [0; LEVEL_COUNT];
        for (idx, bucket) in self.buckets.iter().enumerate() {
            counts[idx] = bucket.len();
        }
        counts
    }

    /// Copy out the word list for a study screen.
    pub fn study_set(&self, level: u8) -> StudySet {
        StudySet {
            level,
            entries: self.at_level(level).to_vec(),
        }
    }
}

/// The word list handed to the flashcard and quiz screens on navigation.
#[derive(Debug, Clone)]
pub struct StudySet {
    /// HSK level the entries were drawn from.
    pub level: u8,
    /// Entries at that level.
    pub entries: Vec<VocabEntry>,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn entry_at(hsk: i64) -> VocabEntry {
        VocabEntry {
            id: Uuid::new_v4(),
            hanzi: "你".to_string(),
            pinyin: String::new(),
            meaning: "you".to_string(),
            hsk,
            created_at: 0,
        }
    }

    #[test]
    fn test_draft_trims_and_clamps() {
        let draft = EntryDraft::new(" 你好 ", " nǐ hǎo ", " hello ", 9);
        assert_eq!(draft.hanzi, "你好");
        assert_eq!(draft.pinyin, "nǐ hǎo");
        assert_eq!(draft.meaning, "hello");
        assert_eq!(draft.hsk, 6);

        assert_eq!(EntryDraft::new("一", "", "one", 0).hsk, 1);
        assert_eq!(EntryDraft::new("一", "", "one", 3).hsk, 3);
    }

    #[test]
    fn test_draft_validity() {
        assert!(EntryDraft::new("你好", "", "hello", 1).is_valid());
        assert!(!EntryDraft::new("  ", "x", "hello", 1).is_valid());
        assert!(!EntryDraft::new("你好", "x", "", 1).is_valid());
    }

    #[test]
    fn test_entry_from_draft() {
        let draft = EntryDraft::new("谢谢", "xiè xie", "thanks", 2);
        let a = VocabEntry::new(&draft);
        let b = VocabEntry::new(&draft);
        assert_ne!(a.id, b.id);
        assert!(a.created_at > 0);
        assert_eq!(a.hanzi, "谢谢");
        assert_eq!(a.hsk, 2);
    }

    #[test]
    fn test_level_grouping_drops_out_of_range() {
        let entries: Vec<VocabEntry> = [1, 1, 2, 7, 1, 3, 2, 1, 0, 0]
            .into_iter()
            .map(entry_at)
            .collect();
        let groups = LevelGroups::from_entries(entries);
        assert_eq!(groups.counts(), [4, 2, 1, 0, 0, 0]);
    }

    #[test]
    fn test_at_level_out_of_range_is_empty() {
        let groups = LevelGroups::from_entries(vec![entry_at(1)]);
        assert_eq!(groups.count(1), 1);
        assert!(groups.at_level(0).is_empty());
        assert!(groups.at_level(7).is_empty());
    }

    #[test]
    fn test_study_set_copies_level_words() {
        let entries = vec![entry_at(2), entry_at(2), entry_at(3)];
        let groups = LevelGroups::from_entries(entries);
        let set = groups.study_set(2);
        assert_eq!(set.level, 2);
        assert_eq!(set.entries.len(), 2);
    }
}

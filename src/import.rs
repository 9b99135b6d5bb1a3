//! CSV import pipeline.
//!
//! Expects a header row naming `hanzi`, `pinyin`, `meaning`, `hsk` in
//! any column order. Rows missing `hanzi` or `meaning` are skipped
//! silently; a missing or non-numeric `hsk` imports as level 1. The
//! attempted count includes skipped rows, and the import report quotes
//! it as-is.

use crate::models::EntryDraft;
use std::fs::File;
use std::io::Read;
use std::path::{Path, PathBuf};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ImportError {
    #[error("failed to read {path}: {source}")]
    Read {
        path: PathBuf,
        source: std::io::Error,
    },
    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),
}

/// Outcome of parsing an import file.
#[derive(Debug)]
pub struct ParsedImport {
    /// Drafts that passed row validation.
    pub drafts: Vec<EntryDraft>,
    /// Data rows seen, including rows that were skipped.
    pub attempted: usize,
}

/// Parse an import file from disk.
pub fn parse_file(path: &Path) -> Result<ParsedImport, ImportError> {
    let file = File::open(path).map_err(|source| ImportError::Read {
        path: path.to_path_buf(),
        source,
    })?;
    parse_reader(file)
}

/// Parse CSV text directly.
pub fn parse_csv(text: &str) -> Result<ParsedImport, ImportError> {
    parse_reader(text.as_bytes())
}

fn parse_reader<R: Read>(input: R) -> Result<ParsedImport, ImportError> {
    let mut reader = csv::ReaderBuilder::new()
        .has_headers(true)
        .flexible(true)
        .from_reader(input);

    let headers = reader.headers()?.clone();
    let column = |name: &str| headers.iter().position(|h| h.trim() == name);
    let hanzi_col = column("hanzi");
    let pinyin_col = column("pinyin");
    let meaning_col = column("meaning");
    let hsk_col = column("hsk");

    let mut drafts = Vec::new();
    let mut attempted = 0;
    for result in reader.records() {
        let record = result?;
        attempted += 1;

        let field = |col: Option<usize>| col.and_then(|idx| record.get(idx)).unwrap_or("");
        let hsk = field(hsk_col).trim().parse::<i64>().unwrap_or(1);
        let draft = EntryDraft::new(
            field(hanzi_col),
            field(pinyin_col),
            field(meaning_col),
            hsk,
        );
        if draft.is_valid() {
            drafts.push(draft);
        }
    }

    Ok(ParsedImport { drafts, attempted })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_keeps_valid_rows() {
        let text = "hanzi,pinyin,meaning,hsk\n\
                    你好,nǐ hǎo,hello,1\n\
                    ,x,bad,2\n\
                    谢谢,xiè xie,thanks,\n";
        let parsed = parse_csv(text).unwrap();

        assert_eq!(parsed.attempted, 3);
        assert_eq!(parsed.drafts.len(), 2);
        assert_eq!(parsed.drafts[0].hanzi, "你好");
        assert_eq!(parsed.drafts[0].hsk, 1);
        assert_eq!(parsed.drafts[1].hanzi, "谢谢");
        // Missing level imports as 1.
        assert_eq!(parsed.drafts[1].hsk, 1);
    }

    #[test]
    fn test_column_order_is_free() {
        let text = "meaning,hsk,hanzi,pinyin\nhello,2,你好,nǐ hǎo\n";
        let parsed = parse_csv(text).unwrap();
        assert_eq!(parsed.drafts.len(), 1);

        let draft = &parsed.drafts[0];
        assert_eq!(draft.hanzi, "你好");
        assert_eq!(draft.pinyin, "nǐ hǎo");
        assert_eq!(draft.meaning, "hello");
        assert_eq!(draft.hsk, 2);
    }

    #[test]
    fn test_missing_pinyin_column() {
        let text = "hanzi,meaning,hsk\n你好,hello,1\n";
        let parsed = parse_csv(text).unwrap();
        assert_eq!(parsed.drafts.len(), 1);
        assert_eq!(parsed.drafts[0].pinyin, "");
    }

    #[test]
    fn test_level_normalization() {
        let text = "hanzi,pinyin,meaning,hsk\n\
                    一,yī,one,x\n\
                    二,èr,two,7\n\
                    三,sān,three, 3 \n";
        let parsed = parse_csv(text).unwrap();
        let levels: Vec<i64> = parsed.drafts.iter().map(|d| d.hsk).collect();
        assert_eq!(levels, vec![1, 6, 3]);
    }

    #[test]
    fn test_blank_lines_ignored() {
        let text = "hanzi,pinyin,meaning,hsk\n你好,nǐ hǎo,hello,1\n\n谢谢,xiè xie,thanks,2\n\n";
        let parsed = parse_csv(text).unwrap();
        assert_eq!(parsed.attempted, 2);
        assert_eq!(parsed.drafts.len(), 2);
    }

    #[test]
    fn test_short_rows_skipped() {
        let text = "hanzi,pinyin,meaning,hsk\n你,nǐ\n";
        let parsed = parse_csv(text).unwrap();
        assert_eq!(parsed.attempted, 1);
        assert!(parsed.drafts.is_empty());
    }

    #[test]
    fn test_whitespace_only_fields_skipped() {
        let text = "hanzi,pinyin,meaning,hsk\n   ,nǐ,you,1\n你,nǐ,   ,1\n";
        let parsed = parse_csv(text).unwrap();
        assert_eq!(parsed.attempted, 2);
        assert!(parsed.drafts.is_empty());
    }

    #[test]
    fn test_missing_file_errors() {
        let err = parse_file(Path::new("/nonexistent/words.csv")).unwrap_err();
        assert!(matches!(err, ImportError::Read { .. }));
    }
}

//! Parser for `git status --porcelain` (v1) records.
//!
//! Each record is `XY PATH`, or `XY SRC -> DST` for renames, where `X` is the
//! index column and `Y` the work-tree column. Only the index column matters
//! here: it describes what the pending commit will contain.

use tracing::{debug, instrument};

use crate::error::{Error, Result, StatusParseError};
use crate::types::ChangeEntry;

const RENAME_ARROW: &str = " -> ";

/// Parses a single porcelain record.
///
/// Returns `Ok(None)` for blank lines and for records whose index status is
/// not added, modified or renamed.
///
/// # Errors
///
/// Returns a [`StatusParseError`] when the record is malformed, when a rename
/// does not contain exactly one ` -> ` marker, or when a quoted path carries
/// escape sequences.
pub fn parse_line(line: &str) -> std::result::Result<Option<ChangeEntry>, StatusParseError> {
    if line.is_empty() {
        return Ok(None);
    }

    let bytes = line.as_bytes();
    if bytes.len() < 4 || bytes[2] != b' ' {
        return Err(StatusParseError::Malformed);
    }

    let rest = &line[3..];
    match bytes[0] {
        b'A' => normalize_path(rest).map(|path| Some(ChangeEntry::Added(path))),
        b'M' => normalize_path(rest).map(|path| Some(ChangeEntry::Modified(path))),
        b'R' => {
            let mut sides = rest.split(RENAME_ARROW);
            match (sides.next(), sides.next(), sides.next()) {
                (Some(_source), Some(destination), None) => {
                    normalize_path(destination).map(|path| Some(ChangeEntry::RenamedTo(path)))
                }
                _ => Err(StatusParseError::AmbiguousRename),
            }
        }
        _ => Ok(None),
    }
}

/// Parses the full porcelain output, keeping entries whose path ends in
/// `.{extension}`, in record order.
///
/// A record that cannot be parsed only fails the run when its raw text ends
/// in the extension (quoted or not); other unparseable records are skipped.
///
/// # Errors
///
/// Returns [`Error::StatusParse`] for the first matching record that cannot be parsed.
#[instrument(skip(output), fields(output_length = output.len()))]
pub fn parse_porcelain(output: &str, extension: &str) -> Result<Vec<ChangeEntry>> {
    let suffix = extension_suffix(extension);
    let mut entries = Vec::new();
    for line in output.lines() {
        match parse_line(line) {
            Ok(Some(entry)) => entries.push(entry),
            Ok(None) => debug!(line = %line, "Skipping status record"),
            Err(reason) if !raw_matches(line, &suffix) => {
                debug!(line = %line, reason = %reason, "Skipping unparseable record");
            }
            Err(reason) => {
                return Err(Error::StatusParse {
                    line: line.to_string(),
                    reason,
                })
            }
        }
    }
    let entries = filter_by_extension(entries, extension);
    debug!(entries = entries.len(), "Parsed status output");
    Ok(entries)
}

/// Keeps entries whose path ends in `.{extension}`, in their original order.
#[must_use]
pub fn filter_by_extension(entries: Vec<ChangeEntry>, extension: &str) -> Vec<ChangeEntry> {
    let suffix = extension_suffix(extension);
    entries
        .into_iter()
        .filter(|entry| entry.path().ends_with(&suffix))
        .collect()
}

fn extension_suffix(extension: &str) -> String {
    format!(".{}", extension.trim_start_matches('.'))
}

fn raw_matches(line: &str, suffix: &str) -> bool {
    let line = line.strip_suffix('"').unwrap_or(line);
    line.ends_with(suffix)
}

/// Strips one leading and one trailing double quote, each only if present.
///
/// Git quotes any path containing a `"`, so an unquoted path never starts or
/// ends with one. A quoted path containing a backslash was C-escaped by git
/// and is rejected rather than guessed at.
fn normalize_path(raw: &str) -> std::result::Result<String, StatusParseError> {
    let unquoted_start = raw.strip_prefix('"');
    let was_quoted = unquoted_start.is_some();
    let path = unquoted_start.unwrap_or(raw);
    let path = path.strip_suffix('"').unwrap_or(path);

    if was_quoted && path.contains('\\') {
        return Err(StatusParseError::EscapedPath);
    }
    Ok(path.to_string())
}

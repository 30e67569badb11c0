//! The managed block inside a shell startup file.
//!
//! A block is the text between [`INTEGRATION_START_MARKER`] and
//! [`INTEGRATION_END_MARKER`], markers included. Everything outside it belongs
//! to the user and is carried through byte for byte.
//!
//! Comparison with the canonical block happens after [`normalize`], so a file
//! saved with CRLF endings or trailing spaces does not count as a change.

use std::ops::Range;

use crate::constants::{INTEGRATION_END_MARKER, INTEGRATION_START_MARKER};
use crate::core::WrapkitError;

/// Canonical block content, stored without line-ending decisions.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IntegrationBlock {
    body: Vec<String>,
}

impl IntegrationBlock {
    /// Build a block from its body; markers are added on render.
    pub fn new(body: &str) -> Self {
        Self {
            body: normalize(body).lines().map(str::to_string).collect(),
        }
    }

    /// Full block text, markers included, with no trailing line ending.
    #[must_use]
    pub fn render(&self, line_ending: &str) -> String {
        std::iter::once(INTEGRATION_START_MARKER)
            .chain(self.body.iter().map(String::as_str))
            .chain(std::iter::once(INTEGRATION_END_MARKER))
            .collect::<Vec<_>>()
            .join(line_ending)
    }

    fn normalized(&self) -> String {
        normalize(&self.render("\n"))
    }
}

/// Unify line endings to `\n` and strip trailing whitespace per line and at the end.
#[must_use]
pub fn normalize(text: &str) -> String {
    text.replace("\r\n", "\n")
        .replace('\r', "\n")
        .lines()
        .map(str::trim_end)
        .collect::<Vec<_>>()
        .join("\n")
        .trim_end()
        .to_string()
}

/// `"\r\n"` when the content already uses CRLF, `"\n"` otherwise.
#[must_use]
pub fn detect_line_ending(content: &str) -> &'static str {
    if content.contains("\r\n") { "\r\n" } else { "\n" }
}

/// Byte range of the managed block, from the start of the start-marker line to
/// the end of the end marker.
pub fn find_block(content: &str) -> Result<Option<Range<usize>>, WrapkitError> {
    let Some(marker_pos) = content.find(INTEGRATION_START_MARKER) else {
        return Ok(None);
    };
    let start = content[..marker_pos].rfind('\n').map_or(0, |i| i + 1);

    let after = marker_pos + INTEGRATION_START_MARKER.len();
    let end = content[after..]
        .find(INTEGRATION_END_MARKER)
        .map(|i| after + i + INTEGRATION_END_MARKER.len())
        .ok_or_else(|| WrapkitError::ShellIntegrationFailed {
            reason: "start marker without matching end marker; fix the startup file by hand"
                .to_string(),
        })?;

    if content[end..].contains(INTEGRATION_START_MARKER) {
        return Err(WrapkitError::ShellIntegrationFailed {
            reason: "startup file contains more than one integration block".to_string(),
        });
    }

    Ok(Some(start..end))
}

/// Insert or refresh `block` in `existing`.
///
/// Returns `Ok(None)` when the file already carries an equivalent block, so
/// the caller can skip the write entirely.
pub fn upsert(
    existing: &str,
    block: &IntegrationBlock,
    line_ending: &str,
) -> Result<Option<String>, WrapkitError> {
    let rendered = block.render(line_ending);

    match find_block(existing)? {
        Some(range) => {
            if normalize(&existing[range.clone()]) == block.normalized() {
                return Ok(None);
            }
            let mut updated = String::with_capacity(existing.len() + rendered.len());
            updated.push_str(&existing[..range.start]);
            updated.push_str(&rendered);
            updated.push_str(&existing[range.end..]);
            Ok(Some(updated))
        }
        None => {
            let mut updated = existing.to_string();
            if !updated.is_empty() {
                if !updated.ends_with('\n') {
                    updated.push_str(line_ending);
                }
                updated.push_str(line_ending);
            }
            updated.push_str(&rendered);
            updated.push_str(line_ending);
            Ok(Some(updated))
        }
    }
}

/// Remove the managed block and the line ending that follows it.
pub fn remove(existing: &str) -> Result<Option<String>, WrapkitError> {
    let Some(range) = find_block(existing)? else {
        return Ok(None);
    };

    let rest = &existing[range.end..];
    let rest = rest.strip_prefix("\r\n").or_else(|| rest.strip_prefix('\n')).unwrap_or(rest);

    let mut head = existing[..range.start].to_string();
    // Drop the blank separator line added on insert
    if head.ends_with("\r\n\r\n") {
        head.truncate(head.len() - 2);
    } else if head.ends_with("\n\n") {
        head.truncate(head.len() - 1);
    }

    Ok(Some(head + rest))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn block() -> IntegrationBlock {
        IntegrationBlock::new("wrapkit() {\n    command wrapkit \"$@\"\n}")
    }

    #[test]
    fn test_normalize() {
        assert_eq!(normalize("a  \r\nb\t\rc\n\n  \n"), "a\nb\nc");
        assert_eq!(normalize(""), "");
    }

    #[test]
    fn test_detect_line_ending() {
        assert_eq!(detect_line_ending("a\r\nb"), "\r\n");
        assert_eq!(detect_line_ending("a\nb"), "\n");
        assert_eq!(detect_line_ending(""), "\n");
    }

    #[test]
    fn test_upsert_into_empty_file() {
        let updated = upsert("", &block(), "\n").unwrap().unwrap();
        assert!(updated.starts_with(INTEGRATION_START_MARKER));
        assert!(updated.ends_with(&format!("{INTEGRATION_END_MARKER}\n")));
    }

    #[test]
    fn test_upsert_appends_after_blank_line() {
        let updated = upsert("export PATH=$PATH:/opt/bin", &block(), "\n").unwrap().unwrap();
        assert!(updated.starts_with("export PATH=$PATH:/opt/bin\n\n# >>>"));

        let updated = upsert("alias ll='ls -l'\n", &block(), "\n").unwrap().unwrap();
        assert!(updated.starts_with("alias ll='ls -l'\n\n# >>>"));
    }

    #[test]
    fn test_upsert_is_idempotent() {
        let first = upsert("alias ll='ls -l'\n", &block(), "\n").unwrap().unwrap();
        assert!(upsert(&first, &block(), "\n").unwrap().is_none());
    }

    #[test]
    fn test_upsert_replaces_outdated_block_in_place() {
        let old = IntegrationBlock::new("wrapkit() { old; }");
        let before = "# top\n";
        let after = "\n# bottom\nexport EDITOR=vim\n";
        let content = format!("{before}{}{after}", old.render("\n"));

        let updated = upsert(&content, &block(), "\n").unwrap().unwrap();
        assert_eq!(updated, format!("{before}{}{after}", block().render("\n")));
    }

    #[test]
    fn test_crlf_block_matches_canonical() {
        let content = format!("# profile\r\n\r\n{}  \r\n", block().render("\r\n"));
        assert!(upsert(&content, &block(), "\r\n").unwrap().is_none());
    }

    #[test]
    fn test_unterminated_block_is_error() {
        let content = format!("{INTEGRATION_START_MARKER}\nwrapkit() {{ }}\n");
        assert!(upsert(&content, &block(), "\n").is_err());
    }

    #[test]
    fn test_duplicate_blocks_are_error() {
        let once = block().render("\n");
        let content = format!("{once}\n{once}\n");
        assert!(find_block(&content).is_err());
    }

    #[test]
    fn test_remove_restores_original() {
        let original = "alias ll='ls -l'\n";
        let with_block = upsert(original, &block(), "\n").unwrap().unwrap();
        assert_eq!(remove(&with_block).unwrap().unwrap(), original);
        assert!(remove(original).unwrap().is_none());
    }
}

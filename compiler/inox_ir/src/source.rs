//! Source files and `file:line:col` positions.

use std::fmt;

use crate::Span;

/// A named source text with precomputed line starts.
#[derive(Clone, Debug, Default)]
pub struct SourceFile {
    name: String,
    text: String,
    line_starts: Vec<u32>,
}

impl SourceFile {
    pub fn new(name: impl Into<String>, text: impl Into<String>) -> Self {
        let text = text.into();
        let mut line_starts = vec![0];
        for (i, b) in text.bytes().enumerate() {
            if b == b'\n' {
                line_starts.push(u32::try_from(i + 1).unwrap_or(u32::MAX));
            }
        }
        SourceFile {
            name: name.into(),
            text,
            line_starts,
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn text(&self) -> &str {
        &self.text
    }

    /// 1-based line and column (in characters) of a byte offset.
    pub fn line_col(&self, offset: u32) -> (u32, u32) {
        let line_index = match self.line_starts.binary_search(&offset) {
            Ok(i) => i,
            Err(i) => i.saturating_sub(1),
        };
        let line_start = self.line_starts.get(line_index).copied().unwrap_or(0);
        let column = self
            .text
            .get(line_start as usize..offset as usize)
            .map_or(offset - line_start, |s| {
                u32::try_from(s.chars().count()).unwrap_or(u32::MAX)
            });
        (u32::try_from(line_index).unwrap_or(u32::MAX) + 1, column + 1)
    }

    pub fn position(&self, span: Span) -> SourcePosition {
        let (line, column) = self.line_col(span.start);
        SourcePosition {
            source_name: self.name.clone(),
            line,
            column,
            span,
        }
    }
}

/// Resolved position of a node.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct SourcePosition {
    pub source_name: String,
    pub line: u32,
    pub column: u32,
    pub span: Span,
}

impl SourcePosition {
    /// Position of a node whose source file is unknown.
    pub fn unknown(span: Span) -> Self {
        SourcePosition {
            source_name: "?".to_string(),
            line: 1,
            column: 1,
            span,
        }
    }
}

impl fmt::Display for SourcePosition {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}:{}", self.source_name, self.line, self.column)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn line_col_counts_from_one() {
        let file = SourceFile::new("main.ix", "a = 1\nb = 2\n  c");
        assert_eq!(file.line_col(0), (1, 1));
        assert_eq!(file.line_col(6), (2, 1));
        assert_eq!(file.line_col(14), (3, 3));
    }

    #[test]
    fn columns_count_characters() {
        let file = SourceFile::new("u.ix", "é = 1");
        assert_eq!(file.line_col(3), (1, 3));
    }

    #[test]
    fn position_display() {
        let file = SourceFile::new("/app/main.ix", "x\n  assert false");
        let pos = file.position(Span::new(4, 16));
        assert_eq!(pos.to_string(), "/app/main.ix:2:3");
    }
}

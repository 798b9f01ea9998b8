//! Source spans shared by every node the ingester produces.

/// A 1-based line/column range, end-inclusive on the line, end-exclusive
/// on the column (matches how most editors report selections).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct SourceSpan {
    pub start_line: usize,
    pub start_col: usize,
    pub end_line: usize,
    pub end_col: usize,
}

impl SourceSpan {
    pub fn new(start_line: usize, start_col: usize, end_line: usize, end_col: usize) -> Self {
        Self {
            start_line,
            start_col,
            end_line,
            end_col,
        }
    }

    /// A span collapsed to a single point, used for synthetic nodes.
    pub fn point(line: usize, col: usize) -> Self {
        Self::new(line, col, line, col)
    }

    pub fn to(self, other: SourceSpan) -> SourceSpan {
        SourceSpan::new(self.start_line, self.start_col, other.end_line, other.end_col)
    }
}

/// A node paired with the span it occupies in the source file.
#[derive(Debug, Clone, PartialEq)]
pub struct Located<T> {
    pub node: T,
    pub span: SourceSpan,
}

impl<T> Located<T> {
    pub fn new(node: T, span: SourceSpan) -> Self {
        Self { node, span }
    }
}

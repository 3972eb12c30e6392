//! Comment storage and attachment.
//!
//! Comments are stored separately from the token stream. Each comment is
//! anchored to a token index: a comment following code on the same line is a
//! *trailing* comment of the most recent token, a comment on its own line is
//! a *leading* comment of the next token produced.

use smallvec::SmallVec;
use text_size::TextRange;

/// A single source comment, without the leading `;`.
#[derive(Debug, Clone)]
pub struct Comment {
    pub text: String,
    pub span: TextRange,
    pub kind: CommentKind,
    /// Index of the anchor token in the token stream.
    pub anchor: usize,
}

/// How a comment attaches to its anchor token.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CommentKind {
    /// Comment on a line of its own, ahead of the anchor.
    Leading,
    /// Comment at the end of a line, after the anchor.
    Trailing,
}

/// Storage for all comments in a source file.
#[derive(Debug, Clone, Default)]
pub struct CommentMap {
    comments: SmallVec<[Comment; 32]>,
}

impl CommentMap {
    pub fn new() -> Self {
        CommentMap {
            comments: SmallVec::new(),
        }
    }

    pub fn add_comment(&mut self, text: String, span: TextRange, kind: CommentKind, anchor: usize) {
        self.comments.push(Comment {
            text,
            span,
            kind,
            anchor,
        });
    }

    pub fn comments(&self) -> &[Comment] {
        &self.comments
    }

    /// Leading comments anchored to the given token index, in source order.
    pub fn leading_for(&self, anchor: usize) -> impl Iterator<Item = &Comment> {
        self.comments
            .iter()
            .filter(move |c| c.kind == CommentKind::Leading && c.anchor == anchor)
    }

    /// Trailing comments anchored to any token in the given index range.
    pub fn trailing_in(&self, tokens: std::ops::Range<usize>) -> impl Iterator<Item = &Comment> {
        self.comments
            .iter()
            .filter(move |c| c.kind == CommentKind::Trailing && tokens.contains(&c.anchor))
    }

    pub fn is_empty(&self) -> bool {
        self.comments.is_empty()
    }

    pub fn len(&self) -> usize {
        self.comments.len()
    }
}

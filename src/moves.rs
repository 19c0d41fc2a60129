use std::fmt;
use std::str::FromStr;
use std::sync::Arc;

use shakmaty::Square;
use thiserror::Error;

/// A move between two squares.
///
/// Promotion and disambiguation payloads are not modeled; the piece on
/// `from` is the one that moves.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Move {
    pub from: Square,
    pub to: Square,
}

impl Move {
    #[inline]
    pub const fn new(from: Square, to: Square) -> Self {
        Self { from, to }
    }
}

impl fmt::Display for Move {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}{}", self.from, self.to)
    }
}

/// Error when parsing coordinate move notation.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
#[error("invalid move notation: '{0}'")]
pub struct ParseMoveError(String);

impl FromStr for Move {
    type Err = ParseMoveError;

    /// Parses `"e2e4"` style notation. Only coordinate range is checked,
    /// never legality.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.trim();
        if s.len() != 4 || !s.is_ascii() {
            return Err(ParseMoveError(s.to_string()));
        }
        let from = s[..2].parse().map_err(|_| ParseMoveError(s.to_string()))?;
        let to = s[2..].parse().map_err(|_| ParseMoveError(s.to_string()))?;
        Ok(Self::new(from, to))
    }
}

#[derive(Debug)]
struct Entry {
    mv: Move,
    prev: Option<Arc<Entry>>,
}

/// Append-only move history of a single timeline.
///
/// Entries are shared between clones: forking a timeline copies one
/// pointer, and appending to either side allocates a single node without
/// touching the common prefix.
#[derive(Clone, Default)]
pub struct MoveRecord {
    head: Option<Arc<Entry>>,
    len: usize,
}

impl MoveRecord {
    #[inline]
    pub const fn new() -> Self {
        Self { head: None, len: 0 }
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.len
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    pub fn push(&mut self, mv: Move) {
        let prev = self.head.take();
        self.head = Some(Arc::new(Entry { mv, prev }));
        self.len += 1;
    }

    /// Most recent entry.
    #[inline]
    pub fn last(&self) -> Option<Move> {
        self.head.as_ref().map(|entry| entry.mv)
    }

    /// Entry at `index`, counting from the oldest move.
    pub fn get(&self, index: usize) -> Option<Move> {
        if index >= self.len {
            return None;
        }
        self.iter().nth(self.len - 1 - index)
    }

    /// The first `len` entries as a record sharing this one's storage.
    pub fn truncated(&self, len: usize) -> MoveRecord {
        if len >= self.len {
            return self.clone();
        }
        let mut head = self.head.as_ref();
        for _ in len..self.len {
            head = head.and_then(|entry| entry.prev.as_ref());
        }
        MoveRecord {
            head: head.cloned(),
            len,
        }
    }

    /// Iterate from the newest entry back to the oldest.
    pub fn iter(&self) -> Iter<'_> {
        Iter {
            next: self.head.as_deref(),
        }
    }

    /// Entries oldest first.
    pub fn to_vec(&self) -> Vec<Move> {
        let mut moves: Vec<Move> = self.iter().collect();
        moves.reverse();
        moves
    }
}

impl Drop for MoveRecord {
    fn drop(&mut self) {
        // Unlink uniquely owned nodes one at a time so long games don't
        // recurse through the whole chain.
        let mut next = self.head.take();
        while let Some(entry) = next {
            match Arc::try_unwrap(entry) {
                Ok(mut entry) => next = entry.prev.take(),
                Err(_) => break,
            }
        }
    }
}

impl PartialEq for MoveRecord {
    fn eq(&self, other: &Self) -> bool {
        if self.len != other.len {
            return false;
        }
        match (&self.head, &other.head) {
            (Some(a), Some(b)) if Arc::ptr_eq(a, b) => true,
            _ => self.iter().eq(other.iter()),
        }
    }
}

impl Eq for MoveRecord {}

impl fmt::Debug for MoveRecord {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let moves: Vec<String> = self.to_vec().iter().map(Move::to_string).collect();
        write!(f, "[{}]", moves.join(" "))
    }
}

impl FromIterator<Move> for MoveRecord {
    fn from_iter<I: IntoIterator<Item = Move>>(iter: I) -> Self {
        let mut record = MoveRecord::new();
        record.extend(iter);
        record
    }
}

impl Extend<Move> for MoveRecord {
    fn extend<I: IntoIterator<Item = Move>>(&mut self, iter: I) {
        for mv in iter {
            self.push(mv);
        }
    }
}

/// Newest-first iterator over a [`MoveRecord`].
pub struct Iter<'a> {
    next: Option<&'a Entry>,
}

impl Iterator for Iter<'_> {
    type Item = Move;

    fn next(&mut self) -> Option<Move> {
        let entry = self.next?;
        self.next = entry.prev.as_deref();
        Some(entry.mv)
    }
}

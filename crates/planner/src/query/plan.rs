use model::pagination::key::IndexKey;
use serde::{Deserialize, Serialize};
use std::ops::Bound;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Direction {
    Forward,
    Backward,
}

impl Direction {
    pub fn of(count: i32) -> Self {
        if count < 0 {
            Direction::Backward
        } else {
            Direction::Forward
        }
    }
}

/// "Up to `limit` matching entries inside `(lower, upper)`, walked in
/// `direction`." The store answers it with one ordered range scan.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CursorQuery {
    pub direction: Direction,
    pub lower: Bound<IndexKey>,
    pub upper: Bound<IndexKey>,
    pub limit: usize,
}

impl CursorQuery {
    pub fn range(&self) -> (Bound<&IndexKey>, Bound<&IndexKey>) {
        (self.lower.as_ref(), self.upper.as_ref())
    }
}

/// "How many matching entries lie below `upper`."
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CountQuery {
    pub upper: Bound<IndexKey>,
}

impl CountQuery {
    pub fn all() -> Self {
        CountQuery {
            upper: Bound::Unbounded,
        }
    }

    pub fn range(&self) -> (Bound<&IndexKey>, Bound<&IndexKey>) {
        (Bound::Unbounded, self.upper.as_ref())
    }
}

use crate::query::plan::{CursorQuery, Direction};
use model::pagination::key::IndexKey;
use std::ops::Bound;

#[derive(Debug, Clone)]
pub struct CursorQueryBuilder {
    ast: CursorQuery,
}

impl CursorQueryBuilder {
    pub fn new(direction: Direction) -> Self {
        Self {
            ast: CursorQuery {
                direction,
                lower: Bound::Unbounded,
                upper: Bound::Unbounded,
                limit: 0,
            },
        }
    }

    pub fn lower(mut self, bound: Bound<IndexKey>) -> Self {
        self.ast.lower = bound;
        self
    }

    pub fn upper(mut self, bound: Bound<IndexKey>) -> Self {
        self.ast.upper = bound;
        self
    }

    pub fn limit(mut self, limit: usize) -> Self {
        self.ast.limit = limit;
        self
    }

    pub fn build(self) -> CursorQuery {
        self.ast
    }
}

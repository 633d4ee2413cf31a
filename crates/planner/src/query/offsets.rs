use crate::query::{
    builder::cursor::CursorQueryBuilder,
    plan::{CountQuery, CursorQuery, Direction},
};
use model::pagination::{cursor::PositionToken, key::IndexKey};
use std::ops::Bound;
use tracing::trace;

/// How to obtain the position of a token.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PositionPlan {
    /// Before every record: position 0.
    Start,
    /// After every record: position `total + 1`.
    End,
    /// Count the matching entries the query selects.
    Count(CountQuery),
}

/// Keyset pagination over a composite index key.
///
/// A record token selects entries strictly beyond it. A boundary token is
/// inclusive going forward and exclusive going backward, so that a forward
/// step from a jump target starts with the first record of its bucket.
pub struct KeysetOffset;

impl KeysetOffset {
    /// Builds the range scan for a step. Returns `None` when nothing can lie
    /// beyond `token` in `direction`.
    pub fn step_query(
        token: &PositionToken,
        direction: Direction,
        limit: usize,
    ) -> Option<CursorQuery> {
        let builder = CursorQueryBuilder::new(direction).limit(limit);

        let builder = match (token, direction) {
            (PositionToken::BeforeFirst, Direction::Forward) => builder,
            (PositionToken::AfterLast, Direction::Backward) => builder,
            (PositionToken::BeforeFirst, Direction::Backward)
            | (PositionToken::AfterLast, Direction::Forward) => return None,
            (PositionToken::Record(key), Direction::Forward) => {
                builder.lower(Bound::Excluded(key.clone()))
            }
            (PositionToken::Record(key), Direction::Backward) => {
                builder.upper(Bound::Excluded(key.clone()))
            }
            (PositionToken::Boundary { probe, .. }, Direction::Forward) => {
                builder.lower(Bound::Included(probe.clone()))
            }
            (PositionToken::Boundary { probe, .. }, Direction::Backward) => {
                builder.upper(Bound::Excluded(probe.clone()))
            }
        };

        let query = builder.build();
        trace!(?direction, limit, "built step query");
        Some(query)
    }

    /// A record token counts itself; a boundary token counts only what
    /// precedes it.
    pub fn position_plan(token: &PositionToken) -> PositionPlan {
        match token {
            PositionToken::BeforeFirst => PositionPlan::Start,
            PositionToken::AfterLast => PositionPlan::End,
            PositionToken::Record(key) => PositionPlan::Count(CountQuery {
                upper: Bound::Included(key.clone()),
            }),
            PositionToken::Boundary { probe, .. } => PositionPlan::Count(CountQuery {
                upper: Bound::Excluded(probe.clone()),
            }),
        }
    }

    /// Token after a step visited `last` and found `found` of `requested`
    /// entries. A short page leaves the token on the sentinel it ran into.
    pub fn next_token(
        last: Option<IndexKey>,
        found: usize,
        requested: usize,
        direction: Direction,
    ) -> PositionToken {
        match last {
            Some(key) if found >= requested => PositionToken::Record(key),
            _ => match direction {
                Direction::Forward => PositionToken::AfterLast,
                Direction::Backward => PositionToken::BeforeFirst,
            },
        }
    }
}

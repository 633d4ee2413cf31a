//! Translation of a cursor position and a step request into bounded
//! range queries over an ordered index.

pub mod builder;
pub mod offsets;
pub mod plan;

pub use builder::cursor::CursorQueryBuilder;
pub use offsets::{KeysetOffset, PositionPlan};
pub use plan::{CountQuery, CursorQuery, Direction};

use crate::records::record::Record;
use bitflags::bitflags;
use serde::{Deserialize, Serialize};

bitflags! {
    /// What a step does: advance the position, return records, or both.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
    pub struct StepFlags: u8 {
        const MOVE = 0b0000_0001;
        const FETCH = 0b0000_0010;
    }
}

/// Where a step starts from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum StepOrigin {
    /// Before the first record.
    Begin,
    /// After the last record.
    End,
    /// The cursor's current position.
    Current,
}

/// A single step request. The sign of `count` is the direction and its
/// magnitude is the page size.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct StepRequest {
    pub flags: StepFlags,
    pub origin: StepOrigin,
    pub count: i32,
}

impl StepRequest {
    pub fn new(flags: StepFlags, origin: StepOrigin, count: i32) -> Self {
        StepRequest {
            flags,
            origin,
            count,
        }
    }

    pub fn is_forward(&self) -> bool {
        self.count >= 0
    }

    pub fn limit(&self) -> usize {
        self.count.unsigned_abs() as usize
    }
}

/// Outcome of a successful step. `records` is empty unless `FETCH` was
/// requested and is always in forward logical order. `moved` counts the
/// records traversed, whether or not they were fetched.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct StepResult {
    pub records: Vec<Record>,
    pub moved: i32,
}

impl StepResult {
    pub fn uids(&self) -> Vec<&str> {
        self.records.iter().map(|r| r.uid.as_str()).collect()
    }
}

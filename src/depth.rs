//! Recursion budget threaded through every walk over a schema.
//!
//! Schemas may be self-referential, so enumeration and validation consume one
//! unit per hop into a child (record field or list/tuple element) and stop
//! once the budget is spent. Exhaustion is a silent truncation, not an error.

use serde::{Deserialize, Serialize};

use crate::error::DepthError;

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "u8", into = "u8")]
pub struct Depth(u8);

impl Depth {
    pub const DEFAULT: Depth = Depth(5);
    /// Highest budget accepted by [`Depth::new`]; enumeration output grows
    /// exponentially with depth on wide schemas.
    pub const MAX: u8 = 10;

    pub fn new(budget: u8) -> Result<Self, DepthError> {
        if budget > Self::MAX {
            return Err(DepthError { requested: budget, max: Self::MAX });
        }
        Ok(Depth(budget))
    }

    pub fn exhausted(self) -> bool {
        self.0 == 0
    }

    pub fn decrement(self) -> Self {
        Depth(self.0.saturating_sub(1))
    }

    pub fn remaining(self) -> u8 {
        self.0
    }
}

impl Default for Depth {
    fn default() -> Self {
        Self::DEFAULT
    }
}

impl TryFrom<u8> for Depth {
    type Error = DepthError;
    fn try_from(budget: u8) -> Result<Self, Self::Error> {
        Depth::new(budget)
    }
}

impl From<Depth> for u8 {
    fn from(depth: Depth) -> u8 {
        depth.0
    }
}

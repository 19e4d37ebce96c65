//! Stage-filtered projection of the board

use super::registry::ALL_STAGES;
use super::Deal;
use serde::{Deserialize, Serialize};
use std::convert::Infallible;
use std::fmt;
use std::str::FromStr;

/// Which tab of the board is active
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum StageFilter {
    #[default]
    All,
    Stage(String),
}

impl StageFilter {
    pub fn matches(&self, deal: &Deal) -> bool {
        match self {
            StageFilter::All => true,
            StageFilter::Stage(stage) => deal.stage == *stage,
        }
    }
}

impl FromStr for StageFilter {
    type Err = Infallible;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(if s == ALL_STAGES {
            StageFilter::All
        } else {
            StageFilter::Stage(s.to_string())
        })
    }
}

impl fmt::Display for StageFilter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            StageFilter::All => f.write_str(ALL_STAGES),
            StageFilter::Stage(stage) => f.write_str(stage),
        }
    }
}

/// Deals visible under `active`, in their existing order.
///
/// Input is already stage-sorted, so nothing is re-sorted here.
pub fn filter<'a>(deals: &'a [Deal], active: &StageFilter) -> Vec<&'a Deal> {
    deals.iter().filter(|deal| active.matches(deal)).collect()
}

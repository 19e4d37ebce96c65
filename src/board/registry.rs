//! Fixed, ordered pipeline stages

use crate::error::{BoardError, BoardResult};
use serde::{Deserialize, Serialize};
use std::collections::HashSet;

/// Sort key given to stage names the registry does not know.
///
/// Unknown stages sort ahead of the first registered stage.
pub const UNKNOWN_STAGE_INDEX: isize = -1;

/// Stage name reserved for the "show everything" filter tab
pub const ALL_STAGES: &str = "All";

/// Presentation bucket for a stage
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StageCategory {
    /// Freshly sourced, not yet worked
    Intake,
    /// Moving through diligence
    Active,
    /// Closed with an investment
    Invested,
    /// On hold
    Parked,
    /// Passed on
    Rejected,
}

/// One named stage and its presentation bucket
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StageDefinition {
    pub name: String,
    #[serde(default = "default_category")]
    pub category: StageCategory,
}

fn default_category() -> StageCategory {
    StageCategory::Active
}

impl StageDefinition {
    pub fn new(name: impl Into<String>, category: StageCategory) -> Self {
        Self {
            name: name.into(),
            category,
        }
    }
}

/// The ordered list of stages a deal moves through.
///
/// Built once at startup and never mutated. Position in the list is the
/// sort key used by the deal store.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StageRegistry {
    stages: Vec<StageDefinition>,
}

impl StageRegistry {
    /// Build a registry, rejecting empty, duplicate or reserved names
    pub fn new(stages: Vec<StageDefinition>) -> BoardResult<Self> {
        if stages.is_empty() {
            return Err(BoardError::Config(
                "stage registry must contain at least one stage".to_string(),
            ));
        }

        let mut seen = HashSet::new();
        for stage in &stages {
            if stage.name.trim().is_empty() {
                return Err(BoardError::Config("stage names cannot be empty".to_string()));
            }
            if stage.name == ALL_STAGES {
                return Err(BoardError::Config(format!(
                    "stage name '{ALL_STAGES}' is reserved for the filter"
                )));
            }
            if !seen.insert(stage.name.as_str()) {
                return Err(BoardError::Config(format!(
                    "duplicate stage name '{}'",
                    stage.name
                )));
            }
        }

        Ok(Self { stages })
    }

    /// Build a registry from bare names, all in the `Active` bucket
    pub fn from_names<I, S>(names: I) -> BoardResult<Self>
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self::new(
            names
                .into_iter()
                .map(|name| StageDefinition::new(name, StageCategory::Active))
                .collect(),
        )
    }

    /// Position of a stage, if registered
    pub fn position(&self, stage: &str) -> Option<usize> {
        self.stages.iter().position(|s| s.name == stage)
    }

    /// Sort key for a stage: its position, or [`UNKNOWN_STAGE_INDEX`]
    pub fn index_of(&self, stage: &str) -> isize {
        self.position(stage)
            .map(|idx| idx as isize)
            .unwrap_or(UNKNOWN_STAGE_INDEX)
    }

    pub fn contains(&self, stage: &str) -> bool {
        self.position(stage).is_some()
    }

    pub fn category(&self, stage: &str) -> Option<StageCategory> {
        self.stages
            .iter()
            .find(|s| s.name == stage)
            .map(|s| s.category)
    }

    /// Stage new drafts land in
    pub fn first(&self) -> &str {
        // non-empty by construction
        &self.stages[0].name
    }

    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.stages.iter().map(|s| s.name.as_str())
    }

    pub fn definitions(&self) -> &[StageDefinition] {
        &self.stages
    }

    pub fn len(&self) -> usize {
        self.stages.len()
    }

    pub fn is_empty(&self) -> bool {
        self.stages.is_empty()
    }
}

/// The pipeline the board ships with
pub fn default_stages() -> Vec<StageDefinition> {
    use StageCategory::*;

    vec![
        StageDefinition::new("Inbound Deals", Intake),
        StageDefinition::new("Initial Call", Active),
        StageDefinition::new("Deal Review", Active),
        StageDefinition::new("Partner Call", Active),
        StageDefinition::new("Memo", Active),
        StageDefinition::new("IC", Active),
        StageDefinition::new("Investment", Invested),
        StageDefinition::new("Freezer", Parked),
        StageDefinition::new("Dumpster", Rejected),
    ]
}

impl Default for StageRegistry {
    fn default() -> Self {
        Self {
            stages: default_stages(),
        }
    }
}

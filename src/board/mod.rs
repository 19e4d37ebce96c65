//! The deal board: stage registry, records, the write-through store and
//! the filtered view over it.

pub mod deal;
pub mod filter;
pub mod registry;
pub mod store;

pub use deal::{Deal, DealDraft, DealField, DealId};
pub use filter::{filter, StageFilter};
pub use registry::{
    default_stages, StageCategory, StageDefinition, StageRegistry, ALL_STAGES,
    UNKNOWN_STAGE_INDEX,
};
pub use store::DealStore;

#[cfg(test)]
mod tests;

mod flatten;
mod normalize;
mod pipeline;
mod prune;
mod segments;

pub use flatten::{flatten_entities, FlatRecord, FlattenError, FlattenResult};
pub use normalize::{count_entities, normalize_entities};
pub use pipeline::{DocumentRefiner, RefineError, RefineResult, RefineStats};
pub use prune::{prune_fields, DEFAULT_PRUNED_FIELDS};
pub use segments::reconstruct_text;

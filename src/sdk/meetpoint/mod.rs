pub mod fallback;
pub mod optimizer;
pub mod pipeline;
pub mod result;
pub mod tasks;

pub use fallback::{geometric_median, MedianEstimate};
pub use optimizer::{candidate_costs, select_best, Criterion, Selection};
pub use pipeline::{MeetpointService, PipelineOptions, RefinedSearch, StageOutcome};
pub use result::{
    DestinationInput, MeetpointMetadata, MeetpointRequest, MeetpointResult, PersonInput,
    Provenance, ValidatedRequest,
};
pub use tasks::{MeetpointTasks, TaskStatus};

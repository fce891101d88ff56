pub mod sdk;

pub use sdk::config::{MeetpointConfig, ProviderCapability};
pub use sdk::geo::{GeoPoint, LatLng};
pub use sdk::meetpoint::{
    Criterion, DestinationInput, MeetpointMetadata, MeetpointRequest, MeetpointResult,
    MeetpointService, MeetpointTasks, PersonInput, PipelineOptions, Provenance, TaskStatus,
};
pub use sdk::people::load_people;
pub use sdk::routing::{MeetpointError, RoutingError, TransportProfile, TravelTimeMatrixClient};
pub use sdk::util::log::init_logging;

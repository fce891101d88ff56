pub mod batch;
pub mod client;
pub mod error;
pub mod matrix;
pub mod profile;
pub mod provider;
pub mod service;

pub use batch::{plan_batches, BatchLimits, BatchWindow};
pub use client::TravelTimeMatrixClient;
pub use error::{MeetpointError, RoutingError};
pub use matrix::{DurationMatrix, DurationVector, UNREACHABLE};
pub use profile::TransportProfile;
pub use provider::{DgisMatrixProvider, OrsMatrixProvider};
pub use service::MatrixProvider;

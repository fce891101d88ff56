pub mod area;
pub mod candidates;
pub mod point;

pub use area::{build_local_search_area, build_search_area, GridStep, LocalFrame, SearchArea};
pub use candidates::{generate_candidates, CandidateSet, MAX_MATRIX_CELLS};
pub use point::{GeoPoint, LatLng};

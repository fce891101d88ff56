pub mod dgis;
pub mod ors;
pub mod types;

pub use dgis::DgisMatrixProvider;
pub use ors::OrsMatrixProvider;

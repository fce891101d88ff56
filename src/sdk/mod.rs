pub mod config;
pub mod geo;
pub mod meetpoint;
pub mod people;
pub mod routing;
pub mod transit;
pub mod util;

pub mod atmosphere;
pub mod wind;

pub use atmosphere::{AtmoSample, Atmosphere};
pub use wind::{WindData, WindModel};

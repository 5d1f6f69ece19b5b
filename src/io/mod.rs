pub mod csv;
pub mod spec;
pub mod tables;

pub use spec::{load_spec, LoadedSpec};

pub mod aero;
pub mod body;
pub mod engine;
pub mod spec;

pub use aero::{AeroCoefRecord, AeroCoefficient, AeroTable};
pub use body::{Body, BodyDelta, Rocket};
pub use engine::{Engine, ThrustSample};
pub use spec::{BodySpecification, Parachute, ParachuteOpeningType, RocketSpecification, Transition};

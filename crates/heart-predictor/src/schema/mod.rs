//! Input schema for one classification request.
//!
//! Validation is explicit: one reader per field kind plus an aggregator that
//! reports every violation, never just the first.

pub mod record;
pub mod validation;

pub use record::{
    ChestPainType, ExerciseAngina, HeartRecord, RestingEcg, Sex, StSlope, FIELD_NAMES,
};
pub use validation::{Categorical, FieldError, Location, ValidationError, ViolationKind};

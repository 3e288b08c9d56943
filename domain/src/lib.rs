pub mod deadline;
mod domain;
mod error;
mod outcome;
mod utility;

pub use deadline::{Deadline, DeadlineClock, Progress};
pub use domain::{Domain, Issue, Offer, Value};
pub use error::DomainError;
pub use outcome::OutcomeSpace;
pub use utility::UtilityFunction;

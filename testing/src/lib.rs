pub mod driver;
pub mod record;
pub mod score;

pub use driver::{SessionDriver, SessionParty};
pub use record::{Exchange, NegotiationRecord, Outcome};
pub use score::ScoreTable;

mod engine;
pub mod factory;
mod history;

pub use engine::{Engine, EngineError, NegotiationParty};
pub use factory::{create_engine, EngineConfig};
pub use history::{SessionHistory, SessionSummary};

pub use entente_domain::{
    Deadline, DeadlineClock, Domain, DomainError, Issue, Offer, OutcomeSpace, Progress,
    UtilityFunction, Value,
};
pub use entente_strategy::{
    Action, BidPolicy, BidPolicyConfig, ConcessionConfig, ConcessionController, OpponentModel,
    Phase, PreferenceTracker, Stance,
};

pub mod acceptance;
pub mod bidding;
pub mod concession;
pub mod opponent;
pub mod preferences;

pub use acceptance::{accepts, Action};
pub use bidding::{BidPolicy, BidPolicyConfig, Phase, TurnContext};
pub use concession::{ConcessionConfig, ConcessionController, Stance};
pub use opponent::OpponentModel;
pub use preferences::{IssueWeight, PreferenceTracker};

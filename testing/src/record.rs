use std::fmt;

use entente_domain::Offer;
use entente_strategy::Action;

/// One action taken during the emulated session, with the offer's utility
/// as seen by both sides.
#[derive(Clone, Debug)]
pub struct Exchange {
    pub round: u64,
    pub actor: String,
    pub action: Action,
    pub utility_actor: f64,
    pub utility_peer: f64,
}

/// How the emulated session ended.
#[derive(Clone, Debug, PartialEq)]
pub enum Outcome {
    Agreement { offer: Offer, accepted_by: String },
    DeadlineReached,
}

/// Full traceback of an emulated negotiation, printable on test failure.
#[derive(Clone, Debug, Default)]
pub struct NegotiationRecord {
    pub exchanges: Vec<Exchange>,
}

impl NegotiationRecord {
    pub fn actions_of(&self, actor: &str) -> Vec<&Action> {
        self.exchanges
            .iter()
            .filter(|exchange| exchange.actor == actor)
            .map(|exchange| &exchange.action)
            .collect()
    }
}

impl fmt::Display for NegotiationRecord {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for exchange in &self.exchanges {
            let kind = match &exchange.action {
                Action::Accept(_) => "accepts",
                Action::Propose(_) => "proposes",
            };
            writeln!(
                f,
                "round {:>4} | {} {} [{}] (own {:.3}, peer {:.3})",
                exchange.round,
                exchange.actor,
                kind,
                exchange.action.offer(),
                exchange.utility_actor,
                exchange.utility_peer,
            )?;
        }
        Ok(())
    }
}

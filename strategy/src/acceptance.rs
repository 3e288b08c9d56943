use serde::{Deserialize, Serialize};

use entente_domain::Offer;

/// Per-turn decision handed back to the session driver. Accepting is
/// terminal; there is no explicit reject, non-acceptance is always
/// expressed as a counter-offer.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub enum Action {
    Accept(Offer),
    Propose(Offer),
}

impl Action {
    pub fn offer(&self) -> &Offer {
        match self {
            Action::Accept(offer) => offer,
            Action::Propose(offer) => offer,
        }
    }

    pub fn is_accept(&self) -> bool {
        matches!(self, Action::Accept(_))
    }
}

/// A received offer is accepted iff its self-utility clears the current
/// threshold. Strictly greater, so a threshold of 1.0 (full escalation)
/// only accepts the maximum-utility outcome when utilities stay below 1.
pub fn accepts(utility: f64, threshold: f64) -> bool {
    utility > threshold
}

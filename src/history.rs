use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// Read-only summaries of prior negotiation sessions, supplied by the
/// session driver. Consumed for informational logging only; the engine's
/// decisions never depend on them.
///
/// The `kind` tag mirrors the driver's persistent-store format. Anything
/// but the standard kind fails deserialization, which the factory treats
/// as fatal: the engine refuses to run on history it cannot interpret.
#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "kebab-case")]
pub enum SessionHistory {
    Standard { sessions: Vec<SessionSummary> },
}

/// Utilities offered by each party within one past session.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct SessionSummary {
    pub utilities: Vec<(String, f64)>,
}

impl SessionHistory {
    pub fn sessions(&self) -> &[SessionSummary] {
        match self {
            SessionHistory::Standard { sessions } => sessions,
        }
    }

    /// Maximum utility each party reached in the most recent session.
    pub fn last_session_maxima(&self) -> HashMap<String, f64> {
        let mut maxima = HashMap::new();
        if let Some(last) = self.sessions().last() {
            for (party, utility) in &last.utilities {
                let entry = maxima.entry(party.clone()).or_insert(*utility);
                if *utility > *entry {
                    *entry = *utility;
                }
            }
        }
        maxima
    }

    pub fn log_summary(&self) {
        log::info!("Loaded history of {} past session(s).", self.sessions().len());
        for (party, utility) in self.last_session_maxima() {
            log::info!("Last session: party [{}] reached utility {:.3}.", party, utility);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn standard_history_parses() {
        let raw = serde_json::json!({
            "kind": "standard",
            "sessions": [
                { "utilities": [["alice", 0.4], ["bob", 0.7]] },
                { "utilities": [["alice", 0.6], ["alice", 0.5], ["bob", 0.3]] },
            ],
        });
        let history: SessionHistory = serde_json::from_value(raw).unwrap();
        let maxima = history.last_session_maxima();
        assert_eq!(maxima["alice"], 0.6);
        assert_eq!(maxima["bob"], 0.3);
    }

    #[test]
    fn unknown_history_kind_is_rejected() {
        let raw = serde_json::json!({ "kind": "compressed", "sessions": [] });
        assert!(serde_json::from_value::<SessionHistory>(raw).is_err());
    }

    #[test]
    fn empty_history_has_no_maxima() {
        let history = SessionHistory::Standard { sessions: vec![] };
        assert!(history.last_session_maxima().is_empty());
    }
}

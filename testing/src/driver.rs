use entente::NegotiationParty;
use entente_domain::{Progress, UtilityFunction};
use entente_strategy::Action;

use crate::record::{Exchange, NegotiationRecord, Outcome};

/// One side of the emulated negotiation. The driver keeps the party's
/// utility function alongside to score the traceback from both viewpoints.
pub struct SessionParty {
    pub name: String,
    pub party: Box<dyn NegotiationParty>,
    pub utility: Box<dyn UtilityFunction>,
}

impl SessionParty {
    pub fn new(
        name: &str,
        party: Box<dyn NegotiationParty>,
        utility: Box<dyn UtilityFunction>,
    ) -> SessionParty {
        SessionParty {
            name: name.to_string(),
            party,
            utility,
        }
    }
}

/// Emulates a round-limited alternating-offers session between two
/// parties, delivering each proposal to the peer until one side accepts
/// or the deadline passes.
pub struct SessionDriver {
    parties: [SessionParty; 2],
    rounds: u64,
}

impl SessionDriver {
    pub fn new(first: SessionParty, second: SessionParty, rounds: u64) -> SessionDriver {
        let _ = env_logger::builder().is_test(true).try_init();
        SessionDriver {
            parties: [first, second],
            rounds,
        }
    }

    pub fn run(mut self) -> anyhow::Result<(Outcome, NegotiationRecord)> {
        let mut record = NegotiationRecord::default();

        for round in 1..=self.rounds {
            for mover in 0..2usize {
                let peer = 1 - mover;
                let action = self.parties[mover]
                    .party
                    .choose_action(Progress::Round(round))?;

                let offer = action.offer().clone();
                record.exchanges.push(Exchange {
                    round,
                    actor: self.parties[mover].name.clone(),
                    action: action.clone(),
                    utility_actor: self.parties[mover].utility.utility(&offer),
                    utility_peer: self.parties[peer].utility.utility(&offer),
                });

                match action {
                    Action::Accept(offer) => {
                        let accepted_by = self.parties[mover].name.clone();
                        log::info!("Session ended: [{}] accepted in round {}.", accepted_by, round);
                        for side in self.parties.iter_mut() {
                            side.party.on_session_end(Some(&offer));
                        }
                        return Ok((Outcome::Agreement { offer, accepted_by }, record));
                    }
                    Action::Propose(offer) => {
                        self.parties[peer].party.on_receive(offer)?;
                    }
                }
            }
        }

        log::info!("Session ended: deadline of {} rounds reached.", self.rounds);
        for side in self.parties.iter_mut() {
            side.party.on_session_end(None);
        }
        Ok((Outcome::DeadlineReached, record))
    }
}

use rand::rngs::StdRng;
use rand::SeedableRng;

use entente_domain::{
    Deadline, DeadlineClock, Domain, DomainError, Offer, OutcomeSpace, Progress, UtilityFunction,
};
use entente_strategy::{
    accepts, Action, BidPolicy, ConcessionController, OpponentModel, TurnContext,
};

use crate::factory::EngineConfig;
use crate::history::SessionHistory;

#[derive(thiserror::Error, Debug)]
pub enum EngineError {
    #[error("Invalid session history: {0}")]
    InvalidHistory(String),
    #[error(transparent)]
    Domain(#[from] DomainError),
}

/// Synchronous, turn-based negotiating party. The session driver delivers
/// at most one inbound offer and requests at most one outbound action per
/// round; a fresh instance must be created for every session.
pub trait NegotiationParty {
    /// Feed a counterpart offer into the party's models.
    fn on_receive(&mut self, offer: Offer) -> anyhow::Result<()>;

    /// The per-round decision: accept the latest received offer, or
    /// propose a counter-offer.
    fn choose_action(&mut self, progress: Progress) -> anyhow::Result<Action>;

    /// Static identification of the party.
    fn describe(&self) -> String;

    /// Called once when the session ends, with the agreed offer if any.
    fn on_session_end(&mut self, _agreement: Option<&Offer>) {}
}

/// The negotiation decision engine: frequency-based opponent modeling,
/// concession-rate adaptation and time-phased bid selection, composed
/// behind the `NegotiationParty` contract.
pub struct Engine {
    name: String,
    domain: Domain,
    utility: Box<dyn UtilityFunction>,
    outcomes: OutcomeSpace,
    clock: DeadlineClock,
    opponent: OpponentModel,
    concession: ConcessionController,
    policy: BidPolicy,
    last_received: Option<Offer>,
    best_received: Option<Offer>,
    rounds: u64,
    rng: StdRng,
}

impl Engine {
    pub fn new(
        domain: Domain,
        utility: Box<dyn UtilityFunction>,
        deadline: Deadline,
        config: EngineConfig,
        history: Option<serde_json::Value>,
    ) -> Result<Engine, EngineError> {
        if let Some(raw) = history {
            let history: SessionHistory = serde_json::from_value(raw)
                .map_err(|e| EngineError::InvalidHistory(e.to_string()))?;
            history.log_summary();
        }

        let outcomes = OutcomeSpace::new(&domain, utility.as_ref())?;

        let mut concession_config = config.concession.clone();
        concession_config.base_threshold =
            (concession_config.base_threshold * config.opening_markup).min(1.0);
        if concession_config.base_threshold >= 1.0 {
            log::warn!("Opening markup pushed the base threshold to 1.0. The engine will never accept.");
        }

        let policy = BidPolicy::new(config.bidding.clone(), outcomes.second_best_offer().clone());
        let rng = match config.seed {
            Some(seed) => StdRng::seed_from_u64(seed),
            None => StdRng::from_entropy(),
        };

        log::info!(
            "Engine [{}] starts a session: {} issues, {} outcomes, deadline {:?}, base threshold {:.3}.",
            config.name,
            domain.num_issues(),
            domain.num_outcomes(),
            deadline,
            concession_config.base_threshold
        );

        Ok(Engine {
            name: config.name,
            domain,
            utility,
            outcomes,
            clock: DeadlineClock::new(deadline),
            opponent: OpponentModel::new(),
            concession: ConcessionController::new(concession_config),
            policy,
            last_received: None,
            best_received: None,
            rounds: 0,
            rng,
        })
    }

    pub fn opponent(&self) -> &OpponentModel {
        &self.opponent
    }

    pub fn concession(&self) -> &ConcessionController {
        &self.concession
    }

    pub fn policy(&self) -> &BidPolicy {
        &self.policy
    }

    pub fn best_received(&self) -> Option<&Offer> {
        self.best_received.as_ref()
    }

    pub fn rounds_passed(&self) -> u64 {
        self.rounds
    }

    /// Utility with a guard against a misbehaving oracle: anything outside
    /// `[0, 1]` is clamped, non-finite values count as worthless.
    fn self_utility(&self, offer: &Offer) -> f64 {
        let utility = self.utility.utility(offer);
        if !utility.is_finite() {
            log::warn!("Utility oracle returned {} for offer [{}]. Treating as 0.", utility, offer);
            return 0.0;
        }
        utility.max(0.0).min(1.0)
    }

    fn propose(&mut self, status: f64) -> Offer {
        let ctx = TurnContext {
            domain: &self.domain,
            utility: self.utility.as_ref(),
            outcomes: &self.outcomes,
            opponent: &self.opponent,
            threshold: self.concession.threshold(),
            best_received: self.best_received.as_ref(),
            status,
            round: self.rounds,
        };
        self.policy.propose(&ctx, &mut self.rng)
    }
}

impl NegotiationParty for Engine {
    fn on_receive(&mut self, offer: Offer) -> anyhow::Result<()> {
        let utility = self.self_utility(&offer);

        let best_so_far = self
            .best_received
            .as_ref()
            .map(|best| self.self_utility(best))
            .unwrap_or(-1.0);
        if utility > best_so_far {
            self.best_received = Some(offer.clone());
        }

        self.opponent.observe(&offer);
        self.concession.observe(utility);
        self.last_received = Some(offer);
        Ok(())
    }

    fn choose_action(&mut self, progress: Progress) -> anyhow::Result<Action> {
        self.rounds += 1;
        let status = self.clock.status(progress).map_err(EngineError::from)?;
        let threshold = self.concession.threshold();

        let last = match self.last_received.clone() {
            // This party starts the negotiation; there is nothing to accept.
            None => return Ok(Action::Propose(self.propose(status))),
            Some(last) => last,
        };

        let utility = self.self_utility(&last);
        if accepts(utility, threshold) {
            log::info!(
                "Engine [{}] accepts offer [{}] with utility {:.3} above threshold {:.3}.",
                self.name,
                last,
                utility,
                threshold
            );
            return Ok(Action::Accept(last));
        }

        Ok(Action::Propose(self.propose(status)))
    }

    fn describe(&self) -> String {
        format!(
            "{}: boulware bidder with a frequency-based opponent model",
            self.name
        )
    }

    fn on_session_end(&mut self, agreement: Option<&Offer>) {
        match agreement {
            Some(offer) => log::info!(
                "Engine [{}] ended the session with agreement [{}] at utility {:.3}.",
                self.name,
                offer,
                self.self_utility(offer)
            ),
            None => log::info!(
                "Engine [{}] ended the session without agreement after {} rounds.",
                self.name,
                self.rounds
            ),
        }
    }
}

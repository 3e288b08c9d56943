use derive_more::Display;
use rand::Rng;
use serde::{Deserialize, Serialize};

use entente_domain::{Domain, Offer, OutcomeSpace, UtilityFunction};

use crate::opponent::OpponentModel;

/// Tunable knobs of the bid-selection policy. The defaults reproduce the
/// reference strategy, but none of the boundaries is a contract: later
/// phases only ever tighten or relax the bound monotonically toward
/// capitulation.
#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(default)]
pub struct BidPolicyConfig {
    /// End of the opening phase, as a fraction of the deadline.
    pub opening_phase: f64,
    /// Decoy bids are emitted while `round % period < decoy_window`.
    pub decoy_window: u64,
    /// No decoy bids beyond this fraction of the deadline.
    pub decoy_phase_end: f64,
    /// Decoy bids must reach this fraction of the current threshold.
    pub decoy_floor: f64,
    /// Risk constant and parameter; the decoy period is
    /// `risk_constant / 2^risk_parameter` rounds.
    pub risk_constant: f64,
    pub risk_parameter: u32,
    /// Fraction of the deadline after which the inner sampling bound
    /// tightens from `inner_early` to `inner_late`.
    pub almost_mad: f64,
    /// Inner-bound multipliers applied to the current threshold during
    /// random search.
    pub inner_early: f64,
    pub inner_late: f64,
    /// Every this many rounds the inner bound re-anchors to the full
    /// threshold.
    pub anchor_period: u64,
    /// Start of the endgame-modeling phase.
    pub endgame: f64,
    /// Start of the capitulation phase (propose the best received offer).
    pub capitulation: f64,
    /// Start of the final call (propose the counterpart's most preferred
    /// offer).
    pub final_call: f64,
    /// Hard cap on random sampling before the deterministic fallback.
    pub max_trials: u32,
    /// How many of the lowest-weight issues the opponent model may vary
    /// when building acceptable offers.
    pub acceptable_spread: usize,
    /// Minimum size of the acceptable-offer set before padding.
    pub acceptable_min: usize,
}

impl Default for BidPolicyConfig {
    fn default() -> BidPolicyConfig {
        BidPolicyConfig {
            opening_phase: 0.05,
            decoy_window: 10,
            decoy_phase_end: 0.9,
            decoy_floor: 0.8,
            risk_constant: 100_000.0,
            risk_parameter: 5,
            almost_mad: 0.5,
            inner_early: 0.95,
            inner_late: 0.975,
            anchor_period: 10,
            endgame: 0.95,
            capitulation: 0.995,
            final_call: 0.999,
            max_trials: 2000,
            acceptable_spread: 2,
            acceptable_min: 2,
        }
    }
}

impl BidPolicyConfig {
    /// Rounds between decoy windows: `risk_constant / 2^risk_parameter`.
    pub fn decoy_period(&self) -> u64 {
        let period = self.risk_constant / 2f64.powi(self.risk_parameter as i32);
        (period as u64).max(1)
    }
}

/// Behavioral mode of the policy for one turn.
#[derive(Clone, Copy, Debug, Display, PartialEq, Eq)]
pub enum Phase {
    #[display(fmt = "opening")]
    Opening,
    #[display(fmt = "decoy")]
    Decoy,
    #[display(fmt = "threshold-search")]
    ThresholdSearch,
    #[display(fmt = "endgame")]
    Endgame,
    #[display(fmt = "capitulation")]
    Capitulation,
    #[display(fmt = "final-call")]
    FinalCall,
}

/// Everything the policy needs to know about the current turn. Borrowed
/// from the engine; the policy itself only owns its phase state.
pub struct TurnContext<'a> {
    pub domain: &'a Domain,
    pub utility: &'a dyn UtilityFunction,
    pub outcomes: &'a OutcomeSpace,
    pub opponent: &'a OpponentModel,
    /// Current (possibly escalated) acceptance threshold.
    pub threshold: f64,
    pub best_received: Option<&'a Offer>,
    /// Elapsed fraction of the deadline, in `[0, 1]`.
    pub status: f64,
    /// Rounds passed from this agent's point of view.
    pub round: u64,
}

/// Phase-based bid selection. Always yields a complete, valid offer;
/// random sampling is bounded and every phase has a deterministic
/// fallback.
pub struct BidPolicy {
    config: BidPolicyConfig,
    second_best: Offer,
    endgame_cache: Option<Vec<Offer>>,
    shift: usize,
}

impl BidPolicy {
    /// `second_best` is the precomputed opening decoy: the best offer whose
    /// utility stays strictly below the true maximum.
    pub fn new(config: BidPolicyConfig, second_best: Offer) -> BidPolicy {
        BidPolicy {
            config,
            second_best,
            endgame_cache: None,
            shift: 0,
        }
    }

    pub fn config(&self) -> &BidPolicyConfig {
        &self.config
    }

    /// Phase for the given normalized status and round counter.
    pub fn phase(&self, status: f64, round: u64) -> Phase {
        let config = &self.config;
        if status <= config.opening_phase {
            Phase::Opening
        } else if round % config.decoy_period() < config.decoy_window
            && status <= config.decoy_phase_end
        {
            Phase::Decoy
        } else if status > config.final_call {
            Phase::FinalCall
        } else if status > config.capitulation {
            Phase::Capitulation
        } else if status > config.endgame {
            Phase::Endgame
        } else {
            Phase::ThresholdSearch
        }
    }

    /// Pick the offer to propose this turn.
    pub fn propose<R: Rng + ?Sized>(&mut self, ctx: &TurnContext<'_>, rng: &mut R) -> Offer {
        let phase = self.phase(ctx.status, ctx.round);
        log::debug!(
            "Round {} (status {:.3}): bidding in {} phase.",
            ctx.round,
            ctx.status,
            phase
        );

        match phase {
            Phase::Opening => self.second_best.clone(),
            Phase::Decoy => self.decoy_bid(ctx, rng),
            Phase::ThresholdSearch => self.threshold_search(ctx, rng),
            Phase::Endgame => self.endgame_bid(ctx),
            Phase::Capitulation => self.best_received_or_max(ctx),
            Phase::FinalCall => self.final_call_bid(ctx),
        }
    }

    /// Random offer above a loose floor, to obscure this agent's own
    /// preferences from the counterpart's modeling. The floor follows the
    /// escalated threshold, so even decoys get pricier against a firm
    /// counterpart.
    fn decoy_bid<R: Rng + ?Sized>(&self, ctx: &TurnContext<'_>, rng: &mut R) -> Offer {
        let floor = ctx.threshold * self.config.decoy_floor;
        sample(ctx, rng, self.config.max_trials, floor)
            .unwrap_or_else(|| ctx.domain.random_offer(rng))
    }

    /// Default phase: sample random offers against an inner bound that
    /// tightens over time and re-anchors to the full threshold
    /// periodically. Exhausting the trial budget falls back to the
    /// maximum-utility offer.
    fn threshold_search<R: Rng + ?Sized>(&self, ctx: &TurnContext<'_>, rng: &mut R) -> Offer {
        let config = &self.config;
        let bound = if ctx.round % config.anchor_period == 0 {
            ctx.threshold
        } else if ctx.status > config.almost_mad {
            ctx.threshold * config.inner_late
        } else {
            ctx.threshold * config.inner_early
        };

        match sample(ctx, rng, config.max_trials, bound) {
            Some(offer) => offer,
            None => {
                log::debug!(
                    "No sampled offer reached {:.3} within {} trials. Falling back to the maximum-utility offer.",
                    bound,
                    config.max_trials
                );
                ctx.outcomes.max_utility_offer().clone()
            }
        }
    }

    /// Cycle through the modeled acceptable offers, preferring the best
    /// received offer whenever it beats the current candidate.
    fn endgame_bid(&mut self, ctx: &TurnContext<'_>) -> Offer {
        if self.endgame_cache.is_none() {
            self.endgame_cache = Some(self.model_acceptable(ctx));
        }
        // The cache is filled just above and is never empty.
        let candidates = match self.endgame_cache.as_ref() {
            Some(candidates) if !candidates.is_empty() => candidates,
            _ => return self.best_received_or_max(ctx),
        };

        let candidate = candidates[self.shift % candidates.len()].clone();
        if let Some(best) = ctx.best_received {
            if ctx.utility.utility(best) > ctx.utility.utility(&candidate) {
                self.shift = 0;
                return best.clone();
            }
        }
        self.shift += 1;
        candidate
    }

    /// Acceptable offers sorted by this agent's own utility, best first.
    fn model_acceptable(&self, ctx: &TurnContext<'_>) -> Vec<Offer> {
        let fallback = self.best_received_or_max(ctx);
        let mut offers = ctx.opponent.acceptable_offers(
            ctx.domain,
            self.config.acceptable_spread,
            self.config.acceptable_min,
            &fallback,
        );
        offers.sort_by(|a, b| {
            ctx.utility
                .utility(b)
                .partial_cmp(&ctx.utility.utility(a))
                .unwrap_or(std::cmp::Ordering::Equal)
        });
        offers
    }

    /// Last attempt to secure agreement: the counterpart's single most
    /// preferred offer.
    fn final_call_bid(&self, ctx: &TurnContext<'_>) -> Offer {
        ctx.opponent
            .most_preferred_offer(ctx.domain)
            .unwrap_or_else(|| self.best_received_or_max(ctx))
    }

    fn best_received_or_max(&self, ctx: &TurnContext<'_>) -> Offer {
        ctx.best_received
            .cloned()
            .unwrap_or_else(|| ctx.outcomes.max_utility_offer().clone())
    }
}

/// Bounded lazy sampling: the first of at most `max_trials` random offers
/// whose self-utility reaches `bound`, if any.
fn sample<R: Rng + ?Sized>(
    ctx: &TurnContext<'_>,
    rng: &mut R,
    max_trials: u32,
    bound: f64,
) -> Option<Offer> {
    std::iter::from_fn(|| Some(ctx.domain.random_offer(rng)))
        .take(max_trials as usize)
        .find(|offer| ctx.utility.utility(offer) >= bound)
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::rngs::StdRng;
    use rand::SeedableRng;
    use test_case::test_case;

    fn domain() -> Domain {
        Domain::new(vec![
            ("price".into(), vec!["low".into(), "mid".into(), "high".into()]),
            ("delivery".into(), vec!["fast".into(), "slow".into()]),
        ])
        .unwrap()
    }

    fn scoring(offer: &Offer) -> f64 {
        let price = match offer.value(&"price".into()).map(|v| v.as_str()) {
            Some("high") => 0.6,
            Some("mid") => 0.3,
            _ => 0.0,
        };
        let delivery = match offer.value(&"delivery".into()).map(|v| v.as_str()) {
            Some("fast") => 0.4,
            _ => 0.1,
        };
        price + delivery
    }

    struct Fixture {
        domain: Domain,
        outcomes: OutcomeSpace,
        opponent: OpponentModel,
    }

    impl Fixture {
        fn new() -> Fixture {
            let domain = domain();
            let outcomes = OutcomeSpace::new(&domain, &scoring).unwrap();
            Fixture {
                domain,
                outcomes,
                opponent: OpponentModel::new(),
            }
        }

        fn ctx<'a>(&'a self, status: f64, round: u64) -> TurnContext<'a> {
            TurnContext {
                domain: &self.domain,
                utility: &scoring,
                outcomes: &self.outcomes,
                opponent: &self.opponent,
                threshold: 0.8,
                best_received: None,
                status,
                round,
            }
        }
    }

    fn policy(second_best: Offer) -> BidPolicy {
        BidPolicy::new(BidPolicyConfig::default(), second_best)
    }

    // The default decoy period is 100000 / 2^5 = 3125 rounds.
    #[test_case(0.01, 1, Phase::Opening; "session start")]
    #[test_case(0.2, 3126, Phase::Decoy; "decoy window reopens")]
    #[test_case(0.2, 500, Phase::ThresholdSearch; "between decoy windows")]
    #[test_case(0.92, 3126, Phase::ThresholdSearch; "no decoys late in the session")]
    #[test_case(0.96, 500, Phase::Endgame; "endgame modeling")]
    #[test_case(0.997, 500, Phase::Capitulation; "capitulation")]
    #[test_case(0.9995, 500, Phase::FinalCall; "final call")]
    fn phase_selection(status: f64, round: u64, expected: Phase) {
        let fixture = Fixture::new();
        let policy = policy(fixture.outcomes.second_best_offer().clone());
        assert_eq!(policy.phase(status, round), expected);
    }

    #[test]
    fn opening_proposes_the_second_best_offer() {
        let fixture = Fixture::new();
        let second_best = fixture.outcomes.second_best_offer().clone();
        let mut policy = policy(second_best.clone());
        let mut rng = StdRng::seed_from_u64(3);

        let offer = policy.propose(&fixture.ctx(0.01, 1), &mut rng);
        assert_eq!(offer, second_best);
        assert!(scoring(&offer) < scoring(fixture.outcomes.max_utility_offer()));
    }

    #[test]
    fn decoy_bids_clear_the_floor_when_possible() {
        let fixture = Fixture::new();
        let mut policy = policy(fixture.outcomes.second_best_offer().clone());
        let mut rng = StdRng::seed_from_u64(3);

        // Round 3126 falls into the second decoy window.
        let offer = policy.propose(&fixture.ctx(0.2, 3126), &mut rng);
        assert!(scoring(&offer) >= 0.8 * 0.8 - 1e-9);
    }

    #[test]
    fn decoy_floor_follows_the_escalated_threshold() {
        let fixture = Fixture::new();
        let mut policy = policy(fixture.outcomes.second_best_offer().clone());
        let mut rng = StdRng::seed_from_u64(3);

        // At full escalation the floor is 1.0 * 0.8, which only the best
        // outcome clears. A floor anchored to the unescalated base would
        // still admit the 0.7-utility offers.
        let mut ctx = fixture.ctx(0.2, 3126);
        ctx.threshold = 1.0;
        let offer = policy.propose(&ctx, &mut rng);
        assert_eq!(&offer, fixture.outcomes.max_utility_offer());
        assert!(scoring(&offer) >= 0.8);
    }

    #[test]
    fn search_falls_back_to_the_maximum_utility_offer() {
        let fixture = Fixture::new();
        let mut policy = policy(fixture.outcomes.second_best_offer().clone());
        let mut rng = StdRng::seed_from_u64(3);

        // An unreachable threshold exhausts the trial budget. Round 47 is
        // outside both the decoy window and the anchor period.
        let mut ctx = fixture.ctx(0.4, 47);
        ctx.threshold = 2.0;
        let offer = policy.propose(&ctx, &mut rng);
        assert_eq!(&offer, fixture.outcomes.max_utility_offer());
    }

    #[test]
    fn endgame_cycles_through_acceptable_offers() {
        let mut fixture = Fixture::new();
        let counterpart = Offer::from_pairs(
            &fixture.domain,
            vec![
                ("price".into(), "low".into()),
                ("delivery".into(), "slow".into()),
            ],
        )
        .unwrap();
        fixture.opponent.observe(&counterpart);

        let mut policy = policy(fixture.outcomes.second_best_offer().clone());
        let mut rng = StdRng::seed_from_u64(3);

        let expected = policy.model_acceptable(&fixture.ctx(0.96, 500));
        let first = policy.propose(&fixture.ctx(0.96, 500), &mut rng);
        let second = policy.propose(&fixture.ctx(0.96, 501), &mut rng);

        // The shift index advances through the cached set in utility order.
        assert_eq!(first, expected[0]);
        assert_eq!(second, expected[1]);
        assert_ne!(first, second);
    }

    #[test]
    fn endgame_prefers_a_better_received_offer() {
        let mut fixture = Fixture::new();
        let counterpart = Offer::from_pairs(
            &fixture.domain,
            vec![
                ("price".into(), "low".into()),
                ("delivery".into(), "slow".into()),
            ],
        )
        .unwrap();
        fixture.opponent.observe(&counterpart);

        let best = Offer::from_pairs(
            &fixture.domain,
            vec![
                ("price".into(), "high".into()),
                ("delivery".into(), "fast".into()),
            ],
        )
        .unwrap();

        let mut policy = policy(fixture.outcomes.second_best_offer().clone());
        let mut rng = StdRng::seed_from_u64(3);
        let mut ctx = fixture.ctx(0.96, 500);
        ctx.best_received = Some(&best);

        let offer = policy.propose(&ctx, &mut rng);
        assert_eq!(offer, best);
    }

    #[test]
    fn config_defaults_fill_missing_yaml_keys() {
        let config: BidPolicyConfig = serde_yaml::from_str("endgame: 0.9\n").unwrap();
        assert_eq!(config.endgame, 0.9);
        assert_eq!(config.max_trials, 2000);
        assert_eq!(config.decoy_period(), 3125);
    }

    #[test]
    fn final_call_proposes_the_counterparts_preference() {
        let mut fixture = Fixture::new();
        let counterpart = Offer::from_pairs(
            &fixture.domain,
            vec![
                ("price".into(), "low".into()),
                ("delivery".into(), "slow".into()),
            ],
        )
        .unwrap();
        fixture.opponent.observe(&counterpart);

        let mut policy = policy(fixture.outcomes.second_best_offer().clone());
        let mut rng = StdRng::seed_from_u64(3);
        let offer = policy.propose(&fixture.ctx(0.9995, 999), &mut rng);
        assert_eq!(offer, counterpart);
    }
}

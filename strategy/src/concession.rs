use serde::{Deserialize, Serialize};

/// Classification of the counterpart's negotiation stance, re-evaluated on
/// every received offer.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Stance {
    /// Counterpart concedes enough; no markup applied.
    Conceding,
    /// Counterpart appears unyielding; the level (1..=5) scales this
    /// agent's own acceptance threshold upward.
    Firm(u8),
}

#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(default)]
pub struct ConcessionConfig {
    /// This agent's base acceptance threshold.
    pub base_threshold: f64,
    /// Fraction of the base threshold marking the edge of conceding.
    pub conceding_edge: f64,
    /// Number of discrete escalation steps.
    pub max_firm_level: u8,
}

impl Default for ConcessionConfig {
    fn default() -> ConcessionConfig {
        ConcessionConfig {
            base_threshold: 0.8,
            conceding_edge: 0.8,
            max_firm_level: 5,
        }
    }
}

/// Watches the self-utility of consecutive counterpart offers and derives
/// a boulware level: a counterpart who keeps repeating offers that are good
/// for itself and bad for us gets answered with a raised bar instead of a
/// concession.
#[derive(Clone, Debug)]
pub struct ConcessionController {
    config: ConcessionConfig,
    previous: Option<f64>,
    current: Option<f64>,
    firm_level: u8,
}

impl ConcessionController {
    pub fn new(config: ConcessionConfig) -> ConcessionController {
        ConcessionController {
            config,
            previous: None,
            current: None,
            firm_level: 0,
        }
    }

    pub fn base_threshold(&self) -> f64 {
        self.config.base_threshold
    }

    /// Re-classify the counterpart from the latest received offer's
    /// self-utility, averaged with the previous one.
    pub fn observe(&mut self, utility: f64) {
        self.previous = self.current.replace(utility);

        let average = match (self.previous, self.current) {
            (Some(previous), Some(current)) => (previous + current) / 2.0,
            (None, Some(current)) => current,
            _ => return,
        };

        let cutoff = self.config.base_threshold * self.config.conceding_edge;
        self.firm_level = if average > cutoff {
            0
        } else {
            let level = ((cutoff - average) * 10.0).round();
            (level.max(0.0) as u8).min(self.config.max_firm_level)
        };
        log::debug!(
            "Counterpart stance: {:?} (avg utility {:.3}, cutoff {:.3})",
            self.stance(),
            average,
            cutoff
        );
    }

    pub fn stance(&self) -> Stance {
        match self.firm_level {
            0 => Stance::Conceding,
            level => Stance::Firm(level),
        }
    }

    pub fn firm_level(&self) -> u8 {
        self.firm_level
    }

    /// Current acceptance threshold: the base scaled up by the firm level.
    /// Full escalation demands this agent's maximum utility of exactly 1.0.
    pub fn threshold(&self) -> f64 {
        self.threshold_at(self.firm_level)
    }

    fn threshold_at(&self, level: u8) -> f64 {
        let base = self.config.base_threshold;
        let max = self.config.max_firm_level;
        if base >= 1.0 || level >= max {
            return 1.0;
        }
        // c is chosen so that level == max raises the threshold to 1.0.
        let c = base * max as f64 / (1.0 - base);
        (base * (1.0 + level as f64 / c)).min(1.0)
    }
}

use std::cmp::Ordering;

use crate::domain::{Domain, Offer};
use crate::error::DomainError;
use crate::utility::UtilityFunction;

/// Full enumeration of the domain's outcomes, sorted by descending
/// self-utility. Built once per session; supplies the deterministic
/// extreme offers and the precomputed second-best decoy.
///
/// Enumeration is exhaustive, so this is meant for the discrete domains
/// negotiation sessions actually use. A warning is logged for domains
/// large enough to make construction noticeably slow.
pub struct OutcomeSpace {
    ordered: Vec<(Offer, f64)>,
}

const LARGE_DOMAIN_WARNING: usize = 1 << 21;

impl OutcomeSpace {
    pub fn new(domain: &Domain, utility: &dyn UtilityFunction) -> Result<OutcomeSpace, DomainError> {
        if domain.num_outcomes() > LARGE_DOMAIN_WARNING {
            log::warn!(
                "Enumerating outcome space of {} offers. This may take a while.",
                domain.num_outcomes()
            );
        }

        let mut ordered: Vec<(Offer, f64)> = enumerate(domain)?
            .into_iter()
            .map(|offer| {
                let value = utility.utility(&offer);
                (offer, value)
            })
            .collect();

        // Stable sort keeps enumeration order among equal utilities,
        // so results are deterministic for a fixed utility function.
        ordered.sort_by(|(_, a), (_, b)| b.partial_cmp(a).unwrap_or(Ordering::Equal));

        Ok(OutcomeSpace { ordered })
    }

    pub fn len(&self) -> usize {
        self.ordered.len()
    }

    pub fn is_empty(&self) -> bool {
        self.ordered.is_empty()
    }

    pub fn max_utility_offer(&self) -> &Offer {
        &self.ordered[0].0
    }

    pub fn min_utility_offer(&self) -> &Offer {
        &self.ordered[self.ordered.len() - 1].0
    }

    /// Best offer whose utility is strictly below the maximum. Falls back
    /// to the maximum when the utility function is constant over the domain.
    pub fn second_best_offer(&self) -> &Offer {
        let max = self.ordered[0].1;
        self.ordered
            .iter()
            .find(|(_, utility)| *utility < max)
            .map(|(offer, _)| offer)
            .unwrap_or_else(|| self.max_utility_offer())
    }

    /// Offers in descending utility order.
    pub fn iter(&self) -> impl Iterator<Item = (&Offer, f64)> {
        self.ordered.iter().map(|(offer, utility)| (offer, *utility))
    }
}

fn enumerate(domain: &Domain) -> Result<Vec<Offer>, DomainError> {
    let issues: Vec<_> = domain.issues().cloned().collect();
    let mut values = Vec::with_capacity(issues.len());
    for issue in &issues {
        values.push(domain.values(issue)?.to_vec());
    }

    let mut offers = Vec::with_capacity(domain.num_outcomes());
    let mut indices = vec![0usize; issues.len()];
    loop {
        let pairs = issues
            .iter()
            .enumerate()
            .map(|(slot, issue)| (issue.clone(), values[slot][indices[slot]].clone()))
            .collect();
        offers.push(Offer::new(domain, pairs)?);

        // Odometer increment over value indices.
        let mut cursor = issues.len();
        loop {
            if cursor == 0 {
                return Ok(offers);
            }
            cursor -= 1;
            indices[cursor] += 1;
            if indices[cursor] < values[cursor].len() {
                break;
            }
            indices[cursor] = 0;
        }
    }
}

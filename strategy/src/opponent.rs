use entente_domain::{Domain, Offer};

use crate::preferences::PreferenceTracker;

/// Frequency-based model of the counterpart's hidden preferences.
///
/// Composes the `PreferenceTracker` with weight estimation to guess which
/// offers the counterpart would find desirable. All outputs are pure
/// functions of the accumulated records: querying never mutates the model.
#[derive(Clone, Debug, Default)]
pub struct OpponentModel {
    tracker: PreferenceTracker,
}

impl OpponentModel {
    pub fn new() -> OpponentModel {
        Default::default()
    }

    pub fn observe(&mut self, offer: &Offer) {
        self.tracker.record(offer);
    }

    pub fn tracker(&self) -> &PreferenceTracker {
        &self.tracker
    }

    /// Best guess at the counterpart's single most preferred offer: for
    /// every issue independently, the value it chose most often (first-seen
    /// order breaks ties). `None` until at least one offer was observed --
    /// callers substitute their own fallback then.
    pub fn most_preferred_offer(&self, domain: &Domain) -> Option<Offer> {
        if self.tracker.is_empty() {
            return None;
        }

        let mut pairs = Vec::with_capacity(domain.num_issues());
        for issue in domain.issues() {
            // Every received offer is complete, so after one observation
            // each issue has at least one record.
            let (value, _) = self.tracker.favorite(issue)?;
            pairs.push((issue.clone(), value.clone()));
        }

        match Offer::from_pairs(domain, pairs) {
            Ok(offer) => Some(offer),
            Err(e) => {
                log::warn!("Opponent model produced an invalid offer: {}", e);
                None
            }
        }
    }

    /// The most preferred offer plus single-issue variants over the
    /// `spread` lowest-weight issues, swapping only among values actually
    /// observed for that issue. Deduplicated; padded with `fallback` when
    /// shorter than `min_len`. Never empty.
    pub fn acceptable_offers(
        &self,
        domain: &Domain,
        spread: usize,
        min_len: usize,
        fallback: &Offer,
    ) -> Vec<Offer> {
        let mut offers: Vec<Offer> = vec![];

        if let Some(base) = self.most_preferred_offer(domain) {
            offers.push(base.clone());

            for estimate in self.tracker.weights_ascending().iter().take(spread) {
                for value in self.tracker.observed_values(&estimate.issue) {
                    let variant = match base.with_value(domain, &estimate.issue, value.clone()) {
                        Ok(variant) => variant,
                        Err(e) => {
                            log::warn!("Skipping invalid variant offer: {}", e);
                            continue;
                        }
                    };
                    if !offers.contains(&variant) {
                        offers.push(variant);
                    }
                }
            }
        }

        if offers.len() < min_len.max(1) && !offers.contains(fallback) {
            offers.push(fallback.clone());
        }
        offers
    }
}

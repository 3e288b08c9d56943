use std::cmp::Ordering;
use std::collections::HashMap;

use entente_domain::{Issue, Offer, Value};

#[derive(Clone, Copy, Debug)]
struct ValueStat {
    count: u32,
    first_seen: u64,
}

/// Append-only frequency store over (issue, value) choices observed in the
/// counterpart's offers. Counts only grow for the lifetime of one session;
/// all rankings downstream are recomputed from it on demand, never cached
/// in a mutable sorted structure.
#[derive(Clone, Debug, Default)]
pub struct PreferenceTracker {
    issues: HashMap<Issue, HashMap<Value, ValueStat>>,
    stamp: u64,
    observed: u64,
}

/// Normalized importance of one issue, derived from how consistently the
/// counterpart picked its single most-favored value.
#[derive(Clone, Debug, PartialEq)]
pub struct IssueWeight {
    pub issue: Issue,
    pub weight: f64,
}

impl PreferenceTracker {
    pub fn new() -> PreferenceTracker {
        Default::default()
    }

    /// Feed one counterpart offer into the per-(issue, value) counts.
    /// Creates records at count 1, increments existing ones. Repeated
    /// identical offers keep accumulating.
    pub fn record(&mut self, offer: &Offer) {
        for (issue, value) in offer.iter() {
            self.stamp += 1;
            let stamp = self.stamp;
            self.issues
                .entry(issue.clone())
                .or_default()
                .entry(value.clone())
                .and_modify(|stat| stat.count += 1)
                .or_insert(ValueStat {
                    count: 1,
                    first_seen: stamp,
                });
        }
        self.observed += 1;
    }

    /// Number of counterpart offers recorded so far.
    pub fn observed_offers(&self) -> u64 {
        self.observed
    }

    pub fn is_empty(&self) -> bool {
        self.observed == 0
    }

    pub fn count(&self, issue: &Issue, value: &Value) -> u32 {
        self.issues
            .get(issue)
            .and_then(|counts| counts.get(value))
            .map(|stat| stat.count)
            .unwrap_or(0)
    }

    /// Most-chosen value for the issue, ties broken by first observation.
    pub fn favorite(&self, issue: &Issue) -> Option<(&Value, u32)> {
        self.issues.get(issue)?.iter()
            .max_by(|(_, a), (_, b)| {
                a.count
                    .cmp(&b.count)
                    .then(b.first_seen.cmp(&a.first_seen))
            })
            .map(|(value, stat)| (value, stat.count))
    }

    /// All values ever observed for the issue, in first-seen order.
    pub fn observed_values(&self, issue: &Issue) -> Vec<&Value> {
        let mut values: Vec<_> = match self.issues.get(issue) {
            Some(counts) => counts.iter().collect(),
            None => return vec![],
        };
        values.sort_by_key(|(_, stat)| stat.first_seen);
        values.into_iter().map(|(value, _)| value).collect()
    }

    /// Issue weights normalized to sum 1, ranked ascending: the issues the
    /// counterpart shows least preference on come first, because those are
    /// the ones this agent can alter without hurting counterpart
    /// desirability. Issues never observed are excluded.
    pub fn weights_ascending(&self) -> Vec<IssueWeight> {
        let raw: Vec<(&Issue, u32)> = self
            .issues
            .iter()
            .filter_map(|(issue, _)| self.favorite(issue).map(|(_, count)| (issue, count)))
            .collect();

        let total: u32 = raw.iter().map(|(_, count)| count).sum();
        if total == 0 {
            return vec![];
        }

        let mut weights: Vec<IssueWeight> = raw
            .into_iter()
            .map(|(issue, count)| IssueWeight {
                issue: issue.clone(),
                weight: count as f64 / total as f64,
            })
            .collect();

        weights.sort_by(|a, b| {
            a.weight
                .partial_cmp(&b.weight)
                .unwrap_or(Ordering::Equal)
                .then_with(|| a.issue.cmp(&b.issue))
        });
        weights
    }

    /// Same weights ranked most-important-first.
    pub fn weights_descending(&self) -> Vec<IssueWeight> {
        let mut weights = self.weights_ascending();
        weights.reverse();
        weights
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use entente_domain::Domain;

    fn domain() -> Domain {
        Domain::new(vec![
            ("price".into(), vec!["low".into(), "mid".into(), "high".into()]),
            ("delivery".into(), vec!["fast".into(), "slow".into()]),
        ])
        .unwrap()
    }

    fn offer(domain: &Domain, price: &str, delivery: &str) -> Offer {
        Offer::from_pairs(
            domain,
            vec![
                ("price".into(), price.into()),
                ("delivery".into(), delivery.into()),
            ],
        )
        .unwrap()
    }

    #[test]
    fn counts_accumulate_over_repeated_offers() {
        let domain = domain();
        let mut tracker = PreferenceTracker::new();
        tracker.record(&offer(&domain, "low", "fast"));
        tracker.record(&offer(&domain, "low", "slow"));
        tracker.record(&offer(&domain, "low", "fast"));

        assert_eq!(tracker.count(&"price".into(), &"low".into()), 3);
        assert_eq!(tracker.count(&"delivery".into(), &"fast".into()), 2);
        assert_eq!(tracker.count(&"delivery".into(), &"slow".into()), 1);
        assert_eq!(tracker.observed_offers(), 3);
    }

    #[test]
    fn favorite_breaks_ties_by_first_seen() {
        let domain = domain();
        let mut tracker = PreferenceTracker::new();
        tracker.record(&offer(&domain, "mid", "slow"));
        tracker.record(&offer(&domain, "low", "slow"));

        // "mid" and "low" both have count 1. "mid" was seen first.
        let (value, count) = tracker.favorite(&"price".into()).unwrap();
        assert_eq!(value.as_str(), "mid");
        assert_eq!(count, 1);
    }

    #[test]
    fn observed_values_keep_first_seen_order() {
        let domain = domain();
        let mut tracker = PreferenceTracker::new();
        tracker.record(&offer(&domain, "high", "fast"));
        tracker.record(&offer(&domain, "low", "fast"));
        tracker.record(&offer(&domain, "mid", "fast"));

        let values: Vec<&str> = tracker
            .observed_values(&"price".into())
            .into_iter()
            .map(Value::as_str)
            .collect();
        assert_eq!(values, vec!["high", "low", "mid"]);
    }

    #[test]
    fn weights_normalize_to_one() {
        let domain = domain();
        let mut tracker = PreferenceTracker::new();
        tracker.record(&offer(&domain, "low", "fast"));
        tracker.record(&offer(&domain, "low", "fast"));
        tracker.record(&offer(&domain, "low", "slow"));

        let weights = tracker.weights_ascending();
        let total: f64 = weights.iter().map(|weight| weight.weight).sum();
        assert!((total - 1.0).abs() < 1e-9);

        // price was always "low" (count 3), delivery split 2/1.
        assert_eq!(weights[0].issue, Issue::new("delivery"));
        assert_eq!(weights[1].issue, Issue::new("price"));
        assert!(weights[0].weight < weights[1].weight);
    }

    #[test]
    fn unobserved_state_yields_no_weights() {
        let tracker = PreferenceTracker::new();
        assert!(tracker.weights_ascending().is_empty());
        assert!(tracker.favorite(&"price".into()).is_none());
    }

    #[test]
    fn insertion_order_does_not_change_counts() {
        let domain = domain();
        let mut forward = PreferenceTracker::new();
        let mut backward = PreferenceTracker::new();
        let offers = vec![
            offer(&domain, "low", "fast"),
            offer(&domain, "mid", "slow"),
            offer(&domain, "low", "fast"),
        ];
        for o in &offers {
            forward.record(o);
        }
        for o in offers.iter().rev() {
            backward.record(o);
        }
        for issue in domain.issues() {
            for value in domain.values(issue).unwrap() {
                assert_eq!(forward.count(issue, value), backward.count(issue, value));
            }
        }
    }
}

use entente_domain::{Domain, DomainError, Issue, Offer, UtilityFunction, Value};

/// Additive utility table for tests: every issue carries a weight and a
/// score per value. The overall utility is the weight-normalized sum, so
/// it stays in `[0, 1]` as long as the value scores do.
#[derive(Clone, Debug, Default)]
pub struct ScoreTable {
    issues: Vec<IssueScores>,
}

#[derive(Clone, Debug)]
struct IssueScores {
    issue: Issue,
    weight: f64,
    values: Vec<(Value, f64)>,
}

impl ScoreTable {
    pub fn new() -> ScoreTable {
        Default::default()
    }

    pub fn issue(mut self, issue: &str, weight: f64, values: Vec<(&str, f64)>) -> ScoreTable {
        self.issues.push(IssueScores {
            issue: issue.into(),
            weight,
            values: values
                .into_iter()
                .map(|(value, score)| (value.into(), score))
                .collect(),
        });
        self
    }

    /// Domain spanned by the table, issues and values in insertion order.
    pub fn domain(&self) -> Result<Domain, DomainError> {
        Domain::new(
            self.issues
                .iter()
                .map(|scores| {
                    (
                        scores.issue.clone(),
                        scores.values.iter().map(|(value, _)| value.clone()).collect(),
                    )
                })
                .collect(),
        )
    }
}

impl UtilityFunction for ScoreTable {
    fn utility(&self, offer: &Offer) -> f64 {
        let total: f64 = self.issues.iter().map(|scores| scores.weight).sum();
        if total <= 0.0 {
            return 0.0;
        }
        self.issues
            .iter()
            .map(|scores| {
                let score = offer
                    .value(&scores.issue)
                    .and_then(|chosen| {
                        scores
                            .values
                            .iter()
                            .find(|(value, _)| value == chosen)
                            .map(|(_, score)| *score)
                    })
                    .unwrap_or(0.0);
                scores.weight / total * score
            })
            .sum()
    }
}

use derive_more::Display;
use rand::Rng;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;

use crate::error::DomainError;

/// Identifier of one negotiable dimension. Issues are defined externally
/// by the negotiation domain and never change during a session.
#[derive(Clone, Debug, Display, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct Issue(String);

impl Issue {
    pub fn new(id: impl Into<String>) -> Issue {
        Issue(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl From<&str> for Issue {
    fn from(id: &str) -> Issue {
        Issue::new(id)
    }
}

/// One legal setting for an `Issue`. Compared by equality within the
/// issue's domain of values.
#[derive(Clone, Debug, Display, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct Value(String);

impl Value {
    pub fn new(id: impl Into<String>) -> Value {
        Value(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl From<&str> for Value {
    fn from(id: &str) -> Value {
        Value::new(id)
    }
}

/// Ordered set of issues with their finite sets of legal values.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct Domain {
    issues: Vec<(Issue, Vec<Value>)>,
}

impl Domain {
    pub fn new(issues: Vec<(Issue, Vec<Value>)>) -> Result<Domain, DomainError> {
        if issues.is_empty() {
            return Err(DomainError::EmptyDomain);
        }
        for (issue, values) in &issues {
            if values.is_empty() {
                return Err(DomainError::EmptyIssue(issue.clone()));
            }
        }
        Ok(Domain { issues })
    }

    pub fn issues(&self) -> impl Iterator<Item = &Issue> {
        self.issues.iter().map(|(issue, _)| issue)
    }

    pub fn num_issues(&self) -> usize {
        self.issues.len()
    }

    pub fn values(&self, issue: &Issue) -> Result<&[Value], DomainError> {
        self.issues
            .iter()
            .find(|(candidate, _)| candidate == issue)
            .map(|(_, values)| values.as_slice())
            .ok_or_else(|| DomainError::UnknownIssue(issue.clone()))
    }

    /// Number of distinct complete offers expressible in this domain.
    pub fn num_outcomes(&self) -> usize {
        self.issues
            .iter()
            .map(|(_, values)| values.len())
            .product()
    }

    /// Uniformly sampled complete offer.
    pub fn random_offer<R: Rng + ?Sized>(&self, rng: &mut R) -> Offer {
        let assignments = self
            .issues
            .iter()
            .map(|(issue, values)| {
                let value = values[rng.gen_range(0..values.len())].clone();
                (issue.clone(), value)
            })
            .collect();
        // Assignments are drawn from the legal value sets, so this can't fail.
        Offer { assignments }
    }
}

/// Complete assignment of a value to every issue of the domain. Partial
/// offers are rejected at construction; once built an offer is immutable.
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Offer {
    assignments: BTreeMap<Issue, Value>,
}

impl Offer {
    /// Validates completeness and legality of `assignments` against `domain`.
    pub fn new(
        domain: &Domain,
        assignments: BTreeMap<Issue, Value>,
    ) -> Result<Offer, DomainError> {
        for issue in domain.issues() {
            let value = assignments
                .get(issue)
                .ok_or_else(|| DomainError::IncompleteOffer(issue.clone()))?;
            if !domain.values(issue)?.contains(value) {
                return Err(DomainError::IllegalValue {
                    issue: issue.clone(),
                    value: value.clone(),
                });
            }
        }
        for issue in assignments.keys() {
            if !domain.issues().any(|candidate| candidate == issue) {
                return Err(DomainError::UnknownIssue(issue.clone()));
            }
        }
        Ok(Offer { assignments })
    }

    /// Convenience constructor from `(issue, value)` pairs.
    pub fn from_pairs(
        domain: &Domain,
        pairs: Vec<(Issue, Value)>,
    ) -> Result<Offer, DomainError> {
        Offer::new(domain, pairs.into_iter().collect())
    }

    pub fn value(&self, issue: &Issue) -> Option<&Value> {
        self.assignments.get(issue)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&Issue, &Value)> {
        self.assignments.iter()
    }

    /// Copy of this offer with a single issue reassigned.
    pub fn with_value(
        &self,
        domain: &Domain,
        issue: &Issue,
        value: Value,
    ) -> Result<Offer, DomainError> {
        if !domain.values(issue)?.contains(&value) {
            return Err(DomainError::IllegalValue {
                issue: issue.clone(),
                value,
            });
        }
        let mut assignments = self.assignments.clone();
        assignments.insert(issue.clone(), value);
        Ok(Offer { assignments })
    }
}

impl fmt::Display for Offer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut first = true;
        for (issue, value) in &self.assignments {
            if !first {
                write!(f, ", ")?;
            }
            write!(f, "{}={}", issue, value)?;
            first = false;
        }
        Ok(())
    }
}

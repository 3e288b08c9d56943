use crate::domain::{Issue, Value};

#[derive(thiserror::Error, Clone, Debug, PartialEq)]
pub enum DomainError {
    #[error("Domain has no issues.")]
    EmptyDomain,
    #[error("Issue '{0}' has no legal values.")]
    EmptyIssue(Issue),
    #[error("Issue '{0}' is not part of the domain.")]
    UnknownIssue(Issue),
    #[error("Value '{value}' is not legal for issue '{issue}'.")]
    IllegalValue { issue: Issue, value: Value },
    #[error("Offer is missing an assignment for issue '{0}'.")]
    IncompleteOffer(Issue),
    #[error("Deadline is counted in {deadline}, but driver reported progress in {progress}.")]
    ProgressMismatch {
        deadline: &'static str,
        progress: &'static str,
    },
}

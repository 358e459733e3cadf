use std::fmt;

/// Failures that belong to the domain. Use cases return them as values; controllers map
/// each kind to a status code.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DomainFailure {
    AccountNotFound,
    TaskNotFound,
    EmailAlreadyExists,
    IncorrectPassword,
    InvalidDateRange(DateRangeViolation),
    InvalidAccount,
    InvalidStatusTransition { from: String, to: String },
    RecoverTokenUsed,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DateRangeViolation {
    EndDateInPast,
    MissingNotifyDate,
    NotifyAfterEnd,
    UnrepresentableDate,
}

impl DomainFailure {
    pub fn message(&self) -> String {
        match self {
            DomainFailure::AccountNotFound => "account not found".to_string(),
            DomainFailure::TaskNotFound => "task not found".to_string(),
            DomainFailure::EmailAlreadyExists => "email already exists".to_string(),
            DomainFailure::IncorrectPassword => "incorrect password".to_string(),
            DomainFailure::InvalidDateRange(violation) => violation.message().to_string(),
            DomainFailure::InvalidAccount => {
                "you can only change a task that belongs to you".to_string()
            }
            DomainFailure::InvalidStatusTransition { from, to } => {
                format!("a task cannot move from '{from}' to '{to}'")
            }
            DomainFailure::RecoverTokenUsed => {
                "recover token was already used or superseded".to_string()
            }
        }
    }
}

impl DateRangeViolation {
    pub fn message(&self) -> &'static str {
        match self {
            DateRangeViolation::EndDateInPast => {
                "The end date cannot be earlier than the current date"
            }
            DateRangeViolation::MissingNotifyDate => {
                "To be notified you must provide a notify date"
            }
            DateRangeViolation::NotifyAfterEnd => {
                "The notification date cannot be later than the end date"
            }
            DateRangeViolation::UnrepresentableDate => "The date does not denote a valid time",
        }
    }
}

impl fmt::Display for DomainFailure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.message())
    }
}

/// Success value or domain failure.
pub type Outcome<T> = std::result::Result<T, DomainFailure>;

use crate::error::ReportError;
use crate::model::{ConnectionConfig, QueryParams};

/// A form field that failed validation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FieldProblem {
    Missing(&'static str),
    Invalid { field: &'static str, detail: String },
}

impl FieldProblem {
    pub fn detail(&self) -> String {
        match self {
            FieldProblem::Missing(field) => format!("{} is required", field),
            FieldProblem::Invalid { field, detail } => format!("{}: {}", field, detail),
        }
    }
}

/// Outcome of form validation.
#[derive(Debug, PartialEq, Eq)]
pub enum ValidationResult {
    Valid,
    Rejected { problems: Vec<FieldProblem> },
}

impl ValidationResult {
    fn from_problems(problems: Vec<FieldProblem>) -> Self {
        if problems.is_empty() {
            ValidationResult::Valid
        } else {
            ValidationResult::Rejected { problems }
        }
    }
}

/// Check the lookup fields. Every field must be non-empty; values are
/// otherwise taken exactly as typed.
pub fn check_query(params: &QueryParams) -> ValidationResult {
    let fields = [
        ("Location", &params.location),
        ("GF Number", &params.gf_number),
        ("Order ID", &params.order_id),
    ];
    let problems = fields
        .into_iter()
        .filter(|(_, value)| value.is_empty())
        .map(|(name, _)| FieldProblem::Missing(name))
        .collect();
    ValidationResult::from_problems(problems)
}

/// Check the connection target before any driver call is made.
pub fn check_connection(config: &ConnectionConfig) -> ValidationResult {
    let mut problems = Vec::new();

    if config.host.trim().is_empty() {
        problems.push(FieldProblem::Missing("Host"));
    }

    let port = config.port.trim();
    if port.is_empty() {
        problems.push(FieldProblem::Missing("Port"));
    } else {
        match port.parse::<u16>() {
            Ok(0) => problems.push(FieldProblem::Invalid {
                field: "Port",
                detail: "must be between 1 and 65535".to_string(),
            }),
            Ok(_) => {}
            Err(_) => problems.push(FieldProblem::Invalid {
                field: "Port",
                detail: format!("'{}' is not a valid port number", port),
            }),
        }
    }

    ValidationResult::from_problems(problems)
}

/// Validate the lookup fields, converting a rejection into a [`ReportError::Validation`].
pub fn validate_query(params: &QueryParams) -> Result<(), ReportError> {
    match check_query(params) {
        ValidationResult::Valid => Ok(()),
        ValidationResult::Rejected { .. } => Err(ReportError::Validation {
            reason: "All fields are required.".to_string(),
        }),
    }
}

/// Validate the connection target, converting a rejection into a [`ReportError::Connection`].
pub fn validate_connection(config: &ConnectionConfig) -> Result<(), ReportError> {
    match check_connection(config) {
        ValidationResult::Valid => Ok(()),
        ValidationResult::Rejected { problems } => {
            let detail = problems
                .iter()
                .map(FieldProblem::detail)
                .collect::<Vec<_>>()
                .join("; ");
            Err(ReportError::Connection { message: detail })
        }
    }
}

use thiserror::Error;

/// Caller input that was rejected before any database work.
#[derive(Clone, Debug, Error, PartialEq, Eq)]
pub enum ValidationError {
    #[error("missing required query parameter `{0}`")]
    MissingParameter(&'static str),
    #[error("malformed query string: {0}")]
    MalformedQuery(String),
    #[error("unknown metric `{given}`; expected one of: {expected}")]
    UnknownMetric { given: String, expected: String },
    #[error("unknown dimension `{given}`; expected one of: {expected}")]
    UnknownDimension { given: String, expected: String },
    #[error("`{0}` is not a valid SQL identifier (expected [a-z_][a-z0-9_]*)")]
    InvalidIdentifier(String),
}

#[derive(Clone, Debug, Error, PartialEq, Eq)]
pub enum ApplicationError {
    #[error(transparent)]
    Validation(#[from] ValidationError),
    #[error("data mart `{relation}` does not exist")]
    SchemaMissing { relation: String },
    #[error("warehouse unavailable: {0}")]
    Unavailable(String),
    #[error("persistence failure: {0}")]
    Persistence(String),
}

#[derive(Clone, Debug, Error, PartialEq, Eq)]
pub enum InterfaceError {
    #[error("bad request: {message}")]
    BadRequest { message: String, correlation_id: String },
    #[error("service unavailable: {message}")]
    ServiceUnavailable { message: String, correlation_id: String },
    #[error("data mart missing: {relation}")]
    SchemaMissing { relation: String, correlation_id: String },
    #[error("internal error: {message}")]
    Internal { message: String, correlation_id: String },
}

impl InterfaceError {
    /// Text that is safe to hand back to the caller. Driver messages never reach it.
    pub fn user_message(&self) -> String {
        match self {
            Self::BadRequest { message, .. } => message.clone(),
            Self::ServiceUnavailable { .. } => {
                "The analytics warehouse is temporarily unavailable. Please retry shortly."
                    .to_owned()
            }
            Self::SchemaMissing { relation, .. } => format!(
                "Data mart `{relation}` has not been created yet. \
                 Run the dbt pipeline (`dbt build`) first."
            ),
            Self::Internal { .. } => "An unexpected internal error occurred.".to_owned(),
        }
    }

    pub fn correlation_id(&self) -> &str {
        match self {
            Self::BadRequest { correlation_id, .. }
            | Self::ServiceUnavailable { correlation_id, .. }
            | Self::SchemaMissing { correlation_id, .. }
            | Self::Internal { correlation_id, .. } => correlation_id,
        }
    }
}

impl ApplicationError {
    pub fn into_interface(self, correlation_id: impl Into<String>) -> InterfaceError {
        let correlation_id = correlation_id.into();
        let mut mapped = InterfaceError::from(self);
        match &mut mapped {
            InterfaceError::BadRequest { correlation_id: id, .. }
            | InterfaceError::ServiceUnavailable { correlation_id: id, .. }
            | InterfaceError::SchemaMissing { correlation_id: id, .. }
            | InterfaceError::Internal { correlation_id: id, .. } => *id = correlation_id,
        }
        mapped
    }
}

impl From<ApplicationError> for InterfaceError {
    fn from(value: ApplicationError) -> Self {
        let correlation_id = "unassigned".to_owned();
        match value {
            ApplicationError::Validation(error) => {
                Self::BadRequest { message: error.to_string(), correlation_id }
            }
            ApplicationError::SchemaMissing { relation } => {
                Self::SchemaMissing { relation, correlation_id }
            }
            ApplicationError::Unavailable(message) => {
                Self::ServiceUnavailable { message, correlation_id }
            }
            ApplicationError::Persistence(message) => Self::Internal { message, correlation_id },
        }
    }
}

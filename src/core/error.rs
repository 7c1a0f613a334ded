use thiserror::Error;

pub type Result<T> = std::result::Result<T, SimulationError>;

#[derive(Error, Debug, Clone, PartialEq)]
pub enum SimulationError {
    #[error("invalid configuration: {field} {reason}")]
    InvalidConfig { field: &'static str, reason: String },
}

impl SimulationError {
    pub fn invalid_config(field: &'static str, reason: impl Into<String>) -> Self {
        Self::InvalidConfig {
            field,
            reason: reason.into(),
        }
    }

    pub fn field(&self) -> &'static str {
        match self {
            Self::InvalidConfig { field, .. } => field,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn invalid_config_message_names_field() {
        let err = SimulationError::invalid_config("loan_term_years", "must be > 0");
        assert_eq!(
            err.to_string(),
            "invalid configuration: loan_term_years must be > 0"
        );
        assert_eq!(err.field(), "loan_term_years");
    }
}

pub type VeneerResult<T> = Result<T, VeneerError>;

/// Errors produced while resolving, compiling or rendering a description.
///
/// Data-content problems are scoped to the subtree that caused them: the
/// compiler drops the failing node, records the error as a diagnostic and
/// keeps going with siblings. Nothing here is process-fatal.
#[derive(thiserror::Error, Debug)]
pub enum VeneerError {
    #[error("invalid color format: {0}")]
    InvalidColorFormat(String),

    #[error("missing required option: {0}")]
    MissingRequiredOption(String),

    #[error("invalid gradient spec: {0}")]
    InvalidGradientSpec(String),

    #[error("unknown node type: {0}")]
    UnknownNodeType(String),

    #[error("missing geometry: {0}")]
    MissingGeometry(String),

    #[error("validation error: {0}")]
    Validation(String),

    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

impl VeneerError {
    pub fn invalid_color(msg: impl Into<String>) -> Self {
        Self::InvalidColorFormat(msg.into())
    }

    pub fn missing_option(msg: impl Into<String>) -> Self {
        Self::MissingRequiredOption(msg.into())
    }

    pub fn invalid_gradient(msg: impl Into<String>) -> Self {
        Self::InvalidGradientSpec(msg.into())
    }

    pub fn unknown_type(msg: impl Into<String>) -> Self {
        Self::UnknownNodeType(msg.into())
    }

    pub fn missing_geometry(msg: impl Into<String>) -> Self {
        Self::MissingGeometry(msg.into())
    }

    pub fn validation(msg: impl Into<String>) -> Self {
        Self::Validation(msg.into())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn display_prefixes_are_stable() {
        assert!(
            VeneerError::invalid_color("x")
                .to_string()
                .contains("invalid color format:")
        );
        assert!(
            VeneerError::missing_option("width")
                .to_string()
                .contains("missing required option:")
        );
        assert!(
            VeneerError::unknown_type("triangle")
                .to_string()
                .contains("unknown node type:")
        );
        assert!(
            VeneerError::missing_geometry("size")
                .to_string()
                .contains("missing geometry:")
        );
    }

    #[test]
    fn other_preserves_source() {
        let base = std::io::Error::other("boom");
        let err = VeneerError::Other(anyhow::Error::new(base));
        assert!(err.to_string().contains("boom"));
    }
}

//! Application error type.
//!
//! Every fallible operation returns `Result<_, AppError>`. The error carries the
//! process exit code so `main` can map it directly:
//!
//! - `2`: bad input, configuration, or file
//! - `3`: insufficient or unusable data
//! - `4`: numerical or runtime failure
//! - `5`: solver subprocess failure

#[derive(Clone)]
pub struct AppError {
    exit_code: u8,
    message: String,
}

impl AppError {
    pub fn new(exit_code: u8, message: impl Into<String>) -> Self {
        Self {
            exit_code,
            message: message.into(),
        }
    }

    pub fn input(message: impl Into<String>) -> Self {
        Self::new(2, message)
    }

    pub fn data(message: impl Into<String>) -> Self {
        Self::new(3, message)
    }

    pub fn numeric(message: impl Into<String>) -> Self {
        Self::new(4, message)
    }

    pub fn solver(message: impl Into<String>) -> Self {
        Self::new(5, message)
    }

    pub fn exit_code(&self) -> u8 {
        self.exit_code
    }

    pub fn message(&self) -> &str {
        &self.message
    }
}

impl std::fmt::Display for AppError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.message)
    }
}

impl std::fmt::Debug for AppError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AppError")
            .field("exit_code", &self.exit_code)
            .field("message", &self.message)
            .finish()
    }
}

impl std::error::Error for AppError {}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn constructors_set_exit_codes() {
        assert_eq!(AppError::input("x").exit_code(), 2);
        assert_eq!(AppError::data("x").exit_code(), 3);
        assert_eq!(AppError::numeric("x").exit_code(), 4);
        assert_eq!(AppError::solver("x").exit_code(), 5);
        assert_eq!(AppError::new(7, "boom").to_string(), "boom");
    }
}

use thiserror::Error;

/// Result codes reported by the store. Only the codes this daemon produces
/// or inspects are named here; any other code is carried through untouched.
pub mod result_code {
    pub const OK: i32 = 0;
    pub const SERVER_ERROR: i32 = 1;
    pub const KEY_NOT_FOUND_ERROR: i32 = 2;
    pub const GENERATION_ERROR: i32 = 3;
    pub const PARAMETER_ERROR: i32 = 4;
    pub const KEY_EXISTS_ERROR: i32 = 5;
    pub const TIMEOUT: i32 = 9;
    pub const BIN_TYPE_ERROR: i32 = 12;
    pub const UNSUPPORTED_FEATURE: i32 = 16;
    pub const OP_NOT_APPLICABLE: i32 = 26;
    pub const FILTERED_OUT: i32 = 27;
    pub const INVALID_USER: i32 = 60;
    pub const USER_ALREADY_EXISTS: i32 = 61;
    pub const INVALID_ROLE: i32 = 70;
    pub const ROLE_ALREADY_EXISTS: i32 = 71;
    pub const UDF_BAD_RESPONSE: i32 = 100;
    pub const INDEX_FOUND: i32 = 200;
    pub const INDEX_NOTFOUND: i32 = 201;
}

/// Outcome of a failed store call. Always attached to the response of the
/// call that produced it.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("store error {result_code}: {message}")]
pub struct StoreError {
    pub result_code: i32,
    pub in_doubt: bool,
    pub message: String,
}

impl StoreError {
    pub fn new(result_code: i32, message: impl Into<String>) -> Self {
        Self {
            result_code,
            in_doubt: false,
            message: message.into(),
        }
    }

    pub fn in_doubt(mut self) -> Self {
        self.in_doubt = true;
        self
    }

    pub fn key_not_found() -> Self {
        Self::new(result_code::KEY_NOT_FOUND_ERROR, "Key not found")
    }

    pub fn parameter(message: impl Into<String>) -> Self {
        Self::new(result_code::PARAMETER_ERROR, message)
    }

    pub fn bin_type(message: impl Into<String>) -> Self {
        Self::new(result_code::BIN_TYPE_ERROR, message)
    }

    pub fn unsupported(message: impl Into<String>) -> Self {
        Self::new(result_code::UNSUPPORTED_FEATURE, message)
    }
}

pub type StoreResult<T> = Result<T, StoreError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_store_error_display() {
        let err = StoreError::key_not_found();
        assert_eq!(err.to_string(), "store error 2: Key not found");
        assert!(!err.in_doubt);
    }

    #[test]
    fn test_in_doubt_flag() {
        let err = StoreError::new(result_code::TIMEOUT, "timeout").in_doubt();
        assert!(err.in_doubt);
        assert_eq!(err.result_code, 9);
    }
}

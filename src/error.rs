//! Unified application error model and mapping helpers.
//! This module provides a common error enum used across the HTTP layer and the
//! policy/identity modules, along with the HTTP status mapping.
//!
//! Note that an authorization Deny is NOT an error: the guard returns
//! `Decision::Deny(..)` as a normal value. `AppError` covers authentication
//! failures, malformed policy configuration, and genuinely unexpected states.

use serde::{Deserialize, Serialize};
use std::fmt::{Display, Formatter};

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum AppError {
    /// Missing, malformed, expired, or otherwise unverifiable credential.
    Auth { code: String, message: String },
    /// Authenticated but not permitted to perform the action.
    Forbidden { code: String, message: String },
    /// Unknown resource (also used to hide unconfigured routes).
    NotFound { code: String, message: String },
    /// Malformed or ambiguous policy configuration. Fatal at startup.
    Config { code: String, message: String },
    Internal { code: String, message: String },
}

impl AppError {
    pub fn code_str(&self) -> &str {
        match self {
            AppError::Auth { code, .. }
            | AppError::Forbidden { code, .. }
            | AppError::NotFound { code, .. }
            | AppError::Config { code, .. }
            | AppError::Internal { code, .. } => code.as_str(),
        }
    }

    pub fn message(&self) -> &str {
        match self {
            AppError::Auth { message, .. }
            | AppError::Forbidden { message, .. }
            | AppError::NotFound { message, .. }
            | AppError::Config { message, .. }
            | AppError::Internal { message, .. } => message.as_str(),
        }
    }

    pub fn auth<S: Into<String>>(code: S, msg: S) -> Self { AppError::Auth { code: code.into(), message: msg.into() } }
    pub fn forbidden<S: Into<String>>(code: S, msg: S) -> Self { AppError::Forbidden { code: code.into(), message: msg.into() } }
    pub fn not_found<S: Into<String>>(code: S, msg: S) -> Self { AppError::NotFound { code: code.into(), message: msg.into() } }
    pub fn config<S: Into<String>>(code: S, msg: S) -> Self { AppError::Config { code: code.into(), message: msg.into() } }
    pub fn internal<S: Into<String>>(code: S, msg: S) -> Self { AppError::Internal { code: code.into(), message: msg.into() } }

    /// Map to HTTP status code.
    pub fn http_status(&self) -> u16 {
        match self {
            AppError::Auth { .. } => 401,
            AppError::Forbidden { .. } => 403,
            AppError::NotFound { .. } => 404,
            // Config errors never reach a live request path; 500 if one does.
            AppError::Config { .. } => 500,
            AppError::Internal { .. } => 500,
        }
    }
}

impl Display for AppError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}: {}", self.code_str(), self.message())
    }
}

impl std::error::Error for AppError {}

pub type AppResult<T> = Result<T, AppError>;

impl From<anyhow::Error> for AppError {
    fn from(err: anyhow::Error) -> Self {
        AppError::Internal { code: "internal".into(), message: err.to_string() }
    }
}

impl From<serde_json::Error> for AppError {
    fn from(err: serde_json::Error) -> Self {
        AppError::Config { code: "policy_parse".into(), message: err.to_string() }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn http_status_mapping() {
        assert_eq!(AppError::auth("no_token", "missing").http_status(), 401);
        assert_eq!(AppError::forbidden("role", "nope").http_status(), 403);
        assert_eq!(AppError::not_found("nf", "missing").http_status(), 404);
        assert_eq!(AppError::config("ambiguous", "overlap").http_status(), 500);
        assert_eq!(AppError::internal("internal", "panic").http_status(), 500);
    }

    #[test]
    fn display_includes_code_and_message() {
        let e = AppError::auth("token_expired", "credential expired");
        assert_eq!(e.to_string(), "token_expired: credential expired");
    }
}

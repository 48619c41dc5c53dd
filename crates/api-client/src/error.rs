// In crates/api-client/src/error.rs

use core_types::ExchangeError;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum Error {
    #[error("Failed to build the API client: {0}")]
    ClientBuildError(String),
    #[error("API client error: {0}")]
    CustomError(String),
    #[error("Request failed: {0}")]
    RequestFailed(#[from] reqwest::Error),
    #[error("Deserialization failed: {0}")]
    DeserializationFailed(#[from] serde_json::Error),
    #[error("API error: code {code}, msg: {msg}")]
    ApiError { code: i64, msg: String },
    #[error("HTTP {status}: {body}")]
    HttpStatus { status: u16, body: String },
}

pub type Result<T> = std::result::Result<T, Error>;

/// Binance error codes that describe infrastructure trouble rather than a
/// refusal of the request itself.
const TRANSIENT_API_CODES: &[i64] = &[
    -1000, // UNKNOWN
    -1001, // DISCONNECTED
    -1003, // TOO_MANY_REQUESTS
    -1006, // UNEXPECTED_RESP
    -1007, // TIMEOUT
    -1008, // SERVER_BUSY
    -1021, // INVALID_TIMESTAMP (clock drift)
];

/// Returned when a `newClientOrderId` is reused for an order the exchange
/// already accepted.
const NEW_ORDER_REJECTED: i64 = -2010;

fn is_transient_status(status: u16) -> bool {
    status == 418 || status == 429 || (500..600).contains(&status)
}

impl Error {
    /// True when a placement was refused because its client order id is
    /// already on the book. The original order may well have filled.
    pub fn is_duplicate_order(&self) -> bool {
        matches!(
            self,
            Error::ApiError { code, msg }
                if *code == NEW_ORDER_REJECTED && msg.to_ascii_lowercase().contains("duplicate")
        )
    }
}

impl From<Error> for ExchangeError {
    fn from(error: Error) -> Self {
        match error {
            Error::RequestFailed(e) if e.is_timeout() => {
                ExchangeError::Network(format!("request timed out: {e}"))
            }
            // Body and decode errors come from reading the response stream;
            // JSON decoding goes through `DeserializationFailed`.
            Error::RequestFailed(e)
                if e.is_connect() || e.is_request() || e.is_body() || e.is_decode() =>
            {
                ExchangeError::Network(e.to_string())
            }
            Error::RequestFailed(e) => ExchangeError::Unexpected(e.to_string()),
            Error::HttpStatus { status, body } if is_transient_status(status) => {
                ExchangeError::Network(format!("HTTP {status}: {body}"))
            }
            Error::HttpStatus { status, body } => ExchangeError::Rejected {
                code: i64::from(status),
                msg: body,
            },
            Error::ApiError { code, msg } if TRANSIENT_API_CODES.contains(&code) => {
                ExchangeError::Network(format!("code {code}: {msg}"))
            }
            Error::ApiError { code, msg } => ExchangeError::Rejected { code, msg },
            Error::DeserializationFailed(e) => ExchangeError::Unexpected(e.to_string()),
            Error::ClientBuildError(msg) | Error::CustomError(msg) => {
                ExchangeError::Unexpected(msg)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn business_codes_become_rejections() {
        let mapped: ExchangeError = Error::ApiError {
            code: -2010,
            msg: "Account has insufficient balance".into(),
        }
        .into();
        assert!(matches!(mapped, ExchangeError::Rejected { code: -2010, .. }));
    }

    #[test]
    fn infrastructure_codes_become_network_errors() {
        let mapped: ExchangeError = Error::ApiError {
            code: -1003,
            msg: "Too many requests".into(),
        }
        .into();
        assert!(matches!(mapped, ExchangeError::Network(_)));
    }

    #[test]
    fn http_status_split() {
        let busy: ExchangeError = Error::HttpStatus {
            status: 503,
            body: "Service Unavailable".into(),
        }
        .into();
        assert!(matches!(busy, ExchangeError::Network(_)));

        let banned: ExchangeError = Error::HttpStatus {
            status: 418,
            body: String::new(),
        }
        .into();
        assert!(matches!(banned, ExchangeError::Network(_)));

        let forbidden: ExchangeError = Error::HttpStatus {
            status: 403,
            body: "WAF".into(),
        }
        .into();
        assert!(matches!(forbidden, ExchangeError::Rejected { code: 403, .. }));
    }

    #[test]
    fn only_duplicate_rejections_are_duplicates() {
        let duplicate = Error::ApiError {
            code: -2010,
            msg: "Duplicate order sent.".into(),
        };
        assert!(duplicate.is_duplicate_order());

        let insufficient = Error::ApiError {
            code: -2010,
            msg: "Account has insufficient balance for requested action.".into(),
        };
        assert!(!insufficient.is_duplicate_order());

        let other_code = Error::ApiError {
            code: -1013,
            msg: "Duplicate order sent.".into(),
        };
        assert!(!other_code.is_duplicate_order());
    }

    #[test]
    fn decode_failures_are_unexpected() {
        let e = serde_json::from_str::<serde_json::Value>("{not json").unwrap_err();
        let mapped: ExchangeError = Error::DeserializationFailed(e).into();
        assert!(matches!(mapped, ExchangeError::Unexpected(_)));
    }
}

use std::fmt;

use anyhow::Error;
use serde::Serialize;
use serde_json::Value;

pub const INVALID_COLOR: &str = "INVALID_COLOR";
pub const INVALID_PREVIEW_MODE: &str = "INVALID_PREVIEW_MODE";
pub const INVALID_PROFILE: &str = "INVALID_PROFILE";
pub const INVALID_OBJECTIVE: &str = "INVALID_OBJECTIVE";
pub const INVALID_SURFACE_SIZE: &str = "INVALID_SURFACE_SIZE";
pub const INVALID_AD_DOCUMENT: &str = "INVALID_AD_DOCUMENT";
pub const EXPORT_FORMAT_UNSUPPORTED: &str = "EXPORT_FORMAT_UNSUPPORTED";
pub const FONT_ASSET_HASH_MISMATCH: &str = "FONT_ASSET_HASH_MISMATCH";

/// How the binary should treat a coded error when it reaches `main`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CodedErrorKind {
    /// Caller supplied something invalid; exit code 2.
    Usage,
    /// Asset on disk does not match what the document pinned; exit code 1.
    Asset,
}

#[derive(Debug, Clone)]
pub struct CodedError {
    pub code: &'static str,
    pub message: String,
    pub details: Option<Value>,
    pub kind: CodedErrorKind,
}

impl CodedError {
    pub fn usage(code: &'static str, message: impl Into<String>) -> Self {
        Self {
            code,
            message: message.into(),
            details: None,
            kind: CodedErrorKind::Usage,
        }
    }

    pub fn asset(code: &'static str, message: impl Into<String>) -> Self {
        Self {
            code,
            message: message.into(),
            details: None,
            kind: CodedErrorKind::Asset,
        }
    }

    pub fn with_details(mut self, details: Value) -> Self {
        self.details = Some(details);
        self
    }

    pub fn exit_code(&self) -> i32 {
        match self.kind {
            CodedErrorKind::Usage => 2,
            CodedErrorKind::Asset => 1,
        }
    }

    pub fn envelope(&self) -> ErrorEnvelope {
        ErrorEnvelope {
            ok: false,
            error: ErrorEnvelopeBody {
                code: self.code.to_owned(),
                message: self.message.clone(),
                details: self.details.clone(),
            },
        }
    }
}

impl fmt::Display for CodedError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.code, self.message)
    }
}

impl std::error::Error for CodedError {}

#[derive(Debug, Clone, Serialize)]
pub struct ErrorEnvelope {
    pub ok: bool,
    pub error: ErrorEnvelopeBody,
}

#[derive(Debug, Clone, Serialize)]
pub struct ErrorEnvelopeBody {
    pub code: String,
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub details: Option<Value>,
}

/// Finds the first `CodedError` anywhere in an anyhow context chain.
pub fn find_coded_error(error: &Error) -> Option<&CodedError> {
    error
        .chain()
        .find_map(|cause| cause.downcast_ref::<CodedError>())
}

#[cfg(test)]
mod tests {
    use anyhow::{anyhow, Context};
    use serde_json::json;

    use super::{find_coded_error, CodedError, INVALID_COLOR};

    #[test]
    fn coded_error_survives_context_wrapping() {
        let error = Err::<(), _>(anyhow!(CodedError::usage(INVALID_COLOR, "bad hex")))
            .context("failed loading customization")
            .unwrap_err();

        let coded = find_coded_error(&error).expect("coded error should be found");
        assert_eq!(coded.code, INVALID_COLOR);
        assert_eq!(coded.exit_code(), 2);
    }

    #[test]
    fn envelope_omits_missing_details() {
        let plain = serde_json::to_value(CodedError::usage(INVALID_COLOR, "x").envelope())
            .expect("envelope serializes");
        assert_eq!(plain["ok"], json!(false));
        assert!(plain["error"].get("details").is_none());

        let detailed = CodedError::usage(INVALID_COLOR, "x")
            .with_details(json!({ "provided": "#zz" }))
            .envelope();
        let value = serde_json::to_value(detailed).expect("envelope serializes");
        assert_eq!(value["error"]["details"]["provided"], json!("#zz"));
    }
}

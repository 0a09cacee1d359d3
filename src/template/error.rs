// ABOUTME: Error types for chat template operations
// ABOUTME: Covers template loading, strict rendering, and malformed message shapes

use thiserror::Error;

use super::helpers::RaisedException;

#[derive(Error, Debug)]
pub enum TemplateError {
    #[error("Template render error: {0}")]
    RenderError(String),

    #[error("Template syntax error: {0}")]
    SyntaxError(String),

    #[error("Undefined template variable: {0}")]
    MissingVariable(String),

    #[error("Template raised an exception: {0}")]
    Raised(String),

    #[error("Invalid message at index {index}: {reason}")]
    InvalidMessage { index: usize, reason: String },

    #[error("Invalid render context: {0}")]
    InvalidContext(String),

    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    JsonError(#[from] serde_json::Error),
}

impl From<minijinja::Error> for TemplateError {
    fn from(err: minijinja::Error) -> Self {
        use minijinja::ErrorKind;

        if let Some(raised) = find_raised(&err) {
            return TemplateError::Raised(raised.message().to_string());
        }

        match err.kind() {
            ErrorKind::UndefinedError => TemplateError::MissingVariable(err.to_string()),
            ErrorKind::SyntaxError => TemplateError::SyntaxError(err.to_string()),
            _ => TemplateError::RenderError(err.to_string()),
        }
    }
}

/// Walk the source chain looking for an error produced by `raise_exception`
fn find_raised(err: &minijinja::Error) -> Option<&RaisedException> {
    let mut source = std::error::Error::source(err);
    while let Some(current) = source {
        if let Some(raised) = current.downcast_ref::<RaisedException>() {
            return Some(raised);
        }
        source = current.source();
    }
    None
}

pub type Result<T> = std::result::Result<T, TemplateError>;

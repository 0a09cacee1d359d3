// ABOUTME: Error types for model output parsing
// ABOUTME: Defines errors raised while building tool-call and reasoning parsers

use thiserror::Error;

#[derive(Error, Debug)]
pub enum ParseError {
    #[error("Token '{0}' not found in tokenizer vocabulary")]
    MissingToken(String),

    #[error("Invalid extraction pattern: {0}")]
    PatternError(#[from] regex::Error),
}

pub type Result<T> = std::result::Result<T, ParseError>;

// ABOUTME: Template functions and environment setup for chat template rendering
// ABOUTME: Registers raise_exception and Python-compatible string methods with minijinja

use minijinja::{Environment, Error, ErrorKind};
use std::fmt;

/// Error raised from inside a template through `raise_exception`
#[derive(Debug, Clone)]
pub struct RaisedException {
    message: String,
}

impl RaisedException {
    pub fn message(&self) -> &str {
        &self.message
    }
}

impl fmt::Display for RaisedException {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.message)
    }
}

impl std::error::Error for RaisedException {}

/// raise_exception function - aborts rendering with the given message
pub fn raise_exception(message: String) -> Result<String, Error> {
    Err(
        Error::new(ErrorKind::InvalidOperation, message.clone())
            .with_source(RaisedException { message }),
    )
}

/// Register all built-in functions with a minijinja environment
pub fn register_helpers(env: &mut Environment<'_>) {
    minijinja_contrib::add_to_environment(env);

    // Chat templates are written against Python's str/dict/list methods
    env.set_unknown_method_callback(minijinja_contrib::pycompat::unknown_method_callback);

    env.add_function("raise_exception", raise_exception);
}

//! API token resolution: `--token`, then `ROUTEBENCH_TOKEN` (both through
//! clap), then an interactive prompt.
use std::io::{BufRead, IsTerminal, Write};

use tracing::debug;

use crate::error::{AppError, AppResult, ValidationError};

pub const TOKEN_PREFIX: &str = "sk-";

/// Returns a validated token, prompting on stdin when none was supplied.
///
/// # Errors
///
/// Returns an error when no token is available or it fails validation.
pub fn resolve_token(supplied: Option<&str>) -> AppResult<String> {
    if let Some(token) = supplied {
        debug!("Using token from CLI/environment");
        return validate_token(token).map_err(AppError::from);
    }
    let stdin = std::io::stdin();
    if !stdin.is_terminal() {
        return Err(AppError::validation(ValidationError::TokenUnavailable));
    }
    prompt_token(&mut stdin.lock(), &mut std::io::stderr())
}

/// Asks for a token on `output` and reads one line from `input`.
///
/// # Errors
///
/// Returns an error on I/O failure, end of input, or an invalid token.
pub fn prompt_token<R, W>(input: &mut R, output: &mut W) -> AppResult<String>
where
    R: BufRead,
    W: Write,
{
    write!(output, "Token ({}...): ", TOKEN_PREFIX)?;
    output.flush()?;
    let mut line = String::new();
    if input.read_line(&mut line)? == 0 {
        return Err(AppError::validation(ValidationError::TokenUnavailable));
    }
    validate_token(&line).map_err(AppError::from)
}

/// Trims surrounding whitespace and checks the `sk-` prefix.
///
/// # Errors
///
/// Returns an error when the token is empty or lacks the prefix.
pub fn validate_token(token: &str) -> Result<String, ValidationError> {
    let token = token.trim();
    if token.is_empty() {
        return Err(ValidationError::TokenEmpty);
    }
    if !token.starts_with(TOKEN_PREFIX) {
        return Err(ValidationError::TokenPrefix {
            prefix: TOKEN_PREFIX,
        });
    }
    Ok(token.to_owned())
}

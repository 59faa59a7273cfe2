//! Interactive terminal input.

use std::io::{self, BufRead, Write};

use anyhow::{Context, Result};

/// Prompt for one line of text, trimmed
pub fn line(label: &str) -> Result<String> {
    print!("{}: ", label);
    io::stdout().flush()?;

    let mut input = String::new();
    io::stdin()
        .lock()
        .read_line(&mut input)
        .context("Failed to read input")?;
    Ok(input.trim().to_string())
}

/// Prompt for a line, falling back to `default` when left empty
pub fn line_or(label: &str, default: Option<&str>) -> Result<String> {
    match default {
        Some(default) => {
            let input = line(&format!("{} [{}]", label, default))?;
            Ok(if input.is_empty() { default.to_string() } else { input })
        }
        None => line(label),
    }
}

/// Prompt for a password without echoing it
pub fn password(label: &str) -> Result<String> {
    rpassword::prompt_password(format!("{}: ", label)).context("Failed to read password")
}

//! Interactive prompts

use std::io::{self, BufRead, Write};

use anyhow::{bail, Result};

/// Ask for confirmation (y/n)
///
/// Returns true if user confirms, false otherwise.
/// In non-interactive mode (no TTY), returns false.
pub fn confirm(prompt: &str) -> Result<bool> {
    if !atty::is(atty::Stream::Stdin) {
        return Ok(false);
    }

    print!("{} [y/N] ", prompt);
    io::stdout().flush()?;

    let mut input = String::new();
    io::stdin().read_line(&mut input)?;

    Ok(is_yes(&input))
}

/// Ask for a value that was not given on the command line
///
/// Without a TTY the value is read from the first line of stdin, so
/// `echo secret | leafcare login ...` works.
pub fn value(label: &str) -> Result<String> {
    if atty::is(atty::Stream::Stdin) {
        print!("{}: ", label);
        io::stdout().flush()?;
    }

    let mut input = String::new();
    io::stdin().lock().read_line(&mut input)?;
    let input = input.trim_end_matches(['\r', '\n']);
    if input.is_empty() {
        bail!("{} is required", label);
    }
    Ok(input.to_string())
}

fn is_yes(input: &str) -> bool {
    let input = input.trim().to_lowercase();
    input == "y" || input == "yes"
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_is_yes() {
        assert!(is_yes("y\n"));
        assert!(is_yes(" YES "));
        assert!(!is_yes("n"));
        assert!(!is_yes(""));
    }
}

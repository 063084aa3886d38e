// mdump/src/utils/prompt.rs
use std::io::{BufRead, Write, stdin, stdout};

use crate::errors::{AppError, Result};

/// Source of operator answers. The terminal in production, a script in tests.
pub trait Interaction {
    /// Asks a free-form question; an empty answer yields `default`.
    fn ask(&mut self, question: &str, default: &str) -> Result<String>;

    /// Asks a yes/no question; an empty answer yields `default`.
    fn confirm(&mut self, question: &str, default: bool) -> Result<bool>;
}

/// Reads answers from stdin. With `assume_yes`, confirmations are accepted without asking.
#[derive(Debug, Default)]
pub struct TerminalPrompt {
    pub assume_yes: bool,
}

impl TerminalPrompt {
    pub fn new(assume_yes: bool) -> Self {
        TerminalPrompt { assume_yes }
    }

    fn read_line(&self, prompt: &str) -> Result<String> {
        print!("{}", prompt);
        stdout().flush()?;

        let mut input = String::new();
        let read = stdin().lock().read_line(&mut input)?;
        if read == 0 {
            return Err(AppError::Cancelled("input closed".to_string()));
        }
        Ok(input.trim().to_string())
    }
}

impl Interaction for TerminalPrompt {
    fn ask(&mut self, question: &str, default: &str) -> Result<String> {
        let prompt = if default.is_empty() {
            format!("{}: ", question)
        } else {
            format!("{} ({}): ", question, default)
        };
        let answer = self.read_line(&prompt)?;
        Ok(if answer.is_empty() { default.to_string() } else { answer })
    }

    fn confirm(&mut self, question: &str, default: bool) -> Result<bool> {
        if self.assume_yes {
            return Ok(true);
        }
        let hint = if default { "[Y/n]" } else { "[y/N]" };
        loop {
            let answer = self.read_line(&format!("{} {}: ", question, hint))?;
            match parse_yes_no(&answer) {
                Some(value) => return Ok(value),
                None if answer.is_empty() => return Ok(default),
                None => println!("Please enter y or n"),
            }
        }
    }
}

fn parse_yes_no(answer: &str) -> Option<bool> {
    match answer.to_ascii_lowercase().as_str() {
        "y" | "yes" => Some(true),
        "n" | "no" => Some(false),
        _ => None,
    }
}

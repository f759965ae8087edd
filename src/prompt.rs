//! Interactive question capability.
//!
//! Every method returns `Ok(None)` when the user aborts (end of input), which
//! callers treat as "stop the current command quietly".

use std::io::{self, BufRead, ErrorKind, Write};

use owo_colors::OwoColorize;

use crate::error::AppError;

pub trait Prompter {
    /// Free text; an empty answer yields `default` when one is given.
    fn ask_text(&mut self, message: &str, default: Option<&str>) -> Result<Option<String>, AppError>;

    fn ask_password(&mut self, message: &str) -> Result<Option<String>, AppError>;

    /// Index into `choices`.
    fn ask_choice(&mut self, message: &str, choices: &[String]) -> Result<Option<usize>, AppError>;

    fn ask_confirm(&mut self, message: &str, default: bool) -> Result<Option<bool>, AppError>;
}

/// Line-based prompter on stdin/stdout; passwords are read without echo.
#[derive(Debug, Default)]
pub struct TerminalPrompter;

impl TerminalPrompter {
    fn read_line(&self, label: &str) -> Result<Option<String>, AppError> {
        print!("{} {} ", "?".green(), label.bold());
        io::stdout().flush()?;

        let mut input = String::new();
        match io::stdin().lock().read_line(&mut input) {
            Ok(0) => {
                println!();
                Ok(None)
            }
            Ok(_) => Ok(Some(input.trim().to_string())),
            Err(e) if e.kind() == ErrorKind::Interrupted => Ok(None),
            Err(e) => Err(e.into()),
        }
    }
}

impl Prompter for TerminalPrompter {
    fn ask_text(&mut self, message: &str, default: Option<&str>) -> Result<Option<String>, AppError> {
        let label = match default {
            Some(d) if !d.is_empty() => format!("{message} ({d}):"),
            _ => format!("{message}:"),
        };
        Ok(self.read_line(&label)?.map(|answer| match default {
            Some(d) if answer.is_empty() => d.to_string(),
            _ => answer,
        }))
    }

    fn ask_password(&mut self, message: &str) -> Result<Option<String>, AppError> {
        match rpassword::prompt_password(format!("{} {}: ", "?".green(), message.bold())) {
            Ok(pw) => Ok(Some(pw)),
            Err(e) if matches!(e.kind(), ErrorKind::UnexpectedEof | ErrorKind::Interrupted) => {
                Ok(None)
            }
            Err(e) => Err(e.into()),
        }
    }

    fn ask_choice(&mut self, message: &str, choices: &[String]) -> Result<Option<usize>, AppError> {
        println!("{} {}", "?".green(), message.bold());
        for (idx, choice) in choices.iter().enumerate() {
            println!("  {} {}", format!("{})", idx + 1).cyan(), choice);
        }
        loop {
            let Some(answer) = self.read_line("Choice")? else {
                return Ok(None);
            };
            match answer.parse::<usize>() {
                Ok(n) if (1..=choices.len()).contains(&n) => return Ok(Some(n - 1)),
                _ => println!("{}", format!("Pick a number between 1 and {}", choices.len()).red()),
            }
        }
    }

    fn ask_confirm(&mut self, message: &str, default: bool) -> Result<Option<bool>, AppError> {
        let hint = if default { "Y/n" } else { "y/N" };
        loop {
            let Some(answer) = self.read_line(&format!("{message} ({hint})"))? else {
                return Ok(None);
            };
            match answer.to_lowercase().as_str() {
                "" => return Ok(Some(default)),
                "y" | "yes" => return Ok(Some(true)),
                "n" | "no" => return Ok(Some(false)),
                _ => println!("{}", "Please answer y or n".red()),
            }
        }
    }
}

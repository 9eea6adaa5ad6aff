use crate::errors::RestoreServiceError;
use dialoguer::{Completion, Confirm, Input};
use indicatif::{ProgressBar, ProgressStyle};
use std::time::Duration;
use tracing::{error, info};

/// Operator-facing input and output used by the restore workflow
pub trait Prompter {
    /// Informational message
    fn info(&mut self, message: &str);

    /// Plain output line, such as a table row
    fn line(&mut self, message: &str);

    /// Failure message
    fn error(&mut self, message: &str);

    /// Free text question with an optional default answer
    fn ask(&mut self, prompt: &str, default: Option<&str>) -> Result<String, RestoreServiceError>;

    /// Free text question whose completions are drawn from `candidates`
    fn autocomplete(
        &mut self,
        prompt: &str,
        candidates: &[String],
    ) -> Result<String, RestoreServiceError>;

    fn confirm(&mut self, prompt: &str, default: bool) -> Result<bool, RestoreServiceError>;
}

/// Completes the typed prefix to the first matching candidate
struct CandidateCompletion<'a> {
    candidates: &'a [String],
}

impl Completion for CandidateCompletion<'_> {
    fn get(&self, input: &str) -> Option<String> {
        complete(self.candidates, input)
    }
}

/// First candidate starting with `input`, if any
pub fn complete(candidates: &[String], input: &str) -> Option<String> {
    candidates
        .iter()
        .find(|candidate| candidate.starts_with(input))
        .cloned()
}

/// Interactive terminal prompter built on dialoguer
#[derive(Debug, Default)]
pub struct TerminalPrompter;

impl TerminalPrompter {
    pub fn new() -> Self {
        Self
    }
}

impl Prompter for TerminalPrompter {
    fn info(&mut self, message: &str) {
        info!("{}", message);
    }

    fn line(&mut self, message: &str) {
        println!("{}", message);
    }

    fn error(&mut self, message: &str) {
        error!("{}", message);
    }

    fn ask(&mut self, prompt: &str, default: Option<&str>) -> Result<String, RestoreServiceError> {
        let mut input = Input::<String>::new().with_prompt(prompt).allow_empty(true);
        if let Some(default) = default {
            input = input.default(default.to_string());
        }
        Ok(input.interact_text()?)
    }

    fn autocomplete(
        &mut self,
        prompt: &str,
        candidates: &[String],
    ) -> Result<String, RestoreServiceError> {
        let completion = CandidateCompletion { candidates };
        let answer = Input::<String>::new()
            .with_prompt(format!("{} (tab to complete)", prompt))
            .completion_with(&completion)
            .interact_text()?;
        Ok(answer.trim().to_string())
    }

    fn confirm(&mut self, prompt: &str, default: bool) -> Result<bool, RestoreServiceError> {
        let result = Confirm::new()
            .with_prompt(prompt)
            .default(default)
            .interact()?;
        Ok(result)
    }
}

/// Create a spinner shown while a long running step is in progress
pub fn create_spinner(message: &str) -> Result<ProgressBar, RestoreServiceError> {
    let spinner = ProgressBar::new_spinner();
    spinner.set_style(ProgressStyle::default_spinner().template("{spinner:.green} {msg} [{elapsed}]")?);
    spinner.set_message(message.to_string());
    spinner.enable_steady_tick(Duration::from_millis(120));
    Ok(spinner)
}

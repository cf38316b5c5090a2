use crate::common::{
    constants::CONTINUE_ANSWER,
    error::{ReadPromptInput, Result},
};
use snafu::ResultExt;
use std::io::{self, BufRead};

#[cfg(test)]
use mockall::automock;

/// Warning shown when the chart renders resources which are not live in the cluster.
pub const MISSING_RESOURCES_WARNING: &str =
    "Warning: Helm deployment contains resources not already applied";

/// Asks the operator a yes/no question.
#[cfg_attr(test, automock)]
pub trait Prompt {
    /// Print the question and block until an answer is given. True only for a yes.
    fn confirm(&self, question: &str) -> Result<bool>;
}

/// Reads answers from standard input. There is no timeout.
#[derive(Default)]
pub struct StdinPrompt;

impl Prompt for StdinPrompt {
    fn confirm(&self, question: &str) -> Result<bool> {
        console_logger::info(question);

        let mut answer = String::new();
        io::stdin()
            .lock()
            .read_line(&mut answer)
            .context(ReadPromptInput)?;

        Ok(is_affirmative(answer.as_str()))
    }
}

/// Only the exact answer `y` is a yes. The line terminator is ignored, but nothing else is:
/// blank input, `Y`, `yes` and ` y` are all a no.
pub(crate) fn is_affirmative(answer: &str) -> bool {
    answer.trim_end_matches(['\n', '\r']) == CONTINUE_ANSWER
}

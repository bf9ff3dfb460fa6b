//! Interactive conflict resolution over a line-oriented terminal.
//!
//! The prompt repeats until it gets a valid answer; nothing is ever chosen by
//! default. Input and output are generic so the same code drives a real
//! terminal and in-memory buffers in tests.

use std::io::{BufRead, Write};

use tracing::debug;

use crate::conflict::{ConflictResolver, Decision, SymbolConflict};
use crate::error::{MergeError, MergeResult};

const CHOICE_QUESTION: &str =
    "What would you like to do? (1 = use the old name, 2 = use the new name, 3 = define a new name): ";
const NAME_QUESTION: &str = "Name? ";

/// An answer to the choice question.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Choice {
    KeepOld,
    KeepNew,
    Rename,
}

/// Parse an answer to the choice question.
///
/// Accepts `1`/`2`/`3` or the words `old`/`new`/`rename`, surrounded by any
/// whitespace. Everything else is `None`.
pub fn parse_choice(answer: &str) -> Option<Choice> {
    match answer.trim().to_ascii_lowercase().as_str() {
        "1" | "old" => Some(Choice::KeepOld),
        "2" | "new" => Some(Choice::KeepNew),
        "3" | "rename" => Some(Choice::Rename),
        _ => None,
    }
}

/// Asks a human on `output` and reads the answer from `input`.
pub struct PromptResolver<I, O> {
    input: I,
    output: O,
}

impl<I: BufRead, O: Write> PromptResolver<I, O> {
    pub fn new(input: I, output: O) -> Self {
        Self { input, output }
    }

    /// Give back the underlying reader and writer.
    pub fn into_inner(self) -> (I, O) {
        (self.input, self.output)
    }

    fn ask(&mut self, question: &str) -> MergeResult<String> {
        write!(self.output, "{question}")?;
        self.output.flush()?;

        let mut line = String::new();
        if self.input.read_line(&mut line)? == 0 {
            return Err(MergeError::PromptClosed);
        }
        Ok(line.trim().to_string())
    }

    fn ask_choice(&mut self) -> MergeResult<Choice> {
        loop {
            let answer = self.ask(CHOICE_QUESTION)?;
            match parse_choice(&answer) {
                Some(choice) => return Ok(choice),
                None => writeln!(self.output, "Not a valid answer. I will ask again.")?,
            }
        }
    }

    fn ask_name(&mut self) -> MergeResult<String> {
        loop {
            let name = self.ask(NAME_QUESTION)?;
            if !name.is_empty() {
                return Ok(name);
            }
            writeln!(self.output, "A name is required.")?;
        }
    }
}

impl<I: BufRead, O: Write> ConflictResolver for PromptResolver<I, O> {
    fn resolve(&mut self, conflict: &SymbolConflict) -> MergeResult<Decision> {
        writeln!(
            self.output,
            "CONFLICT! Symbol at {} in segment {:?} is named differently in the two databases.",
            conflict.address, conflict.segment
        )?;
        writeln!(self.output, "Name in old database: {}", conflict.old_name)?;
        writeln!(self.output, "Name in new database: {}", conflict.new_name)?;

        let decision = match self.ask_choice()? {
            Choice::KeepOld => Decision::KeepOld,
            Choice::KeepNew => Decision::KeepNew,
            Choice::Rename => Decision::Rename(self.ask_name()?),
        };

        writeln!(self.output, "Using {}...", decision.resulting_name(conflict))?;
        debug!(%conflict, %decision, "conflict settled at prompt");
        Ok(decision)
    }
}

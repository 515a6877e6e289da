use std::io::{BufRead, Write};

/// Verdict on an intermediate artifact.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Decision {
    Accept,
    Retry,
    /// Regenerate with the given guidance appended to the prompt.
    Revise(String),
}

/// Decisions the pipeline delegates to whoever drives it.
pub trait ReviewPolicy: Send {
    /// Picks the book title. `None` keeps the pipeline default.
    fn choose_title(&mut self, candidates: &[String]) -> Option<String>;
    fn approve_research(&mut self, number: u32, title: &str, research: &str) -> Decision;
    fn approve_draft(&mut self, number: u32, title: &str, draft: &str) -> Decision;
    fn accept_revision(&mut self, number: u32, draft: &str, revised: &str) -> bool;
    /// Called after chapter `number` is persisted while chapters remain; `false` stops the run.
    fn continue_after(&mut self, number: u32) -> bool;
}

/// Autonomous mode: take the first candidate and accept everything.
#[derive(Debug, Clone, Copy, Default)]
pub struct AutoApprove;

impl ReviewPolicy for AutoApprove {
    fn choose_title(&mut self, candidates: &[String]) -> Option<String> {
        candidates.first().cloned()
    }

    fn approve_research(&mut self, _number: u32, _title: &str, _research: &str) -> Decision {
        Decision::Accept
    }

    fn approve_draft(&mut self, _number: u32, _title: &str, _draft: &str) -> Decision {
        Decision::Accept
    }

    fn accept_revision(&mut self, _number: u32, _draft: &str, _revised: &str) -> bool {
        true
    }

    fn continue_after(&mut self, _number: u32) -> bool {
        true
    }
}

/// Asks a human over a line-oriented terminal. End of input answers with the default.
pub struct TerminalReview<R, W> {
    input: R,
    output: W,
}

impl<R: BufRead + Send, W: Write + Send> TerminalReview<R, W> {
    pub fn new(input: R, output: W) -> Self {
        Self { input, output }
    }

    fn ask(&mut self, question: &str) -> Option<String> {
        let asked = write!(self.output, "{question} ").and_then(|()| self.output.flush());
        if let Err(err) = asked {
            tracing::warn!("write prompt: {err}");
            return None;
        }

        let mut line = String::new();
        match self.input.read_line(&mut line) {
            Ok(0) => None,
            Ok(_) => Some(line.trim().to_owned()),
            Err(err) => {
                tracing::warn!("read answer: {err}");
                None
            }
        }
    }

    fn show(&mut self, heading: &str, body: &str) {
        if let Err(err) = writeln!(self.output, "\n== {heading} ==\n{body}\n") {
            tracing::warn!("write preview: {err}");
        }
    }

    fn decide(&mut self, heading: &str, body: &str) -> Decision {
        self.show(heading, body);
        let answer = self.ask("[a]ccept, [r]etry, or type guidance to revise:");
        match answer.as_deref().map(str::to_lowercase).as_deref() {
            None | Some("") | Some("a") | Some("accept") => Decision::Accept,
            Some("r") | Some("retry") => Decision::Retry,
            Some(_) => Decision::Revise(answer.unwrap_or_default()),
        }
    }

    fn confirm(&mut self, question: &str) -> bool {
        match self.ask(&format!("{question} [Y/n]")) {
            Some(answer) => !matches!(answer.to_lowercase().as_str(), "n" | "no"),
            None => true,
        }
    }
}

impl<R: BufRead + Send, W: Write + Send> ReviewPolicy for TerminalReview<R, W> {
    fn choose_title(&mut self, candidates: &[String]) -> Option<String> {
        let mut listing = String::new();
        for (idx, candidate) in candidates.iter().enumerate() {
            listing.push_str(&format!("{}. {candidate}\n", idx + 1));
        }
        self.show("Title suggestions", listing.trim_end());

        let answer = self
            .ask("Pick a number, or type your own title:")
            .unwrap_or_default();
        if answer.is_empty() {
            return candidates.first().cloned();
        }
        if let Ok(choice) = answer.parse::<usize>()
            && let Some(candidate) = choice.checked_sub(1).and_then(|idx| candidates.get(idx))
        {
            return Some(candidate.clone());
        }
        Some(answer)
    }

    fn approve_research(&mut self, number: u32, title: &str, research: &str) -> Decision {
        self.decide(&format!("Research for chapter {number}: {title}"), research)
    }

    fn approve_draft(&mut self, number: u32, title: &str, draft: &str) -> Decision {
        self.decide(&format!("Draft of chapter {number}: {title}"), draft)
    }

    fn accept_revision(&mut self, number: u32, _draft: &str, revised: &str) -> bool {
        self.show(&format!("Revised chapter {number}"), revised);
        self.confirm("Keep the revised text?")
    }

    fn continue_after(&mut self, number: u32) -> bool {
        self.confirm(&format!("Chapter {number} saved. Continue with the next chapter?"))
    }
}

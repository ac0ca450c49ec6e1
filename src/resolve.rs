//! Finds recent rows whose category could not be looked up and asks for each one over chat.
//!
//! The workflow is a small state machine. `Categorizer::start` reads the most recent rows and
//! either finishes at once (nothing is missing) or pings the notifier and asks the first question.
//! Every inbound message is then fed to `Categorizer::on_answer`, which records the answer in the
//! mapping sheet and asks the next question, until none are left.
//!
//! ```text
//! Idle --start, nothing missing--------------------------------> Done
//! Idle --start, rows missing--> AwaitingAnswer --on_answer, more--> AwaitingAnswer
//!                                              --on_answer, last--> Done
//! ```

use crate::api::{Chat, Notifier, Reply, Sheet};
use crate::model::{CellRef, Layout, MappingEntry, PendingQuestion, Row};
use crate::Result;
use anyhow::bail;
use tracing::{debug, info, warn};

const COMPLETE: &str = "All values processed.";

/// Where the workflow is.
#[derive(Debug, Default, Clone, Copy, Eq, PartialEq)]
pub(crate) enum Phase {
    /// No question is outstanding.
    #[default]
    Idle,
    /// A question has been sent and the next message is its answer.
    AwaitingAnswer,
    /// Every question is answered, or there were none.
    Done,
}

/// What a call to `Categorizer::on_answer` did.
#[derive(Debug, Clone, Copy, Eq, PartialEq)]
pub(crate) enum Step {
    /// The message was not taken as an answer and nothing changed.
    Ignored,
    /// The answer was recorded and the next question was asked.
    Asked,
    /// The answer was recorded and it was the last one.
    Done,
}

/// The state of one run of the workflow: the questions, how many have been answered and whether
/// an answer is expected.
#[derive(Debug, Default, Clone)]
pub(crate) struct Resolution {
    pending: Vec<PendingQuestion>,
    cursor: usize,
    phase: Phase,
    recorded: Vec<MappingEntry>,
}

impl Resolution {
    pub(crate) fn new(pending: Vec<PendingQuestion>) -> Self {
        Self {
            pending,
            ..Self::default()
        }
    }

    pub(crate) fn phase(&self) -> Phase {
        self.phase
    }

    pub(crate) fn is_done(&self) -> bool {
        self.phase() == Phase::Done
    }

    pub(crate) fn pending(&self) -> &[PendingQuestion] {
        &self.pending
    }

    /// How many questions have been answered.
    pub(crate) fn cursor(&self) -> usize {
        self.cursor
    }

    /// The entries written to the mapping sheet so far.
    pub(crate) fn recorded(&self) -> &[MappingEntry] {
        &self.recorded
    }

    /// The question waiting for an answer, if any.
    fn outstanding(&self) -> Option<&PendingQuestion> {
        match self.phase {
            Phase::AwaitingAnswer => self.pending.get(self.cursor),
            _ => None,
        }
    }

    fn record(&mut self, entry: MappingEntry) {
        self.recorded.push(entry);
        self.cursor += 1;
        self.phase = Phase::Idle;
    }

    fn finish(&mut self) {
        self.pending.clear();
        self.cursor = 0;
        self.phase = Phase::Done;
    }
}

/// Runs the workflow against a sheet, a chat and a notifier.
pub(crate) struct Categorizer {
    sheet: Box<dyn Sheet + Send>,
    chat: Box<dyn Chat + Send>,
    notifier: Box<dyn Notifier + Send>,
    layout: Layout,
}

impl Categorizer {
    pub(crate) fn new(
        sheet: Box<dyn Sheet + Send>,
        chat: Box<dyn Chat + Send>,
        notifier: Box<dyn Notifier + Send>,
        layout: Layout,
    ) -> Self {
        Self {
            sheet,
            chat,
            notifier,
            layout,
        }
    }

    /// Runs the workflow to completion, feeding every received message to `on_answer`. Returns the
    /// entries that were written to the mapping sheet.
    pub(crate) async fn run(&mut self) -> Result<Vec<MappingEntry>> {
        let mut resolution = self.start().await?;
        while !resolution.is_done() {
            debug!(
                "Waiting for answer {} of {}",
                resolution.cursor() + 1,
                resolution.pending().len()
            );
            let reply = self.chat.receive().await?;
            self.on_answer(&mut resolution, &reply).await?;
        }
        debug!("{} mapping entries written", resolution.recorded().len());
        Ok(resolution.recorded)
    }

    /// Reads the most recent rows and collects those whose category is missing. If there are any,
    /// the notifier is called once and the first question is asked.
    pub(crate) async fn start(&mut self) -> Result<Resolution> {
        info!("Checking the most recent rows for missing categories");
        let pending: Vec<PendingQuestion> = self
            .recent_rows()
            .await?
            .iter()
            .filter(|row| row.is_missing(&self.layout.missing))
            .map(PendingQuestion::from)
            .collect();

        let mut resolution = Resolution::new(pending);
        if resolution.pending().is_empty() {
            info!("No missing categories found");
            resolution.finish();
            return Ok(resolution);
        }

        info!(
            "{} rows are missing a category",
            resolution.pending().len()
        );
        self.notifier.notify().await?;
        self.ask_next(&mut resolution).await?;
        Ok(resolution)
    }

    /// Sends the next unanswered question and waits for its answer.
    pub(crate) async fn ask_next(&mut self, resolution: &mut Resolution) -> Result<()> {
        let Some(question) = resolution.pending.get(resolution.cursor) else {
            debug!("There are no more questions to ask");
            return Ok(());
        };
        info!("Asking for the category of '{}'", question.value());
        let text = format!(
            "For the value '{}' in column {}, please provide your input:",
            question.value(),
            self.layout.value_column
        );
        self.chat.send(&text).await?;
        resolution.phase = Phase::AwaitingAnswer;
        Ok(())
    }

    /// Takes `reply` as the answer to the outstanding question. Messages that arrive while no
    /// question is outstanding, and blank messages, change nothing.
    ///
    /// The answer is appended to the mapping sheet before the workflow moves on, so a failed
    /// write leaves the same question outstanding.
    pub(crate) async fn on_answer(
        &mut self,
        resolution: &mut Resolution,
        reply: &Reply,
    ) -> Result<Step> {
        let Some(question) = resolution.outstanding().cloned() else {
            warn!("Ignoring a message that arrived while no question was waiting");
            return Ok(Step::Ignored);
        };
        let answer = reply.text.trim();
        if answer.is_empty() {
            warn!("Ignoring a blank answer for '{}'", question.value());
            return Ok(Step::Ignored);
        }

        let column = self.layout.value_column;
        let ack = format!(
            "Input '{answer}' received for value '{}' in column {column}. Updating mapping sheet...",
            question.value()
        );
        self.chat.reply(reply, &ack).await?;

        let entry = MappingEntry::new(question.value(), answer);
        self.sheet
            .append_row(&self.layout.mapping_sheet, &entry.to_row())
            .await?;
        info!("Mapped '{}' to '{}'", entry.value(), entry.category());
        resolution.record(entry);

        if resolution.cursor < resolution.pending.len() {
            self.ask_next(resolution).await?;
            return Ok(Step::Asked);
        }

        self.chat.send(COMPLETE).await?;
        resolution.finish();
        info!("All missing categories were supplied");
        Ok(Step::Done)
    }

    /// Reads the last `recent_rows` values together with their categories.
    async fn recent_rows(&mut self) -> Result<Vec<Row>> {
        let layout = &self.layout;
        let window = self
            .sheet
            .column_tail(&layout.sheet, layout.value_column, layout.recent_rows)
            .await?;
        let full = self.sheet.column(&layout.sheet, layout.value_column).await?;
        let indices = bind_rows(&full, &window)?;
        if let Some(first) = indices.first() {
            debug!("The recent rows start at row {}", first + 1);
        }

        let mut rows = Vec::with_capacity(window.len());
        for (index, value) in indices.into_iter().zip(window) {
            let cell = CellRef::new(index, layout.category_column);
            let category = self.sheet.cell(&layout.sheet, cell).await?;
            debug!("{cell}: '{value}' has category {category:?}");
            rows.push(Row::new(index, value, category));
        }
        Ok(rows)
    }
}

/// Finds the position in `full` of each value in `window`.
///
/// Both are walked from the end: each window value, last first, is bound to the closest
/// preceding occurrence in `full` that has not been bound yet. When `window` is the tail of `full`
/// this binds every value to its own row, duplicates included.
pub(crate) fn bind_rows(full: &[String], window: &[String]) -> Result<Vec<usize>> {
    let mut indices = Vec::with_capacity(window.len());
    let mut cursor = full.len();
    for value in window.iter().rev() {
        loop {
            if cursor == 0 {
                bail!("The value '{value}' could not be located in the full column");
            }
            cursor -= 1;
            if full[cursor] == *value {
                indices.push(cursor);
                break;
            }
        }
    }
    indices.reverse();
    Ok(indices)
}

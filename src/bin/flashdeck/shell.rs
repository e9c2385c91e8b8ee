//! Console front end over the card store and review log.

use std::io::{BufRead, Write};

use anyhow::Context;
use clap::ValueEnum;
use flashdeck::{
    card::{Card, CardPatch, CardRecord},
    config::StudyConfig,
    core::{review_log::ReviewLog, store::CardStore},
    review::ReviewRecord,
    session::{
        runner::{SessionError, SessionRunner},
        traits::{CumulativeScoring, PlainScoring, ScoringMode},
    },
    types::CardId,
};

#[derive(Clone, Copy, Debug, PartialEq, Eq, ValueEnum)]
pub enum OutputFormat {
    Plain,
    Json,
}

pub struct Shell<'a, R, W> {
    store: &'a mut CardStore,
    log: &'a mut ReviewLog,
    study: StudyConfig,
    input: R,
    out: W,
    format: OutputFormat,
}

impl<'a, R: BufRead, W: Write> Shell<'a, R, W> {
    pub fn new(
        store: &'a mut CardStore,
        log: &'a mut ReviewLog,
        study: StudyConfig,
        input: R,
        out: W,
        format: OutputFormat,
    ) -> Self {
        Self {
            store,
            log,
            study,
            input,
            out,
            format,
        }
    }

    pub fn into_output(self) -> W {
        self.out
    }

    /// Main menu loop. Errors from a single action are reported and the
    /// loop continues; only I/O failure on the terminal ends it early.
    pub fn menu(&mut self) -> anyhow::Result<()> {
        loop {
            writeln!(self.out, "\nFlashcard CLI")?;
            writeln!(self.out, "1. Add Card")?;
            writeln!(self.out, "2. Study")?;
            writeln!(self.out, "3. Quiz")?;
            writeln!(self.out, "4. Quit")?;
            let Some(choice) = self.prompt("Choose an option: ")? else {
                return Ok(());
            };

            let result = match choice.trim() {
                "1" => self.add_interactive(),
                "2" => self.run_session(PlainScoring::default()),
                "3" => self.run_session(CumulativeScoring::default()),
                "4" => return Ok(()),
                _ => {
                    writeln!(self.out, "Invalid option.")?;
                    Ok(())
                }
            };
            if let Err(err) = result {
                writeln!(self.out, "Error: {err:#}")?;
            }
        }
    }

    fn add_interactive(&mut self) -> anyhow::Result<()> {
        let front = self.prompt("Enter front: ")?.unwrap_or_default();
        let back = self.prompt("Enter back: ")?.unwrap_or_default();
        let topic = self.prompt("Enter topic (default 'General'): ")?;
        self.add(front, back, topic)
    }

    /// Adds a card; a blank topic falls back to the default one.
    pub fn add(&mut self, front: String, back: String, topic: Option<String>) -> anyhow::Result<()> {
        let topic = topic.filter(|t| !t.is_empty());
        let card = self.store.add(front, back, topic).context("could not add card")?;
        writeln!(self.out, "Card added! ({})", card.id())?;
        Ok(())
    }

    pub fn edit(&mut self, id: &CardId, patch: CardPatch) -> anyhow::Result<()> {
        let card = self.store.edit(id, patch).context("could not edit card")?;
        writeln!(self.out, "Card updated.")?;
        self.print_cards(&[card])
    }

    pub fn delete(&mut self, id: &CardId) -> anyhow::Result<()> {
        let card = self.store.delete(id).context("could not delete card")?;
        writeln!(self.out, "Deleted \"{}\".", card.front())?;
        Ok(())
    }

    pub fn list(&mut self, topic: Option<&str>) -> anyhow::Result<()> {
        let cards: Vec<Card> = match topic {
            Some(topic) => self.store.list_by_topic_cloned(topic),
            None => self.store.iter().cloned().collect(),
        };
        self.print_cards(&cards)
    }

    pub fn topics(&mut self) -> anyhow::Result<()> {
        let topics: Vec<String> = self.store.topics().into_iter().map(str::to_string).collect();
        match self.format {
            OutputFormat::Json => writeln!(self.out, "{}", serde_json::to_string_pretty(&topics)?)?,
            OutputFormat::Plain => {
                for topic in topics {
                    let count = self.store.list_by_topic(&topic).len();
                    writeln!(self.out, "{topic} ({count})")?;
                }
            }
        }
        Ok(())
    }

    pub fn due(&mut self, limit: usize) -> anyhow::Result<()> {
        let cards = self.store.due_cards_cloned(limit);
        self.print_cards(&cards)
    }

    pub fn history(&mut self, id: &CardId) -> anyhow::Result<()> {
        let events = self.log.history_for(id);
        match self.format {
            OutputFormat::Json => {
                let records: Vec<ReviewRecord> = events.iter().map(|e| e.to_record()).collect();
                writeln!(self.out, "{}", serde_json::to_string_pretty(&records)?)?;
            }
            OutputFormat::Plain => {
                if events.is_empty() {
                    writeln!(self.out, "No reviews for {id}.")?;
                }
                for event in events {
                    writeln!(
                        self.out,
                        "{}  {}",
                        event.timestamp.format("%Y-%m-%d %H:%M:%S"),
                        event.performance
                    )?;
                }
            }
        }
        Ok(())
    }

    /// Runs one study session, prompting for each card's score.
    pub fn run_session<M: ScoringMode>(&mut self, mode: M) -> anyhow::Result<()> {
        let options = self.study.session_options();
        let Self {
            store,
            log,
            input,
            out,
            ..
        } = self;
        let mut session = SessionRunner::new(store, log, mode, options);
        if session.remaining() == 0 {
            writeln!(out, "No cards to study.")?;
            return Ok(());
        }

        while let Some(card) = session.next_card() {
            writeln!(out, "\nFront: {}", card.front())?;
            if read_line(input, out, "Press Enter to see back...")?.is_none() {
                break;
            }
            writeln!(out, "Back: {}", card.back())?;

            loop {
                let Some(raw) = read_line(input, out, "Rate your recall (1-5): ")? else {
                    writeln!(out, "{}", session.summary())?;
                    return Ok(());
                };
                let Ok(score) = raw.trim().parse::<i64>() else {
                    writeln!(out, "Score must be between 1 and 5.")?;
                    continue;
                };
                match session.submit(score) {
                    Ok(updated) => {
                        writeln!(out, "Box {} -> {}", card.level(), updated.level())?;
                        if let Some(correct) = session.summary().correct {
                            writeln!(out, "Score: {correct}/{}", session.summary().reviewed)?;
                        }
                        break;
                    }
                    Err(SessionError::Validation(_)) => {
                        writeln!(out, "Score must be between 1 and 5.")?;
                    }
                    Err(err) => return Err(err).context("could not record review"),
                }
            }
        }

        writeln!(out, "\nSession complete. {}", session.summary())?;
        Ok(())
    }

    fn print_cards(&mut self, cards: &[Card]) -> anyhow::Result<()> {
        match self.format {
            OutputFormat::Json => {
                let records: Vec<CardRecord> = cards.iter().map(Card::to_record).collect();
                writeln!(self.out, "{}", serde_json::to_string_pretty(&records)?)?;
            }
            OutputFormat::Plain => {
                if cards.is_empty() {
                    writeln!(self.out, "No cards.")?;
                }
                for card in cards {
                    writeln!(
                        self.out,
                        "{}  [box {}] [{}] {} | {}",
                        card.id(),
                        card.level(),
                        card.topic(),
                        card.front(),
                        card.back()
                    )?;
                }
            }
        }
        Ok(())
    }

    fn prompt(&mut self, label: &str) -> anyhow::Result<Option<String>> {
        read_line(&mut self.input, &mut self.out, label)
    }
}

/// Prints `label` and reads one line without its terminator; `None` on EOF.
fn read_line<R: BufRead, W: Write>(input: &mut R, out: &mut W, label: &str) -> anyhow::Result<Option<String>> {
    write!(out, "{label}")?;
    out.flush()?;
    let mut line = String::new();
    if input.read_line(&mut line)? == 0 {
        return Ok(None);
    }
    Ok(Some(line.trim_end_matches(['\r', '\n']).to_string()))
}

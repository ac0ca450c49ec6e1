//! Implements the `Chat` trait on the terminal: messages go to stdout and answers are read from
//! stdin, one per line. Used in test mode.

use crate::api::{Chat, Reply};
use crate::Result;
use anyhow::{bail, Context};
use tokio::io::{AsyncBufReadExt, BufReader, Lines, Stdin};

pub(super) struct ConsoleChat {
    lines: Lines<BufReader<Stdin>>,
}

impl ConsoleChat {
    pub(super) fn new() -> Self {
        Self {
            lines: BufReader::new(tokio::io::stdin()).lines(),
        }
    }
}

#[async_trait::async_trait]
impl Chat for ConsoleChat {
    async fn send(&mut self, text: &str) -> Result<()> {
        println!("{text}");
        Ok(())
    }

    async fn receive(&mut self) -> Result<Reply> {
        match self
            .lines
            .next_line()
            .await
            .context("Failed to read an answer from stdin")?
        {
            Some(line) => Ok(Reply::new(line)),
            None => bail!("stdin was closed while a question was waiting for an answer"),
        }
    }
}

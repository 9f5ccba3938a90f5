//! Line-oriented chat transport.
//!
//! Each input line is `<channel> <nick> <message...>`. Messages whose first
//! word is `fe` or `fes` (optionally `!`-prefixed) are routed; everything
//! else is ignored. Replies go out as `[<channel>] <line>`.

use crate::router::{CommandRouter, Response, VERBS};
use fe_slots_core::environment::ReplySink;
use fe_slots_runtime::StoreError;
use std::io::Write;
use std::sync::{Mutex, PoisonError};
use tokio::io::{AsyncBufRead, AsyncBufReadExt};

/// One routed chat message
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Inbound {
    /// Channel it was said in
    pub channel: String,
    /// Who said it
    pub nick: String,
    /// Words after the command verb
    pub args: Vec<String>,
}

/// Parses a transport line, or `None` when it is not addressed to the bot
#[must_use]
pub fn parse_line(line: &str) -> Option<Inbound> {
    let mut words = line.split_whitespace();
    let channel = words.next()?;
    let nick = words.next()?;
    let verb = words.next()?;

    let verb = verb.strip_prefix('!').unwrap_or(verb).to_ascii_lowercase();
    if !VERBS.contains(&verb.as_str()) {
        return None;
    }

    Some(Inbound {
        channel: channel.to_string(),
        nick: nick.to_string(),
        args: words.map(str::to_string).collect(),
    })
}

/// Writes replies to any `io::Write`, one `[<channel>] <line>` per reply
pub struct WriterReplies<W> {
    out: Mutex<W>,
}

impl<W: Write + Send> WriterReplies<W> {
    /// Wraps a writer
    pub const fn new(out: W) -> Self {
        Self {
            out: Mutex::new(out),
        }
    }

    /// Unwraps the writer
    pub fn into_inner(self) -> W {
        self.out.into_inner().unwrap_or_else(PoisonError::into_inner)
    }
}

impl<W: Write + Send> ReplySink for WriterReplies<W> {
    fn reply(&self, channel: &str, line: &str) {
        let mut out = self.out.lock().unwrap_or_else(PoisonError::into_inner);
        if let Err(error) = writeln!(out, "[{channel}] {line}").and_then(|()| out.flush()) {
            tracing::error!(%error, channel, "Failed to write reply");
        }
    }
}

/// Replies on standard output
pub type StdoutReplies = WriterReplies<std::io::Stdout>;

impl Default for StdoutReplies {
    fn default() -> Self {
        Self::new(std::io::stdout())
    }
}

/// Feeds every routed line from `input` to `router` until EOF.
///
/// Immediate responses are written to `replies` straight away; pending ones
/// arrive there once their effects finish.
///
/// # Errors
///
/// Returns the I/O error if reading `input` fails.
pub async fn run<R>(router: &CommandRouter, input: R, replies: &dyn ReplySink) -> std::io::Result<()>
where
    R: AsyncBufRead + Unpin,
{
    let mut lines = input.lines();

    while let Some(line) = lines.next_line().await? {
        let Some(inbound) = parse_line(&line) else {
            tracing::trace!("Ignoring line not addressed to the bot");
            continue;
        };

        match router.handle(&inbound.channel, &inbound.nick, &inbound.args).await {
            Ok(Response::Immediate(text)) => replies.reply(&inbound.channel, &text),
            Ok(Response::Pending(_)) => {},
            Err(StoreError::ShutdownInProgress) => {
                tracing::warn!("Store is shutting down, no longer reading commands");
                break;
            },
            Err(error) => tracing::error!(%error, "Failed to dispatch command"),
        }
    }

    tracing::info!("Input closed");
    Ok(())
}

//! Interactive query loop.

use runtime::{Backend, Session, ToolDefinition, ToolServer};
use std::future::Future;
use std::io::{self, Write};
use tokio::io::{AsyncBufRead, AsyncBufReadExt};

pub const PROMPT: &str = "\nQuery: ";
pub const EMPTY_HINT: &str = "Please enter a question, or 'quit' to exit.";

/// Something that answers one query at a time.
pub trait Conversation {
    fn turn(&mut self, query: &str) -> impl Future<Output = String>;
}

impl<B: Backend, S: ToolServer> Conversation for Session<B, S> {
    async fn turn(&mut self, query: &str) -> String {
        self.chat(query).await
    }
}

/// What a line of input asks for.
#[derive(Debug, PartialEq, Eq)]
pub enum Input<'a> {
    Empty,
    Quit,
    Query(&'a str),
}

impl<'a> Input<'a> {
    pub fn classify(line: &'a str) -> Self {
        let line = line.trim();
        if line.is_empty() {
            Self::Empty
        } else if line.eq_ignore_ascii_case("quit") {
            Self::Quit
        } else {
            Self::Query(line)
        }
    }
}

/// Read queries until `quit` or end of input, printing each answer.
pub async fn run<C, R, W>(conversation: &mut C, mut input: R, out: &mut W) -> io::Result<()>
where
    C: Conversation,
    R: AsyncBufRead + Unpin,
    W: Write,
{
    let mut line = String::new();
    loop {
        write!(out, "{PROMPT}")?;
        out.flush()?;

        line.clear();
        if input.read_line(&mut line).await? == 0 {
            writeln!(out)?;
            break;
        }

        match Input::classify(&line) {
            Input::Empty => writeln!(out, "{EMPTY_HINT}")?,
            Input::Quit => break,
            Input::Query(query) => {
                let answer = conversation.turn(query).await;
                writeln!(out, "\n{answer}")?;
            }
        }
    }
    Ok(())
}

/// Welcome text listing the server's tools and the model in use.
pub fn banner(
    server: &str,
    description: Option<&str>,
    tools: &[ToolDefinition],
    model: &str,
) -> String {
    let mut text = format!("mcp-chat v{}\n", env!("CARGO_PKG_VERSION"));
    match description {
        Some(description) => text.push_str(&format!(
            "Connected to server `{server}` ({description}) with tools:\n"
        )),
        None => text.push_str(&format!("Connected to server `{server}` with tools:\n")),
    }
    if tools.is_empty() {
        text.push_str("  (none)\n");
    }
    for tool in tools {
        if tool.description.is_empty() {
            text.push_str(&format!("  - {}\n", tool.name));
        } else {
            text.push_str(&format!("  - {}: {}\n", tool.name, tool.description));
        }
    }
    text.push_str(&format!("Model: {model}\nType your queries or 'quit' to exit."));
    text
}

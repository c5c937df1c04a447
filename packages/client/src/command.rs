//! Interactive commands typed at the `listen` prompt.

use parley_server::infrastructure::dto::websocket::ClientEvent;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    Join(String),
    Leave(String),
    Help,
    Quit,
}

impl Command {
    /// The event to send to the relay, if any
    pub fn to_event(&self) -> Option<ClientEvent> {
        match self {
            Self::Join(id) => Some(ClientEvent::JoinConversation(id.clone())),
            Self::Leave(id) => Some(ClientEvent::LeaveConversation(id.clone())),
            Self::Help | Self::Quit => None,
        }
    }
}

pub const HELP: &str = "Commands: /join <conversation>, /leave <conversation>, /help, /quit";

/// Parse one input line.
///
/// Blank lines yield `Ok(None)`.
pub fn parse_command(line: &str) -> Result<Option<Command>, String> {
    let line = line.trim();
    if line.is_empty() {
        return Ok(None);
    }

    let mut parts = line.splitn(2, char::is_whitespace);
    let name = parts.next().unwrap_or_default();
    let arg = parts.next().map(str::trim).filter(|arg| !arg.is_empty());

    match (name, arg) {
        ("/join", Some(id)) => Ok(Some(Command::Join(id.to_string()))),
        ("/leave", Some(id)) => Ok(Some(Command::Leave(id.to_string()))),
        ("/join" | "/leave", None) => Err(format!("{name} needs a conversation id")),
        ("/help", _) => Ok(Some(Command::Help)),
        ("/quit" | "/exit", _) => Ok(Some(Command::Quit)),
        _ => Err(format!("Unknown command: {line}")),
    }
}

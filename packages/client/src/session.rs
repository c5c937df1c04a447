//! Interactive WebSocket session for `listen`.

use futures_util::{SinkExt, StreamExt};
use parley_server::infrastructure::dto::websocket::{ClientEvent, ServerEvent};
use rustyline::{DefaultEditor, error::ReadlineError};
use tokio::sync::mpsc;
use tokio_tungstenite::{connect_async, tungstenite::Message};

use crate::{
    command::{Command, HELP, parse_command},
    error::ClientError,
    formatter::format_event,
};

/// Connect to `url`, join `conversations` and print room traffic until the
/// user quits or the relay closes the connection.
pub async fn run_listen(url: &str, conversations: &[String]) -> Result<(), ClientError> {
    let (ws, _) = connect_async(url).await?;
    tracing::info!("Connected to {}", url);
    let (mut sink, mut stream) = ws.split();

    for id in conversations {
        let frame = serde_json::to_string(&ClientEvent::JoinConversation(id.clone()))?;
        sink.send(Message::text(frame)).await?;
    }

    // rustyline blocks, so read input on a plain thread that does not hold
    // the runtime open at exit.
    let (line_tx, mut line_rx) = mpsc::channel::<String>(16);
    std::thread::spawn(move || {
        if let Err(e) = read_lines(line_tx) {
            tracing::error!("Input error: {}", e);
        }
    });

    println!("{HELP}");

    loop {
        tokio::select! {
            frame = stream.next() => match frame {
                Some(Ok(Message::Text(text))) => print_frame(text.as_str()),
                Some(Ok(Message::Close(_))) | None => {
                    println!("* connection closed by relay");
                    break;
                }
                Some(Ok(_)) => {}
                Some(Err(e)) => return Err(e.into()),
            },
            line = line_rx.recv() => {
                // Input closed (Ctrl+C or Ctrl+D)
                let Some(line) = line else { break };
                match parse_command(&line) {
                    Ok(Some(Command::Quit)) => break,
                    Ok(Some(Command::Help)) => println!("{HELP}"),
                    Ok(Some(command)) => {
                        if let Some(event) = command.to_event() {
                            let frame = serde_json::to_string(&event)?;
                            sink.send(Message::text(frame)).await?;
                        }
                    }
                    Ok(None) => {}
                    Err(message) => println!("! {message}"),
                }
            }
        }
    }

    let _ = sink.send(Message::Close(None)).await;
    tracing::info!("Disconnected");
    Ok(())
}

fn read_lines(tx: mpsc::Sender<String>) -> Result<(), ClientError> {
    let mut editor = DefaultEditor::new()?;
    loop {
        match editor.readline("> ") {
            Ok(line) => {
                let _ = editor.add_history_entry(line.as_str());
                let quit = matches!(parse_command(&line), Ok(Some(Command::Quit)));
                if tx.blocking_send(line).is_err() || quit {
                    return Ok(());
                }
            }
            Err(ReadlineError::Interrupted | ReadlineError::Eof) => return Ok(()),
            Err(e) => return Err(e.into()),
        }
    }
}

fn print_frame(text: &str) {
    match serde_json::from_str::<ServerEvent>(text) {
        Ok(event) => println!("{}", format_event(&event)),
        Err(e) => {
            tracing::debug!("Unrecognized frame ({}): {}", e, text);
            println!("{text}");
        }
    }
}

use std::fs;
use std::path::PathBuf;

use anyhow::Result;
use rustyline::DefaultEditor;
use rustyline::error::ReadlineError;

use crate::chat::{Role, Session, TranscriptStore, Turn, TurnOutcome};
use crate::core::{AppConfig, CREDENTIAL_ENV_VAR, credential};
use crate::gemini::GeminiClient;

const HELP: &str = "Commands: /clear, /download [dir], /quit";

fn print_turn(turn: &Turn) {
    let label = match turn.role {
        Role::User => "you",
        Role::Assistant => "gemini",
    };
    println!("{} [{}]\n{}\n", label, turn.timestamp, turn.content);
}

fn print_warnings(session: &mut Session) {
    for warning in session.take_warnings() {
        println!("⚠️ {}", warning);
    }
}

/// Masked prompt for the key. A terminal that can't prompt is treated
/// the same as the user entering nothing.
fn ask_credential() -> Option<credential::Credential> {
    credential::prompt().unwrap_or_else(|e| {
        tracing::warn!("Unable to prompt for API key: {}", e);
        None
    })
}

fn download(session: &Session, dir: &str) -> Result<PathBuf> {
    let download = session.export()?;
    let path = PathBuf::from(dir).join(&download.filename);
    fs::write(&path, &download.bytes)?;
    Ok(path)
}

async fn submit(session: &mut Session, line: &str) {
    println!("Thinking...");
    let mut outcome = session.submit(line).await;

    if outcome == TurnOutcome::CredentialRequired {
        print_warnings(session);
        println!("Set {} to skip this prompt next time.", CREDENTIAL_ENV_VAR);
        if let Some(credential) = ask_credential()
            && let Some(resumed) = session.supply_credential(credential).await
        {
            outcome = resumed;
        }
    }

    if let TurnOutcome::Completed(reply) = outcome {
        print_turn(&reply);
    }
    print_warnings(session);
}

pub async fn run(config: AppConfig) -> Result<()> {
    let mut rl = DefaultEditor::new()?;

    let credential = credential::resolve(true).unwrap_or_else(|e| {
        tracing::warn!("Unable to prompt for API key: {}", e);
        None
    });

    let store = TranscriptStore::new(&config.history_path);
    let generator = GeminiClient::new(&config.gemini_api_hostname, &config.gemini_model);
    let mut session = Session::open(store, Box::new(generator), credential);

    for turn in session.turns() {
        print_turn(turn);
    }
    print_warnings(&mut session);
    println!("{}", HELP);

    loop {
        let readline = rl.readline(">>> ");
        match readline {
            Ok(line) => {
                let line = line.trim();
                if line.is_empty() {
                    continue;
                }
                let _ = rl.add_history_entry(line);

                match line.split_once(' ').unwrap_or((line, "")) {
                    ("/quit", _) => break,
                    ("/clear", _) => {
                        session.clear();
                        print_warnings(&mut session);
                        println!("Chat history cleared.");
                    }
                    ("/download", dir) => {
                        let dir = if dir.trim().is_empty() { "." } else { dir.trim() };
                        match download(&session, dir) {
                            Ok(path) => println!("Saved {}", path.display()),
                            Err(e) => println!("Error: {}", e),
                        }
                    }
                    ("/help", _) => println!("{}", HELP),
                    _ => submit(&mut session, line).await,
                }
            }
            Err(ReadlineError::Interrupted) => break,
            Err(ReadlineError::Eof) => break,
            Err(err) => {
                println!("Error: {:?}", err);
                break;
            }
        }
    }

    Ok(())
}

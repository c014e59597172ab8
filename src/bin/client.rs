//! Poll-loop terminal client
//!
//! One instance per participant. Reads the case state, renders any
//! new messages, prompts for input while holding the turn, and
//! otherwise sleeps a fixed interval before re-polling. Every poll is
//! a fresh bounded HTTP call; there is no push channel.
//!
//! Usage: accord-client <session-code> [server-url]

use serde_json::{json, Value};
use std::io::{self, BufRead, Write};
use std::process::ExitCode;
use std::thread;
use std::time::Duration;

const POLL_INTERVAL: Duration = Duration::from_secs(20);
const DEFAULT_SERVER: &str = "http://localhost:8000";

fn main() -> ExitCode {
    let args: Vec<String> = std::env::args().collect();
    let Some(session_code) = args.get(1) else {
        eprintln!("usage: accord-client <session-code> [server-url]");
        return ExitCode::FAILURE;
    };
    let server = args
        .get(2)
        .map_or(DEFAULT_SERVER, String::as_str)
        .trim_end_matches('/')
        .to_string();

    // Wire contract: the trailing underscore-delimited token of the
    // session code is the role, everything before it the case id.
    let Some((case_id, role)) = session_code.rsplit_once('_') else {
        eprintln!("invalid session code: {session_code}");
        return ExitCode::FAILURE;
    };
    if role != "party1" && role != "party2" {
        eprintln!("invalid session code: {session_code}");
        return ExitCode::FAILURE;
    }

    println!("Your private mediation session ({session_code})");

    let mut seen = 0usize;
    let stdin = io::stdin();

    loop {
        let case = match fetch_json(&format!("{server}/api/cases/{case_id}")) {
            Ok(v) => v,
            Err(e) => {
                eprintln!("error: {e}");
                thread::sleep(POLL_INTERVAL);
                continue;
            }
        };
        let waiting_for = case["case"]["waiting_for"].as_str().unwrap_or_default();

        match fetch_json(&format!("{server}/api/sessions/{session_code}/messages")) {
            Ok(transcript) => seen = render_new_messages(&transcript, seen),
            Err(e) => eprintln!("error: {e}"),
        }

        if waiting_for == role {
            print!("> ");
            let _ = io::stdout().flush();

            let mut line = String::new();
            match stdin.lock().read_line(&mut line) {
                Ok(0) => return ExitCode::SUCCESS, // EOF
                Ok(_) => {}
                Err(e) => {
                    eprintln!("error: {e}");
                    return ExitCode::FAILURE;
                }
            }
            let content = line.trim();
            if content.is_empty() {
                continue;
            }

            // A failed relay is surfaced and left for manual retry.
            if let Err(e) = send_message(&server, session_code, content) {
                eprintln!("error sending message: {e}");
            }
        } else {
            println!("Waiting for the other party...");
            thread::sleep(POLL_INTERVAL);
        }
    }
}

fn fetch_json(url: &str) -> Result<Value, String> {
    ureq::get(url)
        .call()
        .map_err(describe)?
        .into_json::<Value>()
        .map_err(|e| e.to_string())
}

fn send_message(server: &str, session_code: &str, content: &str) -> Result<(), String> {
    ureq::post(&format!("{server}/api/sessions/{session_code}/messages"))
        .send_json(json!({
            "user_id": format!("user_{session_code}"),
            "content": content,
        }))
        .map_err(describe)?;
    Ok(())
}

/// Print messages past the already-rendered prefix; returns the new count.
fn render_new_messages(transcript: &Value, seen: usize) -> usize {
    let Some(messages) = transcript["messages"].as_array() else {
        return seen;
    };
    for msg in messages.iter().skip(seen) {
        let user = msg["user_id"].as_str().unwrap_or("?");
        let content = msg["content"].as_str().unwrap_or_default();
        if user == "mediator" {
            println!("[mediator] {content}");
        } else {
            println!("[you] {content}");
        }
    }
    messages.len().max(seen)
}

fn describe(e: ureq::Error) -> String {
    match e {
        ureq::Error::Status(code, response) => {
            let body = response.into_string().unwrap_or_default();
            format!("HTTP {code}: {body}")
        }
        other => other.to_string(),
    }
}

use std::io::Write;

use anyhow::Result;
use tokio::io::{AsyncBufReadExt, BufReader};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};
use worldview_client::{
    ChatSession, FileStorage, SessionStore, StreamClient, TurnHandle, TurnStatus,
};

const DEFAULT_API_URL: &str = "http://127.0.0.1:8000";
const DEFAULT_SESSION_FILE: &str = ".worldview-session.json";

#[tokio::main]
async fn main() -> Result<()> {
    dotenvy::dotenv().ok();
    init_logging();

    let api_url = std::env::var("WORLDVIEW_API_URL").unwrap_or_else(|_| DEFAULT_API_URL.to_string());
    let session_file =
        std::env::var("WORLDVIEW_SESSION_FILE").unwrap_or_else(|_| DEFAULT_SESSION_FILE.to_string());

    let store = SessionStore::new(FileStorage::open(&session_file));
    let mut session = ChatSession::new(store, StreamClient::new(&api_url)?)?;

    println!("Worldview assistant at {} (thread {})", api_url, session.thread_id());
    println!("Commands: /new, /history, /quit. Ctrl-C cancels a running answer.");

    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    loop {
        print!("> ");
        std::io::stdout().flush()?;

        let Some(line) = lines.next_line().await? else {
            break;
        };
        let line = line.trim();

        match line {
            "" => continue,
            "/quit" | "/exit" => break,
            "/new" => {
                let id = session.new_thread().await?;
                println!("Started thread {}", id);
            }
            "/history" => {
                for message in session.history() {
                    println!("[{}] {}", message.role.as_str(), message.content);
                }
            }
            input => {
                let handle = session.submit(input).await?;
                let handle = render(&session, handle).await;
                let snapshot = session.complete(handle).await?;

                match (snapshot.status, snapshot.error) {
                    (_, Some(error)) => println!("\n[error] {}", error),
                    (TurnStatus::Done, None) => println!(),
                    (TurnStatus::Cancelled, None) => println!("\n[cancelled]"),
                    (status, None) => println!("\n[connection closed: {:?}]", status),
                }
            }
        }
    }

    Ok(())
}

/// Print the growing answer until the turn finishes; Ctrl-C cancels
async fn render<S: worldview_client::KeyValueStorage>(
    session: &ChatSession<S>,
    mut handle: TurnHandle,
) -> TurnHandle {
    let mut printed = String::new();

    loop {
        tokio::select! {
            more = handle.changed() => {
                if let Some(latest) = handle.latest() {
                    print_delta(&mut printed, &latest.output);
                }
                if !more || handle.status().is_finished() {
                    break;
                }
            }
            _ = tokio::signal::ctrl_c() => {
                session.cancel().await;
                break;
            }
        }
    }

    handle
}

fn print_delta(printed: &mut String, output: &str) {
    let mut stdout = std::io::stdout();
    match output.strip_prefix(printed.as_str()) {
        Some(delta) => {
            let _ = write!(stdout, "{}", delta);
        }
        None => {
            let _ = write!(stdout, "\n{}", output);
        }
    }
    let _ = stdout.flush();
    *printed = output.to_string();
}

fn init_logging() {
    let env_filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"));

    tracing_subscriber::registry()
        .with(env_filter)
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();
}

//! Interactive input source backed by stdin.

use async_trait::async_trait;
use patchloom_core::input::InputSource;
use tokio::io::{AsyncBufReadExt, BufReader};
use tokio::sync::mpsc;
use tokio::sync::Mutex;

/// Reads stdin line by line on a background task. Blank lines are skipped;
/// `exit`/`quit` (or EOF) close the source, which the agent loop treats as
/// end-of-input.
pub struct StdinSource {
    rx: Mutex<mpsc::Receiver<String>>,
}

impl StdinSource {
    pub fn start() -> Self {
        let (tx, rx) = mpsc::channel(32);

        tokio::spawn(async move {
            let mut lines = BufReader::new(tokio::io::stdin()).lines();
            loop {
                match lines.next_line().await {
                    Ok(Some(line)) => {
                        let line = line.trim().to_string();
                        if line.is_empty() {
                            continue;
                        }
                        if matches!(line.as_str(), "exit" | "quit" | "/exit" | "/quit") {
                            break;
                        }
                        if tx.send(line).await.is_err() {
                            break;
                        }
                    }
                    Ok(None) => break, // EOF (Ctrl+D)
                    Err(_) => break,
                }
            }
        });

        Self { rx: Mutex::new(rx) }
    }
}

#[async_trait]
impl InputSource for StdinSource {
    async fn next(&self, block: bool) -> Option<String> {
        let mut rx = self.rx.lock().await;
        if block {
            {
                use std::io::Write;
                let mut stdout = std::io::stdout().lock();
                let _ = write!(stdout, "> ");
                let _ = stdout.flush();
            }
            rx.recv().await
        } else {
            rx.try_recv().ok()
        }
    }
}

//! Terminal implementations of the operator capabilities.

use async_trait::async_trait;
use tokio::io::{AsyncBufReadExt, AsyncRead, AsyncWriteExt, BufReader, Lines, Stdin};
use tokio::sync::Mutex;
use tracing::debug;

use stocktake_client::{ConfirmPrompt, Confirmer, Notification, Notifier, Tone};

/// Prints notifications to stderr so stdout stays machine-readable.
pub struct ConsoleNotifier;

impl Notifier for ConsoleNotifier {
    fn notify(&self, n: Notification) {
        let marker = match n.tone {
            Tone::Success => "ok",
            Tone::Info => "note",
            Tone::Failure => "error",
        };
        eprintln!("[{}] {}: {}", marker, n.title, n.message);
    }
}

/// Asks on the terminal; only "y" or "yes" confirms. EOF means no.
///
/// One line reader serves every prompt, so input buffered past an answer is
/// kept for the next question.
pub struct StdinConfirmer<R = Stdin> {
    answers: Mutex<Lines<BufReader<R>>>,
}

impl StdinConfirmer {
    pub fn new() -> Self {
        Self::from_reader(tokio::io::stdin())
    }
}

impl Default for StdinConfirmer {
    fn default() -> Self {
        Self::new()
    }
}

impl<R: AsyncRead + Unpin> StdinConfirmer<R> {
    pub fn from_reader(reader: R) -> Self {
        StdinConfirmer {
            answers: Mutex::new(BufReader::new(reader).lines()),
        }
    }
}

#[async_trait]
impl<R: AsyncRead + Unpin + Send> Confirmer for StdinConfirmer<R> {
    async fn confirm(&self, prompt: &ConfirmPrompt) -> bool {
        let mut answers = self.answers.lock().await;

        let mut stderr = tokio::io::stderr();
        let question = format!("{}\n{} [y/N] ", prompt.action, prompt.message);
        if stderr.write_all(question.as_bytes()).await.is_err() {
            return false;
        }
        let _ = stderr.flush().await;

        match answers.next_line().await {
            Ok(Some(line)) => is_yes(&line),
            Ok(None) | Err(_) => {
                debug!(action = %prompt.action, "No answer on stdin");
                false
            }
        }
    }
}

fn is_yes(answer: &str) -> bool {
    matches!(answer.trim().to_lowercase().as_str(), "y" | "yes")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_answers_come_from_consecutive_lines() {
        let confirmer = StdinConfirmer::from_reader(&b"yes\nn\ny\n"[..]);
        let prompt = ConfirmPrompt::new("Delete stock-take", "Really?");

        assert!(confirmer.confirm(&prompt).await);
        assert!(!confirmer.confirm(&prompt).await);
        assert!(confirmer.confirm(&prompt).await);
        // input exhausted
        assert!(!confirmer.confirm(&prompt).await);
    }

    #[test]
    fn test_is_yes() {
        assert!(is_yes("y\n"));
        assert!(is_yes(" YES "));
        assert!(!is_yes(""));
        assert!(!is_yes("n"));
        assert!(!is_yes("yep"));
    }
}

/*!
 * Translation invoker.
 *
 * Sends the fixed system instructions plus the assembled context to the
 * engine exactly once. The reply is echoed to stdout as it streams in and
 * buffered in full; callers only see it after the stream has ended. There is
 * no retry: a failed call ends the run.
 */

use indicatif::{ProgressBar, ProgressStyle};
use log::{info, warn};
use std::io::Write;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::{Duration, Instant};

use crate::errors::ProviderError;
use crate::file_utils::FileManager;
use crate::providers::{ask, Completion, Conversation, Engine};

/// Invokes the engine for one focal file
#[derive(Debug, Clone)]
pub struct TranslationInvoker {
    engine: Arc<dyn Engine>,
    system_prompt: String,
    transcript_dir: PathBuf,
    /// Echo the stream to stdout and show a waiting spinner
    echo: bool,
}

/// Result of one engine call
#[derive(Debug, Clone)]
pub struct Invocation {
    pub completion: Completion,
    /// Conversation including the reply, for follow-up turns
    pub conversation: Conversation,
}

impl TranslationInvoker {
    pub fn new(engine: Arc<dyn Engine>, system_prompt: impl Into<String>, transcript_dir: impl Into<PathBuf>) -> Self {
        Self {
            engine,
            system_prompt: system_prompt.into(),
            transcript_dir: transcript_dir.into(),
            echo: true,
        }
    }

    /// Disable stdout echo and the spinner
    pub fn quiet(mut self) -> Self {
        self.echo = false;
        self
    }

    /// Persist the prompt for audit; failure only warns
    pub async fn record_transcript(&self, focal: &Path, context: &str) -> Option<PathBuf> {
        record_transcript(&self.transcript_dir, focal, &self.system_prompt, context).await
    }

    /// Run the single engine call for `context`
    pub async fn invoke(&self, context: &str) -> Result<Invocation, ProviderError> {
        info!("Asking {} ({} chars of context)", self.engine.describe(), context.len());
        let start = Instant::now();

        let spinner = if self.echo { Some(waiting_spinner()) } else { None };
        let echo = self.echo;
        let mut first_chunk = true;
        let mut sink = |chunk: &str| {
            if first_chunk {
                first_chunk = false;
                if let Some(spinner) = &spinner {
                    spinner.finish_and_clear();
                }
            }
            if echo {
                let mut stdout = std::io::stdout();
                let _ = stdout.write_all(chunk.as_bytes());
                let _ = stdout.flush();
            }
        };

        let result = ask(self.engine.as_ref(), Conversation::new(self.system_prompt.clone()), context, &mut sink).await;

        if let Some(spinner) = &spinner {
            spinner.finish_and_clear();
        }
        if echo {
            println!();
        }

        let (completion, conversation) = result?;
        match completion.usage {
            Some(usage) => info!(
                "Engine finished in {:.1}s: {} input tokens ({} cached), {} output tokens",
                start.elapsed().as_secs_f64(),
                usage.input_tokens,
                usage.cached_input_tokens,
                usage.output_tokens
            ),
            None => info!("Engine finished in {:.1}s", start.elapsed().as_secs_f64()),
        }

        Ok(Invocation { completion, conversation })
    }
}

/// Write the prompt transcript, logging instead of failing
pub async fn record_transcript(dir: &Path, focal: &Path, system: &str, context: &str) -> Option<PathBuf> {
    match FileManager::write_transcript(dir, focal, system, context).await {
        Ok(path) => {
            info!("Prompt transcript saved to {:?}", path);
            Some(path)
        }
        Err(e) => {
            warn!("Could not save prompt transcript: {:#}", e);
            None
        }
    }
}

fn waiting_spinner() -> ProgressBar {
    let spinner = ProgressBar::new_spinner();
    spinner.set_style(
        ProgressStyle::default_spinner()
            .template("{spinner:.cyan} {msg}")
            .unwrap_or_else(|_| ProgressStyle::default_spinner()),
    );
    spinner.set_message("Waiting for the engine...");
    spinner.enable_steady_tick(Duration::from_millis(120));
    spinner
}

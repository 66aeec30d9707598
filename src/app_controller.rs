use log::{debug, info, warn};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::{Duration, Instant};

use crate::app_config::{Config, EngineVendor, ModelEntry};
use crate::context::ContextDocument;
use crate::deps::{DependencyResolver, Listers, Resolution};
use crate::errors::{AppError, ConfigError};
use crate::invoker::{record_transcript, TranslationInvoker};
use crate::prompts::PromptTemplate;
use crate::providers::anthropic::Anthropic;
use crate::providers::openai::OpenAI;
use crate::providers::Engine;
use crate::response_parser::parse_response;
use crate::writer::{FileWriter, WriteReport};

// @module: Application controller for the translation pipeline

/// Per-run switches
#[derive(Debug, Clone, Default)]
pub struct RunOptions {
    /// Resolve, assemble and save the transcript, but do not call the engine
    pub dry_run: bool,
}

/// How a run ended
#[derive(Debug, Clone, PartialEq)]
pub enum RunOutcome {
    /// At least one file was written
    Written(WriteReport),
    /// The engine answered but nothing matched the output language
    NothingWritten(WriteReport),
    /// The engine was not called
    DryRun {
        transcript: Option<PathBuf>,
        context: String,
    },
}

/// Resolved and assembled inputs for the engine call
#[derive(Debug, Clone)]
pub struct PreparedRun {
    pub resolution: Resolution,
    pub document: ContextDocument,
    pub rendered: String,
}

/// Where the engine of a run comes from
enum EngineSource {
    /// Supplied by the caller
    Ready(Arc<dyn Engine>),
    /// Built from a model entry once the closure has resolved
    Deferred(ModelEntry),
}

/// Main application controller: resolve, assemble, invoke, parse, write
pub struct Controller {
    // @field: App configuration
    config: Config,
    resolver: DependencyResolver,
    engine: EngineSource,
    writer: FileWriter,
    options: RunOptions,
    echo: bool,
}

impl Controller {
    /// Build the controller for a model key, with subprocess listers and a
    /// real engine client
    ///
    /// The model key is checked before anything else. The credential is read
    /// only after the closure resolved, and not at all for dry runs.
    pub fn from_config(config: Config, model_key: Option<&str>, options: RunOptions) -> Result<Self, AppError> {
        let key = model_key.unwrap_or(&config.default_model).to_string();
        let entry = config.model(&key)?.clone();

        let listers = Listers::from_languages(&config.languages);
        let mut controller = Self::assemble(config, listers, EngineSource::Deferred(entry), options);
        controller.echo = true;
        if let Ok(cwd) = std::env::current_dir() {
            controller.writer = FileWriter::new(cwd);
        }
        Ok(controller)
    }

    /// Build the controller from explicit parts
    pub fn with_parts(config: Config, listers: Listers, engine: Arc<dyn Engine>, options: RunOptions) -> Self {
        Self::assemble(config, listers, EngineSource::Ready(engine), options)
    }

    fn assemble(config: Config, listers: Listers, engine: EngineSource, options: RunOptions) -> Self {
        let resolver = DependencyResolver::new(config.languages.clone(), config.shared_namespace.clone(), listers);
        Self {
            config,
            resolver,
            engine,
            writer: FileWriter::new("."),
            options,
            echo: false,
        }
    }

    /// Resolve relative output paths against `dir` instead of the working directory
    pub fn with_output_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.writer = FileWriter::new(dir);
        self
    }

    /// Resolve dependencies and assemble the context without calling the engine
    pub async fn prepare(&self, focal: &Path) -> Result<PreparedRun, AppError> {
        let resolution = self.resolver.resolve(focal).await?;
        let document = ContextDocument::assemble(&resolution);
        let rendered = document.render(&self.config.languages);
        debug!("Context digest: {}", ContextDocument::digest(&rendered));

        Ok(PreparedRun {
            resolution,
            document,
            rendered,
        })
    }

    /// Run the whole pipeline for one focal file
    pub async fn run(&self, focal: &Path) -> Result<RunOutcome, AppError> {
        let start_time = Instant::now();
        let from = self.config.languages.require_side(focal)?;
        let to = from.counterpart();

        let prepared = self.prepare(focal).await?;
        let system_prompt = PromptTemplate::file_translator().render(&self.config.languages, from);

        let transcript_dir = self.config.transcript_dir();

        if self.options.dry_run {
            let transcript = record_transcript(&transcript_dir, focal, &system_prompt, &prepared.rendered).await;
            info!("Dry run: {} context block(s) assembled, engine not called", prepared.document.blocks().len());
            return Ok(RunOutcome::DryRun {
                transcript,
                context: prepared.rendered,
            });
        }

        let engine = match &self.engine {
            EngineSource::Ready(engine) => engine.clone(),
            EngineSource::Deferred(entry) => build_engine(&self.config, entry)?,
        };

        let invoker = TranslationInvoker::new(engine, system_prompt, transcript_dir);
        let invoker = if self.echo { invoker } else { invoker.quiet() };

        invoker.record_transcript(focal, &prepared.rendered).await;
        let invocation = invoker.invoke(&prepared.rendered).await?;

        let records = parse_response(&invocation.completion.text, &self.config.languages);
        debug!("Parsed {} record(s) from the engine response", records.len());

        let expected_extension = &self.config.languages.profile(to).extension;
        let report = self.writer.write_records(&records, expected_extension).await;

        info!("Finished in {}", Self::format_duration(start_time.elapsed()));

        if report.is_empty() {
            warn!(
                "The engine response contained no .{} file; nothing was written",
                expected_extension
            );
            return Ok(RunOutcome::NothingWritten(report));
        }

        Ok(RunOutcome::Written(report))
    }

    // @returns: Human readable duration
    fn format_duration(duration: Duration) -> String {
        let total_seconds = duration.as_secs();
        let minutes = total_seconds / 60;
        let seconds = total_seconds % 60;

        if minutes > 0 {
            format!("{}m {}s", minutes, seconds)
        } else {
            format!("{}.{:03}s", seconds, duration.subsec_millis())
        }
    }
}

/// Create the engine client for a model entry
pub fn build_engine(config: &Config, entry: &ModelEntry) -> Result<Arc<dyn Engine>, ConfigError> {
    let provider = config.provider(entry.vendor).ok_or_else(|| {
        ConfigError::Invalid(format!("no provider configured for vendor '{}'", entry.vendor))
    })?;
    let api_key = provider.read_credential()?;

    let engine: Arc<dyn Engine> = match entry.vendor {
        EngineVendor::Anthropic => Arc::new(
            Anthropic::new(api_key, &provider.endpoint, &entry.model, entry.max_tokens, provider.timeout_secs)
                .temperature(config.temperature),
        ),
        EngineVendor::OpenAI => Arc::new(
            OpenAI::new(api_key, &provider.endpoint, &entry.model, entry.max_tokens, provider.timeout_secs)
                .temperature(config.temperature),
        ),
    };

    info!("Using {} ({})", engine.describe(), entry.vendor.display_name());
    Ok(engine)
}

//! Core Extractor implementation

use crate::chunking::TextChunker;
use crate::config::ExtractorConfig;
use crate::dates::resolve_date;
use crate::dedup::deduplicate_with;
use crate::error::ExtractorError;
use crate::normalize::normalize;
use crate::parser::{parse_candidates, parse_minutes, parse_summary, parse_tasks};
use crate::prompt::{PromptBuilder, MINUTES_PREAMBLE, SUMMARY_PREAMBLE, SYSTEM_PROMPT};
use crate::types::{RunOutput, RunRequest, RunStats, TextChunk};
use futures::{stream, StreamExt, TryStreamExt};
use std::sync::Arc;
use std::time::Instant;
use tasklift_domain::{
    score, CandidateTask, CompletionOptions, ConfidenceFeatures, EventSink, ExtractionContext,
    InputType, MeetingMinutes, ModelCapability, ModelError, ParseError, ParsedDocument,
    PipelineEvent, Stage, StakeholderSummary, Task, TracingSink,
};
use tasklift_llm::{detect_items, ModelClient};
use tasklift_parsers::ParserRegistry;
use tracing::{debug, info};
use uuid::Uuid;

/// Confidence at or above which a task counts as high confidence
pub const HIGH_CONFIDENCE: f64 = 0.8;

/// The Extractor turns one document into tasks, a summary and minutes
///
/// Stages run strictly in sequence: parse, clean, chunk, candidate
/// extraction, validation, post-processing, deduplication, summary and
/// meeting minutes. Only the per-chunk extraction calls overlap, and
/// their results are reassembled in chunk order.
///
/// The extractor holds no per-run state, so one instance can serve
/// concurrent runs.
pub struct Extractor {
    model: Arc<dyn ModelCapability>,
    parsers: Option<ParserRegistry>,
    config: ExtractorConfig,
    sink: Arc<dyn EventSink>,
}

impl Extractor {
    /// Create an extractor, validating the configuration
    pub fn new(
        model: Arc<dyn ModelCapability>,
        config: ExtractorConfig,
    ) -> Result<Self, ExtractorError> {
        config.validate().map_err(ExtractorError::Config)?;
        Ok(Self {
            model,
            parsers: None,
            config,
            sink: Arc::new(TracingSink),
        })
    }

    /// Report pipeline events to `sink` instead of `tracing`
    pub fn with_sink(mut self, sink: Arc<dyn EventSink>) -> Self {
        self.sink = sink;
        self
    }

    /// Use a custom parser registry
    ///
    /// By default every run builds the built-in registry from the email
    /// settings in the configuration.
    pub fn with_parsers(mut self, parsers: ParserRegistry) -> Self {
        self.parsers = Some(parsers);
        self
    }

    /// Active configuration
    pub fn config(&self) -> &ExtractorConfig {
        &self.config
    }

    /// Execute one extraction run
    pub async fn run(&self, request: RunRequest) -> Result<RunOutput, ExtractorError> {
        let started = Instant::now();
        let run_id = request
            .run_id
            .clone()
            .unwrap_or_else(|| Uuid::now_v7().to_string());
        let client = ModelClient::with_sink(
            Arc::clone(&self.model),
            self.config.retry.clone(),
            Arc::clone(&self.sink),
        );
        let mut stats = RunStats::default();

        info!(
            run_id = %run_id,
            input_type = %request.input_type,
            model = client.model_name(),
            "Starting extraction run"
        );

        // Parse
        let stage = self.enter(&run_id, Stage::Parse);
        let document = self.parse(&request).await?;
        stage.leave();

        // Clean
        let stage = self.enter(&run_id, Stage::Clean);
        let cleaned = normalize(&document.text);
        if cleaned.len() > self.config.max_text_length {
            return Err(ExtractorError::TextTooLong(
                cleaned.len(),
                self.config.max_text_length,
            ));
        }
        stage.leave();

        let mut context = ExtractionContext::new(
            request.reference_time,
            request.timezone.clone(),
            request.input_type,
        );
        context.source_name = request.source_name.clone();
        context.document_metadata = Some(document.metadata.clone());
        let prompts = PromptBuilder::new(&context);

        // Chunk
        let stage = self.enter(&run_id, Stage::Chunk);
        let chunks =
            TextChunker::new(self.config.max_chunk_size, self.config.chunk_overlap).chunk(&cleaned);
        stats.chunk_count = chunks.len();
        debug!(chunks = chunks.len(), chars = cleaned.len(), "Text chunked");
        stage.leave();

        // Candidate extraction
        let stage = self.enter(&run_id, Stage::CandidateExtraction);
        let candidates = self.extract_candidates(&client, &prompts, &chunks).await?;
        stats.candidate_count = candidates.len();
        stage.leave();

        // Validation
        let stage = self.enter(&run_id, Stage::Validation);
        let mut tasks = self
            .validate_candidates(&client, &prompts, &run_id, candidates)
            .await?;
        stats.validated_count = tasks.len();
        stage.leave();

        // Post-process
        let stage = self.enter(&run_id, Stage::PostProcess);
        for task in &mut tasks {
            self.post_process(task, &run_id, &request);
        }
        stage.leave();

        // Deduplicate
        let stage = self.enter(&run_id, Stage::Deduplicate);
        let before = tasks.len();
        let tasks = deduplicate_with(tasks, self.config.dedup_policy);
        if tasks.len() < before {
            self.sink.emit(PipelineEvent::TasksMerged {
                before,
                after: tasks.len(),
            });
        }
        stats.merged_count = before - tasks.len();
        stats.final_task_count = tasks.len();
        stats.high_confidence_count = tasks
            .iter()
            .filter(|t| t.confidence >= HIGH_CONFIDENCE)
            .count();
        stage.leave();

        // Summarize
        let stage = self.enter(&run_id, Stage::Summarize);
        let summary = self.summarize(&client, &prompts, &cleaned, &tasks).await?;
        stage.leave();

        // Meeting minutes
        let meeting_minutes = if self.config.extract_meeting_minutes {
            let stage = self.enter(&run_id, Stage::MeetingMinutes);
            let minutes = self.meeting_minutes(&client, &prompts, &cleaned).await?;
            stage.leave();
            Some(minutes)
        } else {
            None
        };

        let calls = client.stats();
        stats.model_call_count = calls.calls;
        stats.model_attempt_count = calls.attempts;
        stats.wall_clock_ms = started.elapsed().as_millis() as u64;

        info!(
            run_id = %run_id,
            tasks = stats.final_task_count,
            model_calls = stats.model_call_count,
            elapsed_ms = stats.wall_clock_ms,
            "Extraction run complete"
        );

        Ok(RunOutput {
            run_id,
            tasks,
            summary,
            meeting_minutes,
            document_metadata: document.metadata,
            stats,
        })
    }

    async fn parse(&self, request: &RunRequest) -> Result<ParsedDocument, ExtractorError> {
        if request.input_type == InputType::Text {
            if let Some(text) = request.text.as_deref().filter(|t| !t.trim().is_empty()) {
                return Ok(ParsedDocument::from_text(text));
            }
        }

        let bytes = request.bytes.clone().ok_or_else(|| {
            let needed = if request.input_type == InputType::Text {
                "non-empty text or bytes"
            } else {
                "bytes"
            };
            ExtractorError::Input(format!("{} input requires {}", request.input_type, needed))
        })?;

        let parser = self
            .registry()
            .get(request.input_type)
            .ok_or_else(|| ExtractorError::Parse {
                stage: Stage::Parse,
                source: ParseError::Unsupported(request.input_type.to_string()),
            })?;

        let document = tokio::task::spawn_blocking(move || parser.parse(&bytes))
            .await
            .map_err(|e| ExtractorError::Internal {
                stage: Stage::Parse,
                message: e.to_string(),
            })?
            .map_err(|source| ExtractorError::Parse {
                stage: Stage::Parse,
                source,
            })?;

        debug!(
            words = document.metadata.word_count,
            sections = document.sections.as_ref().map_or(0, Vec::len),
            "Document parsed"
        );
        Ok(document)
    }

    fn registry(&self) -> ParserRegistry {
        match &self.parsers {
            Some(parsers) => parsers.clone(),
            None => ParserRegistry::with_defaults(
                self.config.parse_email_threads,
                self.config.max_email_depth,
                Arc::clone(&self.sink),
            ),
        }
    }

    async fn extract_candidates(
        &self,
        client: &ModelClient,
        prompts: &PromptBuilder<'_>,
        chunks: &[TextChunk],
    ) -> Result<Vec<CandidateTask>, ExtractorError> {
        let options = CompletionOptions {
            system_preamble: Some(SYSTEM_PROMPT.to_string()),
            temperature: self.config.temperature,
            json_mode: true,
        };

        let per_chunk: Vec<Vec<CandidateTask>> = stream::iter(chunks)
            .map(|chunk| self.extract_chunk(client, prompts, chunk, &options))
            .buffered(self.config.chunk_concurrency)
            .try_collect()
            .await?;

        Ok(per_chunk.into_iter().flatten().collect())
    }

    async fn extract_chunk(
        &self,
        client: &ModelClient,
        prompts: &PromptBuilder<'_>,
        chunk: &TextChunk,
        options: &CompletionOptions,
    ) -> Result<Vec<CandidateTask>, ExtractorError> {
        let candidates = if chunk.text.trim().is_empty() {
            Vec::new()
        } else {
            let value = client
                .complete_json(&prompts.candidates(&chunk.text), options)
                .await
                .map_err(model_error(Stage::CandidateExtraction))?;
            parse_candidates(detect_items(value))
        };

        self.sink.emit(PipelineEvent::ChunkExtracted {
            chunk: chunk.index,
            candidates: candidates.len(),
        });
        Ok(candidates)
    }

    async fn validate_candidates(
        &self,
        client: &ModelClient,
        prompts: &PromptBuilder<'_>,
        run_id: &str,
        candidates: Vec<CandidateTask>,
    ) -> Result<Vec<Task>, ExtractorError> {
        let before = candidates.len();
        let survivors: Vec<CandidateTask> = candidates
            .into_iter()
            .filter(CandidateTask::has_source_quote)
            .collect();
        self.sink.emit(PipelineEvent::CandidatesFiltered {
            stage: Stage::Validation,
            before,
            after: survivors.len(),
        });

        if survivors.is_empty() {
            self.sink.emit(PipelineEvent::ValidationSkipped {
                run_id: run_id.to_string(),
            });
            return Ok(Vec::new());
        }

        let prompt = prompts
            .validation(&survivors)
            .map_err(|e| ExtractorError::Internal {
                stage: Stage::Validation,
                message: e.to_string(),
            })?;
        let options = CompletionOptions {
            system_preamble: Some(SYSTEM_PROMPT.to_string()),
            temperature: self.config.validation_temperature(),
            json_mode: true,
        };

        let value = client
            .complete_json(&prompt, &options)
            .await
            .map_err(model_error(Stage::Validation))?;
        Ok(parse_tasks(detect_items(value)))
    }

    fn post_process(&self, task: &mut Task, run_id: &str, request: &RunRequest) {
        task.run_id = run_id.to_string();

        if task.due_date_iso.is_none() {
            if let Some(raw) = task.due_date_raw.as_deref() {
                match resolve_date(raw, request.reference_time, &request.timezone) {
                    Some(resolved) => task.due_date_iso = Some(resolved),
                    None => {
                        self.sink.emit(PipelineEvent::DateUnresolved {
                            phrase: raw.to_string(),
                        });
                    }
                }
            }
        }

        task.confidence = score(ConfidenceFeatures::from(&*task));
    }

    async fn summarize(
        &self,
        client: &ModelClient,
        prompts: &PromptBuilder<'_>,
        cleaned: &str,
        tasks: &[Task],
    ) -> Result<StakeholderSummary, ExtractorError> {
        let titles: Vec<String> = if self.config.include_tasks_in_summary {
            tasks.iter().map(|t| t.title.clone()).collect()
        } else {
            Vec::new()
        };
        let options = CompletionOptions {
            system_preamble: Some(SUMMARY_PREAMBLE.to_string()),
            temperature: self.config.temperature,
            json_mode: true,
        };

        let value = client
            .complete_json(&prompts.summary(cleaned, &titles), &options)
            .await
            .map_err(model_error(Stage::Summarize))?;
        Ok(parse_summary(&value))
    }

    async fn meeting_minutes(
        &self,
        client: &ModelClient,
        prompts: &PromptBuilder<'_>,
        cleaned: &str,
    ) -> Result<MeetingMinutes, ExtractorError> {
        let options = CompletionOptions {
            system_preamble: Some(MINUTES_PREAMBLE.to_string()),
            temperature: self.config.temperature,
            json_mode: true,
        };

        let value = client
            .complete_json(&prompts.minutes(cleaned), &options)
            .await
            .map_err(model_error(Stage::MeetingMinutes))?;
        Ok(parse_minutes(&value))
    }

    fn enter<'a>(&'a self, run_id: &'a str, stage: Stage) -> StageSpan<'a> {
        self.sink.emit(PipelineEvent::StageStarted {
            run_id: run_id.to_string(),
            stage,
        });
        StageSpan {
            sink: self.sink.as_ref(),
            run_id,
            stage,
            started: Instant::now(),
        }
    }
}

/// An entered stage; dropping it without `leave` reports nothing
struct StageSpan<'a> {
    sink: &'a dyn EventSink,
    run_id: &'a str,
    stage: Stage,
    started: Instant,
}

impl StageSpan<'_> {
    fn leave(self) {
        self.sink.emit(PipelineEvent::StageCompleted {
            run_id: self.run_id.to_string(),
            stage: self.stage,
            elapsed_ms: self.started.elapsed().as_millis() as u64,
        });
    }
}

fn model_error(stage: Stage) -> impl FnOnce(ModelError) -> ExtractorError {
    move |source| ExtractorError::Model { stage, source }
}

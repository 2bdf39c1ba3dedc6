use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use log::{debug, info, warn};
use tracing::{info_span, Instrument};

use crate::archive::{self, WorkDir};
use crate::classify::{describe_file, is_code_file};
use crate::diagram::{fallback_diagram, is_flowchart, strip_fences};
use crate::fragments::{build_fragments, FragmentStore};
use crate::llm::prompts::{
    parse_summaries, PromptBuilder, DIAGRAM_SYSTEM_PROMPT, SUMMARY_SYSTEM_PROMPT,
};
use crate::llm::{generate_json, TextGenerator};
use crate::project::{build_tree, sanitized_preview, FileSummary, ProjectScanner};
use crate::sanitize::SanitizationEngine;
use crate::task::{ProjectStats, TaskPhase, TaskResult};

use super::config::PipelineConfig;
use super::context::PipelineContext;
use super::error::{PipelineError, PipelineWarning};
use super::progress::{ProgressEvent, ProgressReporter};

/// Everything a successful run produced.
#[derive(Debug)]
pub struct PipelineOutput {
    pub result: TaskResult,
    pub summaries: Vec<FileSummary>,
    pub warnings: Vec<PipelineWarning>,
}

pub struct Pipeline {
    config: Arc<PipelineConfig>,
    scanner: Arc<ProjectScanner>,
    sanitizer: Arc<SanitizationEngine>,
    generator: Arc<dyn TextGenerator>,
    fragment_store: Arc<dyn FragmentStore>,
}

impl Pipeline {
    pub fn new(
        config: Arc<PipelineConfig>,
        generator: Arc<dyn TextGenerator>,
        fragment_store: Arc<dyn FragmentStore>,
    ) -> Self {
        let scanner = Arc::new(ProjectScanner::with_max_file_size(config.max_file_size));
        Self {
            config,
            scanner,
            sanitizer: Arc::new(SanitizationEngine::new()),
            generator,
            fragment_store,
        }
    }

    /// Runs every stage for one uploaded archive.
    ///
    /// The extraction directory is removed before the terminal event is
    /// reported, whatever the outcome.
    pub async fn run(
        &self,
        mut ctx: PipelineContext,
        progress: &dyn ProgressReporter,
    ) -> Result<PipelineOutput, PipelineError> {
        let span = info_span!("pipeline",
            task_id = %ctx.task_id,
            archive_bytes = ctx.archive.len(),
        );

        let outcome = self.run_stages(&mut ctx, progress).instrument(span).await;
        drop(ctx.work_dir.take());

        match outcome {
            Ok(output) => {
                info!(
                    "Task {} completed: {} files, {} warnings",
                    ctx.task_id,
                    output.summaries.len(),
                    output.warnings.len()
                );
                progress.report(ProgressEvent::Completed {
                    result: output.result.clone(),
                    summaries: output.summaries.clone(),
                });
                Ok(output)
            }
            Err(e) => {
                warn!("Task {} failed: {}", ctx.task_id, e);
                progress.report(ProgressEvent::Failed {
                    error: e.to_string(),
                });
                Err(e)
            }
        }
    }

    async fn run_stages(
        &self,
        ctx: &mut PipelineContext,
        progress: &dyn ProgressReporter,
    ) -> Result<PipelineOutput, PipelineError> {
        // Step 1: Unpack archive
        enter_phase(progress, TaskPhase::Unpacking);
        self.step_unpack(ctx).instrument(info_span!("unpack")).await?;

        // Step 2: Build tree, reject projects without code
        enter_phase(progress, TaskPhase::Scanning);
        self.step_scan(ctx).instrument(info_span!("scan")).await?;

        // Step 3: Extract structure
        enter_phase(progress, TaskPhase::Extracting);
        self.step_extract(ctx)
            .instrument(info_span!("extract"))
            .await?;

        // Step 4: Sanitize previews and hand fragments to the store
        enter_phase(progress, TaskPhase::Sanitizing);
        self.step_sanitize(ctx)
            .instrument(info_span!("sanitize"))
            .await?;
        self.step_store_fragments(ctx)
            .instrument(info_span!("store_fragments"))
            .await;

        // Step 5: Per-file summaries
        enter_phase(progress, TaskPhase::Enriching);
        self.step_enrich(ctx).instrument(info_span!("enrich")).await;

        // Step 6: Architecture diagram
        enter_phase(progress, TaskPhase::Diagramming);
        self.step_diagram(ctx)
            .instrument(info_span!("diagram"))
            .await;

        // Step 7: Assemble result
        enter_phase(progress, TaskPhase::Finalizing);
        self.step_finalize(ctx)
    }

    async fn step_unpack(&self, ctx: &mut PipelineContext) -> Result<(), PipelineError> {
        let work_dir = WorkDir::create(&self.config.work_directory, &ctx.task_id)?;
        let dest = work_dir.path().to_path_buf();
        ctx.work_dir = Some(work_dir);

        let bytes = Arc::clone(&ctx.archive);
        let limit = self.config.max_extracted_bytes;
        let stats = blocking(move || Ok(archive::unpack(&bytes, &dest, limit)?)).await?;

        debug!(
            "Unpacked {} files ({} bytes, {} skipped)",
            stats.files, stats.bytes, stats.skipped
        );
        Ok(())
    }

    async fn step_scan(&self, ctx: &mut PipelineContext) -> Result<(), PipelineError> {
        let root = project_root(ctx, "scan")?;
        let tree = blocking(move || Ok(build_tree(&root)?)).await?;

        if !tree.contains_code() {
            return Err(PipelineError::EmptyProject);
        }

        ctx.tree = Some(tree);
        Ok(())
    }

    async fn step_extract(&self, ctx: &mut PipelineContext) -> Result<(), PipelineError> {
        let root = project_root(ctx, "extract")?;
        let scanner = Arc::clone(&self.scanner);
        ctx.summaries = blocking(move || Ok(scanner.scan_files(&root)?)).await?;

        debug!("Extracted structure from {} files", ctx.summaries.len());
        Ok(())
    }

    async fn step_sanitize(&self, ctx: &mut PipelineContext) -> Result<(), PipelineError> {
        let root = project_root(ctx, "sanitize")?;
        let engine = Arc::clone(&self.sanitizer);
        let max_chars = self.config.preview_chars;
        let mut summaries = std::mem::take(&mut ctx.summaries);

        ctx.summaries = blocking(move || {
            for summary in &mut summaries {
                summary.sanitized_preview = sanitized_preview(&root, summary, &engine, max_chars);
                if let Some(preview) = summary.preview.take() {
                    summary.preview = Some(engine.sanitize_text(&preview));
                }
                if let Some(doc) = summary.doc_comment.take() {
                    summary.doc_comment = Some(engine.sanitize_text(&doc));
                }
            }
            Ok(summaries)
        })
        .await?;

        Ok(())
    }

    async fn step_store_fragments(&self, ctx: &mut PipelineContext) {
        if !self.config.store_fragments {
            return;
        }

        let fragments = build_fragments(&ctx.summaries, self.config.chunk_chars);
        if fragments.is_empty() {
            return;
        }

        let count = fragments.len();
        match self.fragment_store.store(fragments).await {
            Ok(stored) => {
                debug!("Fragment store accepted {} of {} fragments", stored, count);
            }
            Err(e) => {
                warn!("Failed to store {} fragments: {}", count, e);
                ctx.warnings.push(PipelineWarning::FragmentStoreFailed {
                    error: e.to_string(),
                });
            }
        }
    }

    async fn step_enrich(&self, ctx: &mut PipelineContext) {
        let candidates: Vec<&FileSummary> = ctx
            .summaries
            .iter()
            .filter(|s| is_code_file(Path::new(&s.file_path)))
            .filter(|s| !s.sanitized_preview.trim().is_empty())
            .take(self.config.max_files_to_summarize)
            .collect();

        if candidates.is_empty() {
            debug!("No files to summarize");
            return;
        }

        let paths: Vec<String> = candidates.iter().map(|s| s.file_path.clone()).collect();
        let prompt =
            PromptBuilder::build_summary_prompt(&candidates, self.config.prompt_preview_chars);

        let summaries =
            match generate_json(self.generator.as_ref(), SUMMARY_SYSTEM_PROMPT, &prompt).await {
                Ok(value) => parse_summaries(&value),
                Err(e) => {
                    warn!(
                        "Summaries unavailable for {} files, using static descriptions: {}",
                        paths.len(),
                        e
                    );
                    ctx.warnings.push(PipelineWarning::SummaryFallback {
                        files: paths.len(),
                        error: e.to_string(),
                    });
                    paths
                        .iter()
                        .map(|p| (p.clone(), describe_file(Path::new(p)).to_string()))
                        .collect()
                }
            };

        apply_summaries(ctx, &summaries);
    }

    async fn step_diagram(&self, ctx: &mut PipelineContext) {
        let prompt =
            PromptBuilder::build_diagram_prompt(&ctx.summaries, self.config.max_diagram_files);

        let generated = match self.generator.generate(DIAGRAM_SYSTEM_PROMPT, &prompt).await {
            Ok(text) => {
                let cleaned = strip_fences(&text);
                if is_flowchart(&cleaned) {
                    Ok(cleaned)
                } else {
                    Err("Generated text is not a Mermaid flowchart".to_string())
                }
            }
            Err(e) => Err(e.to_string()),
        };

        let diagram = match generated {
            Ok(diagram) => diagram,
            Err(error) => {
                warn!("Using fallback diagram: {}", error);
                ctx.warnings
                    .push(PipelineWarning::DiagramFallback { error });
                fallback_diagram(&ctx.summaries)
            }
        };

        ctx.diagram = Some(diagram);
    }

    fn step_finalize(&self, ctx: &mut PipelineContext) -> Result<PipelineOutput, PipelineError> {
        let tree = ctx
            .tree
            .take()
            .ok_or(PipelineError::MissingInput { stage: "finalize" })?;
        let diagram = match ctx.diagram.take() {
            Some(diagram) => diagram,
            None => fallback_diagram(&ctx.summaries),
        };

        let stats = ProjectStats {
            total_files: ctx.summaries.len(),
            code_files: ctx
                .summaries
                .iter()
                .filter(|s| is_code_file(Path::new(&s.file_path)))
                .count(),
            large_files: ctx.summaries.iter().filter(|s| s.is_large).count(),
        };

        Ok(PipelineOutput {
            result: TaskResult {
                tree,
                diagram,
                stats,
            },
            summaries: std::mem::take(&mut ctx.summaries),
            warnings: std::mem::take(&mut ctx.warnings),
        })
    }
}

fn enter_phase(progress: &dyn ProgressReporter, phase: TaskPhase) {
    progress.report(ProgressEvent::Phase {
        phase,
        message: format!("{}...", phase),
    });
}

fn project_root(ctx: &PipelineContext, stage: &'static str) -> Result<PathBuf, PipelineError> {
    ctx.work_dir
        .as_ref()
        .map(|w| w.path().to_path_buf())
        .ok_or(PipelineError::MissingInput { stage })
}

fn apply_summaries(ctx: &mut PipelineContext, summaries: &HashMap<String, String>) {
    for file in &mut ctx.summaries {
        if let Some(text) = summaries.get(&file.file_path) {
            file.ai_summary = Some(text.clone());
        }
    }

    if let Some(tree) = ctx.tree.as_mut() {
        tree.for_each_file_mut(|path, summary| {
            if let Some(text) = summaries.get(path) {
                *summary = Some(text.clone());
            }
        });
    }
}

/// Runs filesystem-heavy work off the async workers, inside the caller's span.
async fn blocking<T, F>(f: F) -> Result<T, PipelineError>
where
    F: FnOnce() -> Result<T, PipelineError> + Send + 'static,
    T: Send + 'static,
{
    let span = tracing::Span::current();
    tokio::task::spawn_blocking(move || {
        let _entered = span.enter();
        f()
    })
    .await
    .map_err(|e| PipelineError::Join(e.to_string()))?
}

use crate::discover::ThreadDiscoverer;
use crate::flatten::{CommentFlattener, Traversal};
use crate::sink::RowSink;
use chrono::{DateTime, Utc};
use harvest_core::{
    CommentRetrievalFailure, ConfigLoader, Credentials, DiscoveryStrategy, ErrorReporter,
    HarvestError, HarvestRow, Platform, ThreadHandle,
};
use std::fmt;
use std::path::PathBuf;
use tracing::{info, info_span, Instrument, Span};
use uuid::Uuid;

/// Everything one run needs besides the platform.
#[derive(Debug, Clone)]
pub struct HarvestRequest {
    pub strategy: DiscoveryStrategy,
    pub comments_per_thread: usize,
    pub traversal: Traversal,
    pub output: PathBuf,
}

/// Per-run identity and reporting, passed explicitly to each stage.
pub struct HarvestContext {
    run_id: Uuid,
    span: Span,
    reporter: ErrorReporter,
}

impl HarvestContext {
    pub fn new(strategy: &DiscoveryStrategy) -> Self {
        let run_id = Uuid::new_v4();
        Self {
            run_id,
            span: info_span!("harvest", run_id = %run_id, strategy = strategy.name()),
            reporter: ErrorReporter::new(),
        }
    }

    pub fn run_id(&self) -> Uuid {
        self.run_id
    }
}

/// Result of one thread: the number of rows it contributed, or why its
/// comments could not be retrieved.
pub type ThreadOutcome = Result<usize, CommentRetrievalFailure>;

#[derive(Debug, Clone)]
pub struct HarvestSummary {
    pub run_id: Uuid,
    pub output: PathBuf,
    pub started_at: DateTime<Utc>,
    pub finished_at: DateTime<Utc>,
    pub threads_attempted: usize,
    pub threads_succeeded: usize,
    pub rows_written: usize,
    pub failures: Vec<CommentRetrievalFailure>,
}

impl fmt::Display for HarvestSummary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "Wrote {} comment(s) from {}/{} thread(s) to {}",
            self.rows_written,
            self.threads_succeeded,
            self.threads_attempted,
            self.output.display()
        )?;
        if !self.failures.is_empty() {
            write!(f, " ({} thread(s) failed)", self.failures.len())?;
        }
        Ok(())
    }
}

/// Loads credentials, connects a platform and runs the harvest.
///
/// `connect` is only called once credentials are loaded; no output file is
/// created when either step fails.
pub async fn run<L, C, P>(
    loader: &L,
    connect: C,
    request: &HarvestRequest,
    context: &HarvestContext,
) -> Result<HarvestSummary, HarvestError>
where
    L: ConfigLoader + ?Sized,
    C: FnOnce(&Credentials) -> Result<P, HarvestError>,
    P: Platform,
{
    let platform: Result<P, HarvestError> = context.span.in_scope(|| {
        let credentials = loader.load()?;
        info!("Loaded credentials for client {}", credentials.masked_client_id());
        connect(&credentials)
    });

    match platform {
        Ok(platform) => Harvester::new(&platform, context).harvest(request).await,
        Err(e) => {
            context.span.in_scope(|| context.reporter.report_error(&e));
            Err(e)
        }
    }
}

pub struct Harvester<'a, P: Platform + ?Sized> {
    platform: &'a P,
    context: &'a HarvestContext,
}

impl<'a, P: Platform + ?Sized> Harvester<'a, P> {
    pub fn new(platform: &'a P, context: &'a HarvestContext) -> Self {
        Self { platform, context }
    }

    /// Discovers threads, then flattens and writes each one in discovery
    /// order. A thread whose comments cannot be fetched is recorded and
    /// skipped; any other error ends the run.
    pub async fn harvest(&self, request: &HarvestRequest) -> Result<HarvestSummary, HarvestError> {
        let result = self
            .harvest_inner(request)
            .instrument(self.context.span.clone())
            .await;
        if let Err(e) = &result {
            self.context.span.in_scope(|| self.context.reporter.report_error(e));
        }
        result
    }

    async fn harvest_inner(
        &self,
        request: &HarvestRequest,
    ) -> Result<HarvestSummary, HarvestError> {
        let started_at = Utc::now();
        let threads = ThreadDiscoverer::new(self.platform)
            .discover(&request.strategy)
            .await?;

        let mut sink = RowSink::open(&request.output, request.strategy.schema())?;
        let flattener = CommentFlattener::new(request.comments_per_thread, request.traversal);

        let mut summary = HarvestSummary {
            run_id: self.context.run_id,
            output: request.output.clone(),
            started_at,
            finished_at: started_at,
            threads_attempted: 0,
            threads_succeeded: 0,
            rows_written: 0,
            failures: Vec::new(),
        };

        for (index, thread) in threads.iter().enumerate() {
            info!(
                "[{}/{}] {} (r/{})",
                index + 1,
                threads.len(),
                thread.title,
                thread.community
            );
            summary.threads_attempted += 1;

            match self.harvest_thread(&flattener, &mut sink, thread).await? {
                Ok(_) => summary.threads_succeeded += 1,
                Err(failure) => {
                    self.context.reporter.report_thread_failure(&failure);
                    summary.failures.push(failure);
                }
            }
        }

        summary.rows_written = sink.close()?;
        summary.finished_at = Utc::now();
        info!(
            "Harvest finished: {} row(s), {} failed thread(s)",
            summary.rows_written,
            summary.failures.len()
        );
        Ok(summary)
    }

    /// The outer error is a sink failure and aborts the run; the inner one
    /// only affects this thread.
    async fn harvest_thread(
        &self,
        flattener: &CommentFlattener,
        sink: &mut RowSink,
        thread: &ThreadHandle,
    ) -> Result<ThreadOutcome, HarvestError> {
        let bodies = match flattener.flatten(self.platform, thread).await {
            Ok(bodies) => bodies,
            Err(failure) => return Ok(Err(failure)),
        };

        for body in &bodies {
            sink.write_row(&HarvestRow::new(thread, body.as_str()))?;
        }
        sink.flush()?;
        Ok(Ok(bodies.len()))
    }
}

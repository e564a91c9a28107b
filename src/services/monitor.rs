use std::{
    io::ErrorKind,
    path::PathBuf,
    process::{ExitStatus, Stdio},
    sync::{Mutex, MutexGuard, PoisonError, RwLock},
};

use serde::Serialize;
use tokio::{
    io::{AsyncBufRead, AsyncBufReadExt, AsyncReadExt, BufReader},
    process::Command,
};

use crate::{
    domain::{
        progress::{ProgressEvent, ProgressState},
        record::Record,
        search::SearchRequest,
    },
    error::MonitorError,
};

use super::text_codec;

/// The batch currently on display, replaced wholesale after every completed run.
#[derive(Debug, Clone, Default, Serialize)]
pub struct ResultSet {
    pub search_params: Option<SearchRequest>,
    pub total_found: usize,
    pub new_count: usize,
    pub existing_count: usize,
    pub results: Vec<Record>,
}

/// Launches the collector binary, turns its stdout into progress and reads
/// back the batch it wrote.
pub struct Monitor {
    executable: PathBuf,
    results_path: PathBuf,
    state: Mutex<ProgressState>,
    results: RwLock<ResultSet>,
}

impl Monitor {
    pub fn new(executable: PathBuf, results_path: PathBuf) -> Self {
        Monitor {
            executable,
            results_path,
            state: Mutex::new(ProgressState::default()),
            results: RwLock::new(ResultSet::default()),
        }
    }

    fn state(&self) -> MutexGuard<'_, ProgressState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    pub fn snapshot(&self) -> ProgressState {
        self.state().clone()
    }

    pub fn results(&self) -> ResultSet {
        self.results
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    pub fn is_running(&self) -> bool {
        self.state().is_running
    }

    /// Claims the monitor for a new run. Nothing is launched here.
    pub fn try_begin(&self) -> Result<(), MonitorError> {
        let mut state = self.state();
        if state.is_running {
            return Err(MonitorError::AlreadyRunning);
        }
        state.start();
        Ok(())
    }

    /// Lines other than the two progress patterns are ignored.
    pub fn apply_line(&self, line: &str) {
        if let Some(event) = ProgressEvent::parse(line) {
            self.state().apply(event);
        }
    }

    pub async fn follow<R: AsyncBufRead + Unpin>(&self, reader: R) -> Result<(), MonitorError> {
        let mut lines = reader.lines();
        while let Some(line) = lines.next_line().await? {
            self.apply_line(&line);
        }
        Ok(())
    }

    /// Decodes the collector's artifact once and moves to Finalizing.
    pub async fn load_results(&self) -> Result<Vec<Record>, MonitorError> {
        let records = match tokio::fs::read_to_string(&self.results_path).await {
            Ok(text) => text_codec::decode(&text),
            Err(e) if e.kind() == ErrorKind::NotFound => {
                log::warn!(
                    "Collector finished without writing {:?}, treating as empty",
                    self.results_path
                );
                vec![]
            }
            Err(e) => return Err(e.into()),
        };

        self.state().finalize(records.len() as u32);
        Ok(records)
    }

    /// Runs one collection end to end and returns the decoded batch.
    pub async fn run(&self, request: &SearchRequest) -> Result<Vec<Record>, MonitorError> {
        self.state().launch();

        match tokio::fs::remove_file(&self.results_path).await {
            Ok(()) => log::info!("Removed stale results file {:?}", self.results_path),
            Err(e) if e.kind() == ErrorKind::NotFound => {}
            Err(e) => return Err(e.into()),
        }

        log::info!(
            "Launching {:?} for \"{}\" (max {})",
            self.executable,
            request.query(),
            request.max_results
        );
        let mut child = Command::new(&self.executable)
            .arg("--search")
            .arg(request.query())
            .arg("--total")
            .arg(request.max_results.to_string())
            .arg("--output")
            .arg(&self.results_path)
            .arg("--source")
            .arg(request.source.id())
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true)
            .spawn()?;

        let stdout = child.stdout.take().ok_or(MonitorError::MissingPipe("stdout"))?;
        let mut stderr = child.stderr.take().ok_or(MonitorError::MissingPipe("stderr"))?;

        let stderr_reader = tokio::spawn(async move {
            let mut buf = String::new();
            stderr.read_to_string(&mut buf).await.map(|_| buf)
        });

        self.follow(BufReader::new(stdout)).await?;
        let status = child.wait().await?;
        let stderr = stderr_reader.await??;

        check_exit(&stderr, status)?;
        self.load_results().await
    }

    pub fn complete(&self, results: ResultSet) {
        *self.results.write().unwrap_or_else(PoisonError::into_inner) = results;
        self.state().complete();
    }

    /// Previous results stay on display.
    pub fn fail(&self, error: &MonitorError) {
        self.state().fail(error.to_string());
    }
}

/// Anything on stderr fails the run, as does a non-zero exit.
pub fn check_exit(stderr: &str, status: ExitStatus) -> Result<(), MonitorError> {
    let stderr = stderr.trim();
    if !stderr.is_empty() {
        return Err(MonitorError::Collector(stderr.to_string()));
    }
    match status.success() {
        true => Ok(()),
        false => Err(MonitorError::Exit(status)),
    }
}

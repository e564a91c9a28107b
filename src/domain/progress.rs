//! Progress of the single extraction run, and the stdout line protocol the
//! collector uses to report it.
//!
//! Only two line shapes carry meaning:
//!
//! ```text
//! Total Found: 12
//! Coletando dados do estabelecimento 3/12...
//! ```
//!
//! Everything else the collector prints is informational.

use std::{fmt, sync::LazyLock};

use regex::Regex;
use serde::Serialize;

static TOTAL_FOUND_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"Total Found:\s*(\d+)").expect("valid total found regex"));
static COLLECTING_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"Coletando dados do estabelecimento\s+(\d+)\s*/\s*(\d+)")
        .expect("valid collecting regex")
});

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProgressEvent {
    TotalFound(u32),
    Collecting { current: u32, total: u32 },
}

impl ProgressEvent {
    /// Returns `None` for informational lines and for lines whose numbers don't parse.
    pub fn parse(line: &str) -> Option<ProgressEvent> {
        if let Some(caps) = TOTAL_FOUND_RE.captures(line) {
            return caps[1].parse().ok().map(ProgressEvent::TotalFound);
        }

        let caps = COLLECTING_RE.captures(line)?;
        let current = caps[1].parse().ok()?;
        let total = caps[2].parse().ok()?;
        Some(ProgressEvent::Collecting { current, total })
    }
}

impl fmt::Display for ProgressEvent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ProgressEvent::TotalFound(n) => write!(f, "Total Found: {}", n),
            ProgressEvent::Collecting { current, total } => {
                write!(f, "Coletando dados do estabelecimento {}/{}...", current, total)
            }
        }
    }
}

/// `min(40 + floor(current / total * 50), 90)`.
pub fn collecting_progress(current: u32, total: u32) -> u8 {
    let step = (u64::from(current) * 50) / u64::from(total.max(1));
    (40 + step).min(90) as u8
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Phase {
    #[default]
    Idle,
    Starting,
    Launching,
    Discovering,
    Collecting,
    Finalizing,
    Done,
    Failed,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct ProgressState {
    pub is_running: bool,
    pub progress: u8,
    pub message: String,
    pub error: Option<String>,
    pub total_found: u32,
    pub phase: Phase,
}

impl ProgressState {
    pub fn start(&mut self) {
        *self = ProgressState {
            is_running: true,
            progress: 10,
            message: "Iniciando coleta de dados...".to_string(),
            error: None,
            total_found: 0,
            phase: Phase::Starting,
        };
    }

    pub fn launch(&mut self) {
        self.phase = Phase::Launching;
        self.progress = 20;
        self.message = "Executando script de coleta...".to_string();
    }

    pub fn apply(&mut self, event: ProgressEvent) {
        if !self.is_running {
            return;
        }

        match event {
            ProgressEvent::TotalFound(total) => {
                self.phase = Phase::Discovering;
                self.total_found = total;
                self.progress = self.progress.max(40);
                self.message = format!("Encontrados {} estabelecimentos...", total);
            }
            ProgressEvent::Collecting { current, total } => {
                if total == 0 {
                    return;
                }
                self.phase = Phase::Collecting;
                self.progress = self.progress.max(collecting_progress(current, total));
                self.message = format!("Coletando dados ({}/{})...", current, total);
            }
        }
    }

    pub fn finalize(&mut self, total_found: u32) {
        self.phase = Phase::Finalizing;
        self.progress = 95;
        self.total_found = total_found;
        self.message = "Processando resultados...".to_string();
    }

    pub fn complete(&mut self) {
        self.phase = Phase::Done;
        self.progress = 100;
        self.is_running = false;
        self.message = "Coleta concluída com sucesso!".to_string();
    }

    pub fn fail(&mut self, error: String) {
        self.phase = Phase::Failed;
        self.progress = 0;
        self.is_running = false;
        self.error = Some(error);
        self.message = "Erro durante a coleta de dados.".to_string();
    }
}

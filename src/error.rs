use thiserror::Error;
use thirtyfour::error::WebDriverError;

#[derive(Debug, Error)]
pub enum ScrapeError {
    #[error("webdriver error: {0}")]
    WebDriver(#[from] WebDriverError),

    #[error("no listings appeared for \"{query}\" within {timeout_secs}s")]
    NoListings { query: String, timeout_secs: u64 },

    #[error("surface error: {0}")]
    Surface(String),
}

#[derive(Debug, Error)]
pub enum MonitorError {
    #[error("an extraction is already running")]
    AlreadyRunning,

    #[error("collector io error: {0}")]
    Io(#[from] std::io::Error),

    #[error("collector {0} pipe was not captured")]
    MissingPipe(&'static str),

    #[error("collector reported an error: {0}")]
    Collector(String),

    #[error("collector exited with {0}")]
    Exit(std::process::ExitStatus),

    #[error("stderr reader task failed: {0}")]
    Join(#[from] tokio::task::JoinError),

    #[error("storing results failed: {0}")]
    Store(#[from] sqlx::Error),

    #[error("existing results for this search need an overwrite or merge decision")]
    ConfirmationRequired { existing_count: usize },
}

#[derive(Debug, Error)]
pub enum ExportError {
    #[error("json export failed: {0}")]
    Json(#[from] serde_json::Error),

    #[error("csv export failed: {0}")]
    Csv(#[from] csv::Error),

    #[error("export buffer error: {0}")]
    Io(#[from] std::io::Error),

    #[error("export produced invalid utf-8: {0}")]
    Utf8(#[from] std::string::FromUtf8Error),
}

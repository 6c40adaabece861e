/// Errors raised inside the scraping pipeline.
///
/// None of these abort the process: the pipeline turns them into a
/// `ScrapeOutcome::Failed` message or skips the affected floorplan.
#[derive(thiserror::Error, Debug)]
pub enum ScrapeError {
    #[error("network error: {0}")]
    Transport(String),
    #[error("could not fetch {0}")]
    Unreachable(String),
    #[error("no floorplan data found")]
    NoFloorplans,
    #[error("lenient parse failed: {0}")]
    Lenient(String),
    #[error("invalid pattern: {0}")]
    Pattern(String),
    #[error("invalid url {url}: {source}")]
    InvalidUrl {
        url: String,
        #[source]
        source: url::ParseError,
    },
}

impl From<reqwest::Error> for ScrapeError {
    fn from(err: reqwest::Error) -> Self {
        ScrapeError::Transport(err.to_string())
    }
}

pub type Result<T> = std::result::Result<T, ScrapeError>;

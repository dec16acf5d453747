use thiserror::Error;

/// 再生処理で発生するエラー
///
/// ティック中のエラーはその迷路だけをスキップするために使われ、
/// タイマーを止めることはない。
#[derive(Debug, Error)]
pub enum PlaybackError {
    #[error("maze container not found: {0}")]
    ContainerNotFound(String),

    #[error("{layer} grid not found in maze {title}")]
    GridNotFound { title: String, layer: &'static str },

    #[error("cannot determine column count of maze {0}")]
    ColumnsUnavailable(String),

    #[error("position ({row}, {col}) lies outside maze {title}")]
    OutOfGrid { title: String, row: i64, col: i64 },

    #[error("cell {index} not found in maze {title}")]
    CellNotFound { title: String, index: usize },

    #[error("unknown step type {0:?}")]
    UnknownStepType(String),

    #[error("invalid speed value {0:?}")]
    InvalidSpeed(String),

    #[error("timer error: {0}")]
    Timer(String),

    #[error("dom error: {0}")]
    Dom(String),

    #[error("failed to parse steps data: {0}")]
    Parse(#[from] serde_json::Error),

    #[error(transparent)]
    Io(#[from] std::io::Error),
}

pub type Result<T> = std::result::Result<T, PlaybackError>;

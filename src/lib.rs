pub mod config;
pub mod engine;
pub mod error;
pub mod steps;
pub mod surface;

#[cfg(all(target_arch = "wasm32", feature = "wasm"))]
pub mod dom_renderer;
#[cfg(all(target_arch = "wasm32", feature = "wasm"))]
pub mod wasm_entry;

use log::info;
use std::path::PathBuf;
use steps::CellEffect;

pub use config::PlaybackConfig;
pub use engine::{ManualTimer, PlaybackController, TickReport, TimerHandle, TimerHost};
pub use error::{PlaybackError, Result};
pub use steps::{Step, StepType, StepsData};
pub use surface::{GridLayer, MemoryPage, PageSurface};

// ========================================
// コマンドライン引数構造体
// ========================================

/// コマンドライン引数の設定
#[derive(Debug)]
pub struct CliArgs {
    /// 再生するステップデータ（`allStepsData` 形式の JSON）
    pub steps_path: Option<PathBuf>,
    pub speed_ms: Option<u32>,
    /// 再生するティック数の上限
    pub max_ticks: Option<usize>,
    /// 毎ティックの盤面を表示する
    pub show_frames: bool,
    /// フレーム表示のたびに再生間隔だけ待つ
    pub animate: bool,
    pub quiet: bool, // panic以外のログを抑制
    pub log_level: LogLevel,
    pub show_help: bool,
}

/// `--log-level=` で選ぶログの詳しさ
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogLevel {
    Off,
    Error,
    Warn,
    Info,
    Debug,
    Trace,
}

impl LogLevel {
    pub fn from_name(name: &str) -> Option<Self> {
        match name.to_ascii_lowercase().as_str() {
            "off" => Some(Self::Off),
            "error" => Some(Self::Error),
            "warn" => Some(Self::Warn),
            "info" => Some(Self::Info),
            "debug" => Some(Self::Debug),
            "trace" => Some(Self::Trace),
            _ => None,
        }
    }

    pub fn filter(self) -> log::LevelFilter {
        use log::LevelFilter;
        match self {
            Self::Off => LevelFilter::Off,
            Self::Error => LevelFilter::Error,
            Self::Warn => LevelFilter::Warn,
            Self::Info => LevelFilter::Info,
            Self::Debug => LevelFilter::Debug,
            Self::Trace => LevelFilter::Trace,
        }
    }
}

impl Default for CliArgs {
    fn default() -> Self {
        Self {
            steps_path: None,
            speed_ms: None,
            max_ticks: None,
            show_frames: false,
            animate: false,
            quiet: false,
            log_level: LogLevel::Info,
            show_help: false,
        }
    }
}

pub fn parse_args() -> CliArgs {
    parse_args_from(std::env::args().skip(1))
}

pub fn parse_args_from<I, S>(args: I) -> CliArgs
where
    I: IntoIterator<Item = S>,
    S: AsRef<str>,
{
    let mut cli_args = CliArgs::default();

    for arg in args {
        let arg = arg.as_ref();
        match arg {
            "--frames" => cli_args.show_frames = true,
            "--animate" => {
                cli_args.show_frames = true;
                cli_args.animate = true;
            }
            "--quiet" | "-q" => {
                cli_args.quiet = true;
                cli_args.log_level = LogLevel::Off;
            }
            "--help" | "-h" => cli_args.show_help = true,
            _ => {
                if let Some(name) = arg.strip_prefix("--log-level=") {
                    match LogLevel::from_name(name) {
                        Some(level) => cli_args.log_level = level,
                        None => log::warn!("Unknown log level '{}'", name),
                    }
                } else if let Some(value) = arg.strip_prefix("--speed=") {
                    cli_args.speed_ms = engine::playback::parse_speed(value);
                } else if let Some(value) = arg.strip_prefix("--ticks=") {
                    cli_args.max_ticks = value.parse().ok();
                } else if !arg.starts_with('-') {
                    cli_args.steps_path = Some(PathBuf::from(arg));
                }
            }
        }
    }
    cli_args
}

pub fn show_help() {
    info!("Maze Playback Runner

USAGE:
    maze_playback [OPTIONS] <steps.json>

OPTIONS:
    --speed=MS               Playback interval in milliseconds (default: 200)
    --ticks=N                Stop after N ticks
    --frames                 Print every frame instead of only the last one
    --animate                Print every frame and wait the playback interval between them
    --quiet, -q              Suppress all logs except panics
    --log-level=LEVEL        Set log level (off/error/warn/info/debug/trace)
    --help, -h               Show this help");
}

/// ネイティブ実行用のロガーを初期化する
///
/// `RUST_LOG` があればそちらのフィルタを重ねる。2回目以降の呼び出しは何もしない。
pub fn init_logger(log_level: &LogLevel) {
    use std::sync::Once;

    static INIT: Once = Once::new();

    let level = *log_level;
    INIT.call_once(move || {
        let mut builder = env_logger::Builder::new();
        builder.filter_level(level.filter());
        // quiet のときは RUST_LOG も無視する
        if level != LogLevel::Off {
            if let Ok(filters) = std::env::var("RUST_LOG") {
                builder.parse_filters(&filters);
            }
            builder.format_timestamp_millis().format_target(false);
        }
        // 既に別のロガーがあればそのまま使う
        let _ = builder.try_init();
    });
}

/// メモリ上に作る迷路の一辺の上限
pub const MAX_GRID_SIDE: i64 = 1024;

/// ステップデータから迷路ごとの大きさを推測してメモリ上のページを作る
///
/// 大きさは記録されている最大の座標から決める。一辺が `MAX_GRID_SIDE` を
/// 超える位置は大きさに含めず、再生時に範囲外としてスキップされる。
/// push / pop を含む迷路にはステップレイヤーも用意する。
pub fn page_for_steps(data: &StepsData) -> MemoryPage {
    let mut page = MemoryPage::new();
    for maze in data.mazes() {
        let steps = maze.steps.as_deref().unwrap_or_default();
        let far = steps
            .iter()
            .filter(|s| s.row() >= MAX_GRID_SIDE || s.col() >= MAX_GRID_SIDE)
            .count();
        if far > 0 {
            log::warn!(
                "Maze '{}': {} steps lie beyond {} cells and will not be shown",
                maze.title,
                far,
                MAX_GRID_SIDE
            );
        }
        let near = steps
            .iter()
            .filter(|s| s.row() < MAX_GRID_SIDE && s.col() < MAX_GRID_SIDE);
        let rows = near.clone().map(|s| s.row().max(0) + 1).max().unwrap_or(1);
        let cols = near.map(|s| s.col().max(0) + 1).max().unwrap_or(1);
        let layered = steps
            .iter()
            .any(|s| matches!(s.effect(), Some(CellEffect::AppendMarker(_))));
        let (rows, cols) = (rows as usize, cols as usize);
        if layered {
            page.add_layered_maze(maze.title.clone(), rows, cols);
        } else {
            page.add_maze(maze.title.clone(), rows, cols);
        }
    }
    page
}

// 再生コントローラ
//
// 全迷路で共有するステップ番号・タイマー・再生間隔を1つのオブジェクトに持つ。
// ティックごとに各迷路の現在ステップを描画し、最後に番号を1つ進める。

use super::grid::{cell_index, column_fits};
use super::timer::{TimerHandle, TimerHost};
use crate::config::PlaybackConfig;
use crate::error::{PlaybackError, Result};
use crate::steps::{CellEffect, MazeTrace, Step, StepsData};
use crate::surface::{GridLayer, PageSurface};

/// 1ティック分の結果
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TickReport {
    /// 描画したステップ番号（0始まり）
    pub index: usize,
    /// 描画できた迷路
    pub rendered: Vec<String>,
    /// エラーでスキップした迷路
    pub skipped: Vec<String>,
    /// ステップが尽きている迷路の数
    pub exhausted: usize,
    /// このティックで自動停止したか
    pub finished: bool,
}

/// 再生コントローラ
pub struct PlaybackController<T: TimerHost> {
    data: StepsData,
    config: PlaybackConfig,
    step_index: usize,
    is_playing: bool,
    speed_ms: u32,
    timer: Option<TimerHandle>,
    host: T,
}

impl<T: TimerHost> PlaybackController<T> {
    pub fn new(data: StepsData, config: PlaybackConfig, host: T) -> Self {
        let config = config.normalized();
        Self {
            data,
            speed_ms: config.initial_speed_ms,
            config,
            step_index: 0,
            is_playing: false,
            timer: None,
            host,
        }
    }

    pub fn step_index(&self) -> usize {
        self.step_index
    }

    pub fn is_playing(&self) -> bool {
        self.is_playing
    }

    pub fn speed_ms(&self) -> u32 {
        self.speed_ms
    }

    pub fn timer(&self) -> Option<TimerHandle> {
        self.timer
    }

    pub fn data(&self) -> &StepsData {
        &self.data
    }

    pub fn config(&self) -> &PlaybackConfig {
        &self.config
    }

    pub fn host(&self) -> &T {
        &self.host
    }

    pub fn host_mut(&mut self) -> &mut T {
        &mut self.host
    }

    /// 全迷路のステップを描画し終えたか
    pub fn is_finished(&self) -> bool {
        !self.data.has_steps_at(self.step_index)
    }

    /// 再生と一時停止を切り替える。戻り値は切り替え後の再生状態
    ///
    /// 最後まで描画し終えていれば先頭から再生し直す。
    pub fn toggle_playback<P: PageSurface>(&mut self, page: &mut P) -> Result<bool> {
        if self.is_playing {
            self.pause(page);
        } else {
            if self.is_finished() && self.step_index > 0 {
                self.reset_playback();
            }
            self.start_playback()?;
            self.is_playing = true;
            page.set_playback_label(&self.config.pause_label);
            log::info!("Playback started at step {} ({}ms)", self.step_index, self.speed_ms);
        }
        Ok(self.is_playing)
    }

    /// 一時停止する。タイマーを止めてハンドルを捨てる
    pub fn pause<P: PageSurface>(&mut self, page: &mut P) {
        self.cancel_timer();
        self.is_playing = false;
        page.set_playback_label(&self.config.play_label);
        log::info!("Playback paused at step {}", self.step_index);
    }

    /// 既存のタイマーを止めてから、新しいタイマーを `speed_ms` 間隔で作る
    pub fn start_playback(&mut self) -> Result<()> {
        self.cancel_timer();
        let handle = self.host.schedule(self.speed_ms).inspect_err(|e| {
            log::error!("Failed to start playback timer: {}", e);
        })?;
        self.timer = Some(handle);
        Ok(())
    }

    fn cancel_timer(&mut self) {
        if let Some(handle) = self.timer.take() {
            self.host.cancel(handle);
        }
    }

    /// 再生間隔を変更する
    ///
    /// スライダーから届く文字列（先頭の整数部分）を受け付け、設定範囲に収める。
    /// 再生中ならタイマーを作り直すが、ステップ番号は変えない。
    pub fn update_speed<P: PageSurface>(&mut self, value: &str, page: &mut P) -> Result<u32> {
        let parsed =
            parse_speed(value).ok_or_else(|| PlaybackError::InvalidSpeed(value.to_string()))?;
        self.set_speed(parsed, page)
    }

    pub fn set_speed<P: PageSurface>(&mut self, speed_ms: u32, page: &mut P) -> Result<u32> {
        let speed_ms = self.config.clamp_speed(speed_ms);
        self.speed_ms = speed_ms;
        page.set_speed_label(speed_ms);

        if self.timer.is_some() {
            self.start_playback()?;
        }
        log::info!("Playback speed set to {}ms", speed_ms);
        Ok(speed_ms)
    }

    /// 1ティック分を描画する
    ///
    /// ステップが残っている迷路すべてに現在のステップを適用し、最後に
    /// 共有のステップ番号を1つ進める。壊れた迷路はログを残してスキップする。
    pub fn render_step<P: PageSurface>(&mut self, page: &mut P) -> TickReport {
        let index = self.step_index;
        let mut report = TickReport {
            index,
            ..Default::default()
        };

        for maze in self.data.mazes() {
            let Some(step) = maze.step(index) else {
                if maze.steps.is_none() {
                    log::debug!("Skipping maze '{}': no step data", maze.title);
                }
                report.exhausted += 1;
                continue;
            };

            match render_maze_step(page, maze, step, index) {
                Ok(()) => report.rendered.push(maze.title.clone()),
                Err(e) => {
                    log::warn!("Skipping maze '{}' at step {}: {}", maze.title, index + 1, e);
                    report.skipped.push(maze.title.clone());
                }
            }
        }

        self.step_index += 1;
        log::debug!(
            "Tick {}: rendered {}, skipped {}, exhausted {}",
            index + 1,
            report.rendered.len(),
            report.skipped.len(),
            report.exhausted
        );

        if self.config.auto_stop && self.is_playing && self.is_finished() {
            log::info!("All mazes finished after {} steps", self.step_index);
            self.pause(page);
            report.finished = true;
        }

        report
    }

    /// 手動で1ステップ進める。タイマーの有無に関係なく即座に描画する
    pub fn step_playback<P: PageSurface>(&mut self, page: &mut P) -> TickReport {
        self.render_step(page)
    }

    /// ステップ番号を先頭に戻す。タイマーはそのまま
    pub fn reset_playback(&mut self) {
        self.step_index = 0;
        log::info!("Playback rewound to the first step");
    }

    /// ステップデータを差し替えて先頭に戻す
    pub fn load_steps(&mut self, data: StepsData) {
        log::info!("Loaded {} mazes (longest {} steps)", data.len(), data.longest());
        self.data = data;
        self.reset_playback();
    }
}

/// 1つの迷路に現在のステップを適用する
fn render_maze_step<P: PageSurface>(
    page: &mut P,
    maze: &MazeTrace,
    step: &Step,
    index: usize,
) -> Result<()> {
    let title = maze.title.as_str();
    page.set_status(title, &format!("step {} / {}", index + 1, maze.len()))?;

    let effect = step
        .effect()
        .ok_or_else(|| PlaybackError::UnknownStepType(format!("{:?}", step.kind)))?;

    let layer = match effect {
        CellEffect::SetClass(_) => GridLayer::Cells,
        // ステップレイヤーが無いページではセルグリッドに積む
        CellEffect::AppendMarker(_) if page.has_layer(title, GridLayer::Steps) => GridLayer::Steps,
        CellEffect::AppendMarker(_) => GridLayer::Cells,
    };

    let width = page.grid_columns(title, layer)?;
    let out_of_grid = || PlaybackError::OutOfGrid {
        title: title.to_string(),
        row: step.row(),
        col: step.col(),
    };
    if !column_fits(step.col(), width) {
        return Err(out_of_grid());
    }
    let cell = cell_index(step.pos, width).ok_or_else(out_of_grid)?;

    match effect {
        CellEffect::SetClass(role) => page.set_cell_class(title, cell, role.class_name()),
        CellEffect::AppendMarker(action) => {
            page.append_marker(title, layer, cell, action.class_name())
        }
    }
}

/// `parseInt` と同じく先頭の整数部分だけを読む
pub fn parse_speed(value: &str) -> Option<u32> {
    let trimmed = value.trim_start();
    let digits = trimmed
        .strip_prefix('+')
        .unwrap_or(trimmed)
        .split(|c: char| !c.is_ascii_digit())
        .next()?;
    if digits.is_empty() {
        return None;
    }
    // 桁あふれは上限に張り付かせる
    Some(digits.parse::<u32>().unwrap_or(u32::MAX))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::engine::timer::ManualTimer;
    use crate::steps::StepType;
    use crate::surface::MemoryPage;
    use pretty_assertions::assert_eq;

    fn code(row: i64, col: i64, code: i64) -> Step {
        Step::new(row, col, StepType::Code(code))
    }

    fn tag(row: i64, col: i64, tag: &str) -> Step {
        Step::new(row, col, StepType::Tag(tag.to_string()))
    }

    fn controller(data: StepsData) -> PlaybackController<ManualTimer> {
        PlaybackController::new(data, PlaybackConfig::default(), ManualTimer::new())
    }

    #[test]
    fn test_parse_speed() {
        assert_eq!(parse_speed("200"), Some(200));
        assert_eq!(parse_speed(" 350ms"), Some(350));
        assert_eq!(parse_speed("+75"), Some(75));
        assert_eq!(parse_speed("12.9"), Some(12));
        assert_eq!(parse_speed("abc"), None);
        assert_eq!(parse_speed(""), None);
        assert_eq!(parse_speed("-5"), None);
        assert_eq!(parse_speed("99999999999"), Some(u32::MAX));
    }

    #[test]
    fn test_render_step_updates_status_and_cell() {
        let data = StepsData::new().with_maze("m", vec![code(0, 0, 3), code(0, 1, 2)]);
        let mut page = MemoryPage::new();
        page.add_maze("m", 2, 2);
        let mut ctl = controller(data);

        let report = ctl.render_step(&mut page);
        assert_eq!(report.index, 0);
        assert_eq!(report.rendered, vec!["m".to_string()]);
        assert_eq!(page.status("m"), Some("step 1 / 2"));
        assert_eq!(
            page.cell("m", GridLayer::Cells, 0, 0).unwrap().marker.as_deref(),
            Some("start")
        );
        assert_eq!(ctl.step_index(), 1);
    }

    #[test]
    fn test_toggle_labels_and_timer() {
        let mut page = MemoryPage::new();
        let mut ctl = controller(StepsData::new());

        assert!(ctl.toggle_playback(&mut page).unwrap());
        assert_eq!(page.playback_label(), "Pause");
        assert_eq!(ctl.host().live_count(), 1);

        assert!(!ctl.toggle_playback(&mut page).unwrap());
        assert_eq!(page.playback_label(), "Play");
        assert_eq!(ctl.host().live_count(), 0);
        assert_eq!(ctl.timer(), None);
    }

    #[test]
    fn test_toggle_stays_paused_when_timer_fails() {
        let mut page = MemoryPage::new();
        let mut ctl = controller(StepsData::new());
        ctl.host_mut().fail_next_schedule("no window");

        assert!(ctl.toggle_playback(&mut page).is_err());
        assert!(!ctl.is_playing());
        assert_eq!(ctl.timer(), None);
    }

    #[test]
    fn test_update_speed_clamps_and_rejects() {
        let mut page = MemoryPage::new();
        let mut ctl = controller(StepsData::new());

        assert_eq!(ctl.update_speed("10", &mut page).unwrap(), 50);
        assert_eq!(ctl.update_speed("5000", &mut page).unwrap(), 1000);
        assert_eq!(page.speed_label(), Some(1000));
        assert!(matches!(
            ctl.update_speed("fast", &mut page),
            Err(PlaybackError::InvalidSpeed(_))
        ));
        assert_eq!(ctl.speed_ms(), 1000);
        // 停止中はタイマーを作らない
        assert_eq!(ctl.host().scheduled_count(), 0);
    }

    #[test]
    fn test_unknown_tag_skips_maze() {
        let data = StepsData::new()
            .with_maze("bad", vec![tag(0, 0, "visit")])
            .with_maze("good", vec![code(0, 0, 2)]);
        let mut page = MemoryPage::new();
        page.add_maze("bad", 1, 1).add_maze("good", 1, 1);
        let mut ctl = controller(data);

        let report = ctl.render_step(&mut page);
        assert_eq!(report.skipped, vec!["bad".to_string()]);
        assert_eq!(report.rendered, vec!["good".to_string()]);
    }

    #[test]
    fn test_out_of_grid_positions_are_skipped() {
        let data = StepsData::new().with_maze(
            "m",
            vec![code(0, 2, 2), code(-1, 0, 2), code(5, 0, 2), code(1, 1, 2)],
        );
        let mut page = MemoryPage::new();
        page.add_maze("m", 2, 2);
        let mut ctl = controller(data);

        // 列のはみ出し・負の座標・行のはみ出しはどれもスキップ
        for _ in 0..3 {
            let report = ctl.render_step(&mut page);
            assert_eq!(report.skipped, vec!["m".to_string()]);
        }
        let report = ctl.render_step(&mut page);
        assert_eq!(report.rendered, vec!["m".to_string()]);
        assert_eq!(
            page.cell("m", GridLayer::Cells, 1, 1).unwrap().marker.as_deref(),
            Some("checked")
        );
    }

    #[test]
    fn test_reset_and_load() {
        let data = StepsData::new().with_maze("m", vec![code(0, 0, 2); 3]);
        let mut page = MemoryPage::new();
        page.add_maze("m", 1, 1);
        let mut ctl = controller(data);

        ctl.step_playback(&mut page);
        ctl.step_playback(&mut page);
        assert_eq!(ctl.step_index(), 2);
        ctl.reset_playback();
        assert_eq!(ctl.step_index(), 0);

        ctl.step_playback(&mut page);
        ctl.load_steps(StepsData::new().with_maze("n", vec![code(0, 0, 5)]));
        assert_eq!(ctl.step_index(), 0);
        assert_eq!(ctl.data().len(), 1);
    }

    #[test]
    fn test_auto_stop_only_while_playing() {
        let data = StepsData::new().with_maze("m", vec![code(0, 0, 2)]);
        let mut page = MemoryPage::new();
        page.add_maze("m", 1, 1);

        // 手動ステップでは止める対象がない
        let mut ctl = controller(data.clone());
        let report = ctl.step_playback(&mut page);
        assert!(!report.finished);

        let mut ctl = controller(data);
        ctl.toggle_playback(&mut page).unwrap();
        let report = ctl.render_step(&mut page);
        assert!(report.finished);
        assert!(!ctl.is_playing());
        assert_eq!(ctl.host().live_count(), 0);
        assert_eq!(page.playback_label(), "Play");
    }

    #[test]
    fn test_auto_stop_disabled() {
        let data = StepsData::new().with_maze("m", vec![code(0, 0, 2)]);
        let mut page = MemoryPage::new();
        page.add_maze("m", 1, 1);
        let config = PlaybackConfig {
            auto_stop: false,
            ..Default::default()
        };
        let mut ctl = PlaybackController::new(data, config, ManualTimer::new());

        ctl.toggle_playback(&mut page).unwrap();
        for _ in 0..3 {
            assert!(!ctl.render_step(&mut page).finished);
        }
        assert!(ctl.is_playing());
        assert_eq!(ctl.step_index(), 3);
    }
}

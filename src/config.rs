use crate::error::Result;
use serde::Deserialize;

/// 再生の設定
///
/// ページ側から部分的な JSON（`window.playbackConfig`）で上書きできる。
/// 指定されなかった項目は既定値のまま。
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default)]
pub struct PlaybackConfig {
    /// 再生間隔の初期値（ミリ秒）
    pub initial_speed_ms: u32,
    pub min_speed_ms: u32,
    pub max_speed_ms: u32,
    /// 全迷路のステップが尽きたら自動で一時停止する
    pub auto_stop: bool,
    pub play_label: String,
    pub pause_label: String,
    pub selectors: DomSelectors,
}

/// ページ上の要素を探すためのクラス名と ID
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default)]
pub struct DomSelectors {
    pub container_class: String,
    pub box_class: String,
    pub grid_class: String,
    pub step_layer_class: String,
    pub marker_class: String,
    pub step_marker_class: String,
    pub status_class: String,
    pub status_id_prefix: String,
    pub playback_button_id: String,
    pub speed_value_id: String,
}

impl Default for PlaybackConfig {
    fn default() -> Self {
        Self {
            initial_speed_ms: 200,
            min_speed_ms: 50,
            max_speed_ms: 1000,
            auto_stop: true,
            play_label: "Play".to_string(),
            pause_label: "Pause".to_string(),
            selectors: DomSelectors::default(),
        }
    }
}

impl Default for DomSelectors {
    fn default() -> Self {
        Self {
            container_class: "dungeon-container".to_string(),
            box_class: "maze-box".to_string(),
            grid_class: "dungeon-grid".to_string(),
            step_layer_class: "step-layer".to_string(),
            marker_class: "maze-step".to_string(),
            step_marker_class: "step-marker".to_string(),
            status_class: "step-display".to_string(),
            status_id_prefix: "step-display-".to_string(),
            playback_button_id: "playback-btn".to_string(),
            speed_value_id: "speed-value".to_string(),
        }
    }
}

impl PlaybackConfig {
    pub fn from_json(source: &str) -> Result<Self> {
        let config: Self = serde_json::from_str(source)?;
        Ok(config.normalized())
    }

    /// 範囲の上下が逆なら入れ替え、初期値を範囲内に収める
    pub fn normalized(mut self) -> Self {
        if self.min_speed_ms > self.max_speed_ms {
            std::mem::swap(&mut self.min_speed_ms, &mut self.max_speed_ms);
        }
        self.min_speed_ms = self.min_speed_ms.max(1);
        self.max_speed_ms = self.max_speed_ms.max(self.min_speed_ms);
        self.initial_speed_ms = self.clamp_speed(self.initial_speed_ms);
        self
    }

    pub fn clamp_speed(&self, speed_ms: u32) -> u32 {
        speed_ms.clamp(self.min_speed_ms, self.max_speed_ms)
    }
}

impl DomSelectors {
    /// 迷路ごとのステータス表示要素の ID
    pub fn status_id(&self, title: &str) -> String {
        format!("{}{}", self.status_id_prefix, title)
    }
}

use crate::error::Result;

/// 繰り返しタイマーのハンドル
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct TimerHandle(pub i32);

/// 繰り返しタイマーを作成・破棄するホスト
///
/// ブラウザでは `setInterval` / `clearInterval`、ネイティブとテストでは
/// 手動で発火させる [`ManualTimer`] を使う。ティック時に何を呼ぶかは
/// ホスト側が知っている。
pub trait TimerHost {
    /// `interval_ms` ごとに発火するタイマーを作る
    fn schedule(&mut self, interval_ms: u32) -> Result<TimerHandle>;

    /// タイマーを止める。既に止まっているハンドルは無視する
    fn cancel(&mut self, handle: TimerHandle);
}

/// 手動で進めるタイマーホスト
#[derive(Debug, Default)]
pub struct ManualTimer {
    next_id: i32,
    live: Vec<(TimerHandle, u32)>,
    scheduled: usize,
    cancelled: usize,
    fail_next: Option<String>,
}

impl ManualTimer {
    pub fn new() -> Self {
        Self::default()
    }

    /// 現在動いているタイマーの数
    pub fn live_count(&self) -> usize {
        self.live.len()
    }

    /// 最後に作られた生きているタイマー
    pub fn active(&self) -> Option<TimerHandle> {
        self.live.last().map(|(handle, _)| *handle)
    }

    pub fn interval_of(&self, handle: TimerHandle) -> Option<u32> {
        self.live
            .iter()
            .find(|(h, _)| *h == handle)
            .map(|(_, interval)| *interval)
    }

    pub fn scheduled_count(&self) -> usize {
        self.scheduled
    }

    pub fn cancelled_count(&self) -> usize {
        self.cancelled
    }

    /// 次の `schedule` を失敗させる
    pub fn fail_next_schedule(&mut self, reason: impl Into<String>) {
        self.fail_next = Some(reason.into());
    }
}

impl TimerHost for ManualTimer {
    fn schedule(&mut self, interval_ms: u32) -> Result<TimerHandle> {
        if let Some(reason) = self.fail_next.take() {
            return Err(crate::error::PlaybackError::Timer(reason));
        }
        self.next_id += 1;
        let handle = TimerHandle(self.next_id);
        self.live.push((handle, interval_ms));
        self.scheduled += 1;
        Ok(handle)
    }

    fn cancel(&mut self, handle: TimerHandle) {
        let before = self.live.len();
        self.live.retain(|(h, _)| *h != handle);
        if self.live.len() != before {
            self.cancelled += 1;
        }
    }
}

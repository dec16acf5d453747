// WASM専用のエントリーポイント
//
// ブラウザの setInterval をタイマーホストとして再生コントローラを動かす。
// HTML の onclick から呼べるように、ページに1つだけ再生中のプレイヤーを持つ。

use crate::config::{DomSelectors, PlaybackConfig};
use crate::dom_renderer::DomPage;
use crate::engine::{PlaybackController, TimerHandle, TimerHost};
use crate::error::{PlaybackError, Result};
use crate::steps::StepsData;
use std::cell::RefCell;
use std::collections::HashMap;
use std::rc::{Rc, Weak};
use wasm_bindgen::JsCast;
use wasm_bindgen::prelude::*;
use web_sys::Window;

impl From<PlaybackError> for JsValue {
    fn from(err: PlaybackError) -> Self {
        JsValue::from_str(&err.to_string())
    }
}

#[wasm_bindgen(start)]
pub fn main() {
    // パニック時のエラーメッセージをブラウザコンソールに表示
    console_error_panic_hook::set_once();

    // WebAssembly用のロガーを初期化
    if console_log::init_with_level(log::Level::Info).is_err() {
        return;
    }
    log::info!("Maze playback module loaded");
}

/// `setInterval` / `clearInterval` によるタイマーホスト
///
/// コールバックのクロージャはタイマーが止まるまで保持する。止めたタイマーの
/// クロージャは自分自身の呼び出し中かもしれないので、次の `schedule` まで
/// 破棄しない。
pub struct IntervalTimer {
    window: Window,
    on_tick: Rc<dyn Fn()>,
    callbacks: HashMap<i32, Closure<dyn FnMut()>>,
    retired: Vec<Closure<dyn FnMut()>>,
}

impl IntervalTimer {
    pub fn new(window: Window, on_tick: Rc<dyn Fn()>) -> Self {
        Self {
            window,
            on_tick,
            callbacks: HashMap::new(),
            retired: Vec::new(),
        }
    }
}

impl TimerHost for IntervalTimer {
    fn schedule(&mut self, interval_ms: u32) -> Result<TimerHandle> {
        self.retired.clear();

        let on_tick = Rc::clone(&self.on_tick);
        let callback = Closure::wrap(Box::new(move || on_tick()) as Box<dyn FnMut()>);
        let timeout = i32::try_from(interval_ms).unwrap_or(i32::MAX);
        let id = self
            .window
            .set_interval_with_callback_and_timeout_and_arguments_0(
                callback.as_ref().unchecked_ref(),
                timeout,
            )
            .map_err(|e| PlaybackError::Timer(format!("setInterval failed: {:?}", e)))?;

        self.callbacks.insert(id, callback);
        log::debug!("Interval {} scheduled every {}ms", id, interval_ms);
        Ok(TimerHandle(id))
    }

    fn cancel(&mut self, handle: TimerHandle) {
        self.window.clear_interval_with_handle(handle.0);
        if let Some(callback) = self.callbacks.remove(&handle.0) {
            self.retired.push(callback);
        }
        log::debug!("Interval {} cleared", handle.0);
    }
}

impl Drop for IntervalTimer {
    fn drop(&mut self) {
        for id in self.callbacks.keys() {
            self.window.clear_interval_with_handle(*id);
        }
    }
}

type SharedController = Rc<RefCell<PlaybackController<IntervalTimer>>>;

/// ブラウザ上の再生プレイヤー
#[wasm_bindgen]
pub struct MazePlayer {
    controller: SharedController,
    selectors: DomSelectors,
}

impl MazePlayer {
    fn from_parts(data: StepsData, config: PlaybackConfig) -> Result<Self> {
        let window = web_sys::window().ok_or_else(|| PlaybackError::Dom("no window".into()))?;
        let selectors = config.selectors.clone();
        let tick_selectors = selectors.clone();

        let controller = Rc::new_cyclic(|weak: &Weak<RefCell<PlaybackController<IntervalTimer>>>| {
            let weak = weak.clone();
            let on_tick: Rc<dyn Fn()> = Rc::new(move || {
                let Some(shared) = weak.upgrade() else {
                    return;
                };
                let Ok(mut controller) = shared.try_borrow_mut() else {
                    log::warn!("Tick skipped: playback controller is busy");
                    return;
                };
                match DomPage::new(tick_selectors.clone()) {
                    Ok(mut page) => {
                        controller.render_step(&mut page);
                    }
                    Err(e) => log::warn!("Tick skipped: {}", e),
                }
            });
            RefCell::new(PlaybackController::new(
                data,
                config,
                IntervalTimer::new(window, on_tick),
            ))
        });

        Ok(Self {
            controller,
            selectors,
        })
    }

    /// ページの `window.allStepsData` と `window.playbackConfig` から作る
    fn from_page() -> Result<Self> {
        let window = web_sys::window().ok_or_else(|| PlaybackError::Dom("no window".into()))?;
        let steps = page_global(&window, "allStepsData")?;
        let config = page_global(&window, "playbackConfig")?;
        Self::from_parts(steps_from_js(&steps)?, config_from_js(&config)?)
    }

    fn with_page<R>(
        &self,
        f: impl FnOnce(&mut PlaybackController<IntervalTimer>, &mut DomPage) -> Result<R>,
    ) -> Result<R> {
        let mut page = DomPage::new(self.selectors.clone())?;
        let mut controller = self
            .controller
            .try_borrow_mut()
            .map_err(|_| PlaybackError::Timer("playback controller is busy".into()))?;
        f(&mut controller, &mut page)
    }
}

#[wasm_bindgen]
impl MazePlayer {
    #[wasm_bindgen(constructor)]
    pub fn new(steps: JsValue, config: JsValue) -> std::result::Result<MazePlayer, JsValue> {
        let player = Self::from_parts(steps_from_js(&steps)?, config_from_js(&config)?)?;
        Ok(player)
    }

    /// 再生と一時停止を切り替える
    pub fn toggle(&self) -> std::result::Result<bool, JsValue> {
        Ok(self.with_page(|controller, page| controller.toggle_playback(page))?)
    }

    #[wasm_bindgen(js_name = updateSpeed)]
    pub fn update_speed(&self, value: JsValue) -> std::result::Result<u32, JsValue> {
        let raw = speed_text(&value);
        Ok(self.with_page(|controller, page| controller.update_speed(&raw, page))?)
    }

    /// 1ステップ進める。戻り値は次に描画するステップ番号
    pub fn step(&self) -> std::result::Result<usize, JsValue> {
        Ok(self.with_page(|controller, page| {
            controller.step_playback(page);
            Ok(controller.step_index())
        })?)
    }

    pub fn reset(&self) -> std::result::Result<(), JsValue> {
        Ok(self.with_page(|controller, _| {
            controller.reset_playback();
            Ok(())
        })?)
    }

    #[wasm_bindgen(js_name = loadSteps)]
    pub fn load_steps(&self, steps: JsValue) -> std::result::Result<(), JsValue> {
        let data = steps_from_js(&steps)?;
        Ok(self.with_page(|controller, _| {
            controller.load_steps(data);
            Ok(())
        })?)
    }

    #[wasm_bindgen(getter, js_name = currentStep)]
    pub fn current_step(&self) -> usize {
        self.controller.borrow().step_index()
    }

    #[wasm_bindgen(getter, js_name = isPlaying)]
    pub fn is_playing(&self) -> bool {
        self.controller.borrow().is_playing()
    }

    #[wasm_bindgen(getter, js_name = speedMs)]
    pub fn speed_ms(&self) -> u32 {
        self.controller.borrow().speed_ms()
    }
}

fn page_global(window: &Window, name: &str) -> Result<JsValue> {
    js_sys::Reflect::get(window, &JsValue::from_str(name))
        .map_err(|e| PlaybackError::Dom(format!("cannot read window.{}: {:?}", name, e)))
}

fn json_from_js(value: &JsValue) -> Result<Option<String>> {
    if value.is_undefined() || value.is_null() {
        return Ok(None);
    }
    let json = js_sys::JSON::stringify(value)
        .map_err(|e| PlaybackError::Dom(format!("JSON.stringify failed: {:?}", e)))?;
    Ok(json.as_string())
}

fn steps_from_js(value: &JsValue) -> Result<StepsData> {
    match json_from_js(value)? {
        Some(json) => StepsData::from_json(&json),
        None => {
            log::warn!("No steps data on the page");
            Ok(StepsData::new())
        }
    }
}

fn config_from_js(value: &JsValue) -> Result<PlaybackConfig> {
    match json_from_js(value)? {
        Some(json) => PlaybackConfig::from_json(&json),
        None => Ok(PlaybackConfig::default()),
    }
}

/// スライダーの値は文字列でも数値でも届く
fn speed_text(value: &JsValue) -> String {
    if let Some(text) = value.as_string() {
        return text;
    }
    match value.as_f64() {
        Some(number) if number.is_finite() => format!("{}", number),
        _ => String::new(),
    }
}

thread_local! {
    static ACTIVE_PLAYER: RefCell<Option<MazePlayer>> = const { RefCell::new(None) };
}

/// ページのプレイヤーで処理する。初回はページのデータから作る
fn with_active_player<R>(action: &str, f: impl FnOnce(&MazePlayer) -> Result<R>) -> Option<R> {
    ACTIVE_PLAYER.with(|slot| {
        let mut slot = slot.borrow_mut();
        if slot.is_none() {
            match MazePlayer::from_page() {
                Ok(player) => *slot = Some(player),
                Err(e) => {
                    log::error!("Cannot create maze player: {}", e);
                    return None;
                }
            }
        }
        let player = slot.as_ref()?;
        match f(player) {
            Ok(value) => Some(value),
            Err(e) => {
                log::warn!("{} failed: {}", action, e);
                None
            }
        }
    })
}

#[wasm_bindgen(js_name = togglePlayback)]
pub fn toggle_playback() {
    with_active_player("togglePlayback", |player| {
        player.with_page(|controller, page| controller.toggle_playback(page))
    });
}

#[wasm_bindgen(js_name = updateSpeed)]
pub fn update_speed(value: JsValue) {
    let raw = speed_text(&value);
    with_active_player("updateSpeed", |player| {
        player.with_page(|controller, page| controller.update_speed(&raw, page))
    });
}

#[wasm_bindgen(js_name = stepPlayback)]
pub fn step_playback() {
    with_active_player("stepPlayback", |player| {
        player.with_page(|controller, page| {
            controller.step_playback(page);
            Ok(())
        })
    });
}

#[wasm_bindgen(js_name = resetPlayback)]
pub fn reset_playback() {
    with_active_player("resetPlayback", |player| {
        player.with_page(|controller, _| {
            controller.reset_playback();
            Ok(())
        })
    });
}

/// `window.allStepsData` を読み直す
#[wasm_bindgen(js_name = reloadSteps)]
pub fn reload_steps() {
    with_active_player("reloadSteps", |player| {
        let window = web_sys::window().ok_or_else(|| PlaybackError::Dom("no window".into()))?;
        let data = steps_from_js(&page_global(&window, "allStepsData")?)?;
        player.with_page(|controller, _| {
            controller.load_steps(data);
            Ok(())
        })
    });
}

use std::cell::RefCell;
use std::rc::Rc;

use js_sys::{Function, Promise};
use serde_json::Value;
use wasm_bindgen::prelude::*;
use wasm_bindgen_futures::future_to_promise;
use web_sys::HtmlCanvasElement;

// モジュール宣言
pub mod config;
pub mod error;
pub mod host;
pub mod surface;
pub mod ui;
pub mod utils;

use config::UiConfig;
use host::{EventListeners, HostBindings, JsAudioHooks, JsDesignMode, SharedController};
use surface::DomDocument;
use ui::{CameraState, DebugField, UiController};
use utils::{BrowserClock, BrowserScheduler, ClipboardSink, Clock, LogLevel, Scheduler};

// 初期化用のエントリーポイント
#[wasm_bindgen(start)]
pub fn start() {
    // エラーをコンソールにパニックフックとして表示
    console_error_panic_hook::set_once();

    // ロガーの初期化
    wasm_logger::init(wasm_logger::Config::default());
    log::info!("stage ui module initialized");
}

// JavaScriptからアクセス可能なUIハンドル
#[wasm_bindgen]
pub struct UiHandle {
    controller: SharedController,
    listeners: EventListeners,
}

#[wasm_bindgen]
impl UiHandle {
    /// UIを初期化してイベントを結びつける
    ///
    /// # 引数
    ///
    /// * `canvas` - ゲームのキャンバス（フォーカス管理と全画面の代替対象）
    /// * `hooks` - `{ resumeAudio, toggleMusic, version, design }`
    /// * `config_json` - `UiConfig`を部分的に上書きするJSON
    #[wasm_bindgen(constructor)]
    pub fn new(
        canvas: Option<HtmlCanvasElement>,
        hooks: JsValue,
        config_json: Option<String>,
    ) -> Result<UiHandle, JsValue> {
        let config = match config_json {
            Some(json) => UiConfig::from_json(&json)?,
            None => UiConfig::default(),
        };
        let document = DomDocument::from_window()?;

        let scheduler: Rc<dyn Scheduler> = Rc::new(BrowserScheduler::new());
        let clock: Rc<dyn Clock> = Rc::new(BrowserClock);
        let controller = Rc::new(RefCell::new(UiController::new(
            document.clone(),
            config,
            scheduler,
            clock,
        )));

        let has_hooks = !hooks.is_undefined() && !hooks.is_null();
        if let Some(version) = host::hook_version(&hooks) {
            controller.borrow().set_version(&version);
        }

        let bindings = HostBindings {
            document,
            canvas,
            audio: has_hooks.then(|| Rc::new(JsAudioHooks::new(hooks.clone()))),
            design: JsDesignMode::from_hooks(&hooks).map(Rc::new),
        };
        let listeners = host::bind_dom(&controller, bindings);

        Ok(UiHandle {
            controller,
            listeners,
        })
    }

    // --- 診断ログ ---

    /// 診断ログに記録（レベル名が不正な場合はINFO）
    pub fn record(&self, level: &str, evt: &str, data: JsValue) {
        let level = LogLevel::parse(level).unwrap_or(LogLevel::Info);
        self.controller.borrow_mut().record(level, evt, js_to_json(&data));
    }

    pub fn debug(&self, evt: &str, data: JsValue) {
        self.record(LogLevel::Debug.as_str(), evt, data);
    }

    pub fn info(&self, evt: &str, data: JsValue) {
        self.record(LogLevel::Info.as_str(), evt, data);
    }

    pub fn warn(&self, evt: &str, data: JsValue) {
        self.record(LogLevel::Warning.as_str(), evt, data);
    }

    pub fn error(&self, evt: &str, data: JsValue) {
        self.record(LogLevel::Error.as_str(), evt, data);
    }

    pub fn export_log(&self) -> String {
        self.controller.borrow().export_log()
    }

    /// 診断ログをクリップボードへコピー
    ///
    /// Promiseは常に成功し、コピーできたかを`true`/`false`で返します。
    pub fn copy_log(&self) -> Promise {
        let copy = self.controller.borrow().copy_log(&ClipboardSink);
        future_to_promise(async move {
            match copy.await {
                Ok(_) => Ok(JsValue::TRUE),
                Err(err) => {
                    log::warn!("log copy failed: {}", err);
                    Ok(JsValue::FALSE)
                }
            }
        })
    }

    pub fn clear_log(&self) {
        self.controller.borrow_mut().clear_log();
    }

    // --- HUD ---

    pub fn set_debug(&self, field: &str, value: JsValue) {
        match DebugField::parse(field) {
            Some(field) => self.controller.borrow().set_debug(field, &display_text(&value)),
            None => log::warn!("unknown debug field: {}", field),
        }
    }

    pub fn set_score(&self, score: JsValue) {
        self.controller.borrow().set_score(&display_text(&score));
    }

    pub fn set_timer(&self, timer: JsValue) {
        self.controller.borrow().set_timer(&display_text(&timer));
    }

    pub fn show_stage_clear(&self) {
        self.controller.borrow().show_stage_clear();
    }

    pub fn show_stage_fail(&self) {
        self.controller.borrow().show_stage_fail();
    }

    pub fn hide_stage_overlays(&self) {
        self.controller.borrow().hide_stage_overlays();
    }

    // --- エフェクト ---

    pub fn trigger_clear_effect(&self) -> bool {
        self.controller.borrow().trigger_clear_effect().is_some()
    }

    /// スライドの土煙を出す（カメラ省略時は原点）
    pub fn trigger_slide_effect(
        &self,
        x: f64,
        y: f64,
        facing: f64,
        camera_x: Option<f64>,
        camera_y: Option<f64>,
    ) -> bool {
        let camera = CameraState::new(camera_x.unwrap_or(0.0), camera_y.unwrap_or(0.0));
        self.controller
            .borrow()
            .trigger_slide_effect(x, y, facing, &camera)
            .is_some()
    }

    pub fn trigger_fail_effect(&self) -> bool {
        self.controller.borrow().trigger_fail_effect().is_some()
    }

    pub fn trigger_start_effect(&self) -> bool {
        self.controller.borrow().trigger_start_effect().is_some()
    }

    // --- スタート画面 ---

    pub fn show_loading(&self) -> Result<(), JsValue> {
        Ok(self.controller.borrow_mut().show_loading()?)
    }

    pub fn show_start(&self, on_start: Function) -> Result<(), JsValue> {
        Ok(self
            .controller
            .borrow_mut()
            .show_start(js_callback(on_start, "onStart"))?)
    }

    pub fn show_error(&self, on_retry: Function) -> Result<(), JsValue> {
        Ok(self
            .controller
            .borrow_mut()
            .show_error(js_callback(on_retry, "onRetry"))?)
    }

    pub fn set_status(&self, message: &str) {
        self.controller.borrow_mut().set_status(message);
    }

    /// 現在のスタート画面の状態（"Loading" / "Ready" / "Error"）
    pub fn start_state(&self) -> String {
        format!("{:?}", self.controller.borrow().start_screen().state())
    }

    // --- ダイアログ ---

    pub fn show_ped_dialog(&self, key: &str) {
        self.controller.borrow_mut().show_ped_dialog(key);
    }

    pub fn hide_ped_dialog(&self) {
        self.controller.borrow_mut().hide_ped_dialog();
    }

    /// ダイアログをプレイヤーの頭上に移動（`{x, y, h}`と`{x, y}`）
    pub fn sync_dialog_to_player(&self, player: JsValue, camera: JsValue) {
        let player = host::entity_from_js(&player);
        let camera = host::camera_from_js(&camera);
        self.controller
            .borrow_mut()
            .sync_dialog_to_player(player.as_ref(), camera.as_ref());
    }

    pub fn set_display_scale(&self, scale: f64) {
        self.controller.borrow_mut().set_display_scale(scale);
    }

    /// 倍率を更新し、表示中のダイアログを合わせ直す
    ///
    /// ホストのリサイズ・画面回転処理から新しい倍率で呼びます。
    pub fn on_viewport_change(&self, scale: f64) {
        self.controller.borrow_mut().on_viewport_change(scale);
    }

    pub fn set_language(&self, language: &str) {
        self.controller.borrow_mut().set_language(language);
    }

    // 解放時の処理
    pub fn dispose(&mut self) {
        self.listeners.clear();
        let removed = self.controller.borrow().effects().teardown();
        log::info!("ui disposed ({} effects removed)", removed);
    }
}

/// JSの関数を一度だけ呼ぶコールバックに包む
fn js_callback(function: Function, name: &'static str) -> Box<dyn FnOnce()> {
    Box::new(move || {
        if let Err(err) = function.call0(&JsValue::NULL) {
            log::warn!("{} callback threw: {:?}", name, err);
        }
    })
}

/// JSの値をJSONに変換（`undefined`/`null`や変換できない値は`None`）
fn js_to_json(value: &JsValue) -> Option<Value> {
    if value.is_undefined() || value.is_null() {
        return None;
    }
    let text = js_sys::JSON::stringify(value).ok()?.as_string()?;
    serde_json::from_str(&text).ok()
}

/// 数値・文字列をそのまま表示用の文字列にする
fn display_text(value: &JsValue) -> String {
    value
        .as_string()
        .or_else(|| value.as_f64().map(|number| number.to_string()))
        .unwrap_or_default()
}

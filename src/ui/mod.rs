//! UIコントローラモジュール
//!
//! ゲームループとホストページの間に立ち、画面上のUI層の状態を管理します。
//!
//! - [`coords`] - ワールド座標 → スクリーン座標の変換
//! - [`dialog`] - エンティティに追従する吹き出し
//! - [`effects`] - 寿命付きの一時エフェクト
//! - [`start_screen`] - 読み込み/開始/再試行の状態機械
//! - [`hud`] - デバッグ表示・スコア・オーバーレイ
//! - [`controls`] - 設定・音声・全画面・デザインモードのボタン
//! - [`i18n`] - ダイアログ文言の対応表

pub mod controls;
pub mod coords;
pub mod dialog;
pub mod effects;
pub mod hud;
pub mod i18n;
pub mod start_screen;

use std::rc::Rc;

use futures::future::LocalBoxFuture;
use serde_json::Value;

use crate::config::UiConfig;
use crate::error::UiError;
use crate::surface::{Surface, SurfaceFactory};
use crate::utils::{Clock, LogLevel, RingLogger, Scheduler, TextSink};

pub use controls::{AudioHooks, AudioUnlock, Controls, DesignMode, FullscreenAction};
pub use coords::{CameraState, DisplayScale, EntitySnapshot, ScreenPoint};
pub use dialog::DialogAnchor;
pub use effects::{EffectHandle, EffectKind, EffectParents, EffectScheduler};
pub use hud::{DebugField, Hud};
pub use start_screen::{StartScreen, StartScreenState, StartScreenSurfaces};

/// UI層全体のコントローラ
///
/// 表示倍率はここで一元管理し、座標変換を行う各部品へ引数として渡します。
pub struct UiController<F: SurfaceFactory> {
    config: UiConfig,
    document: F,
    logger: RingLogger,
    dialog: DialogAnchor<F::Node>,
    effects: EffectScheduler<F>,
    start_screen: StartScreen<F::Node>,
    hud: Hud<F::Node>,
    controls: Controls<F::Node>,
    scale: DisplayScale,
}

impl<F: SurfaceFactory> UiController<F> {
    /// ドキュメントから要素を集めてコントローラを作成
    ///
    /// 見つからない要素はその機能が何もしなくなるだけで、エラーにはなりません。
    /// 作成直後のスタート画面は読み込み中の表示です。
    /// 表示言語は言語選択の初期値、空なら`default_language`で始まります。
    ///
    /// # 引数
    ///
    /// * `factory` - 要素の検索・生成に使うドキュメント
    /// * `config` - UI設定
    /// * `scheduler` - エフェクト削除のタイマー
    /// * `clock` - ログとエフェクトの時刻
    pub fn new(
        factory: F,
        config: UiConfig,
        scheduler: Rc<dyn Scheduler>,
        clock: Rc<dyn Clock>,
    ) -> Self {
        let ids = &config.ids;

        let language = factory
            .lookup(&ids.lang_select)
            .map(|select| select.value())
            .filter(|value| !value.is_empty())
            .unwrap_or_else(|| config.default_language.clone());
        factory.set_document_language(&language);

        let dialog_container = factory.lookup(&ids.ped_dialog);
        let dialog_text = dialog_container
            .as_ref()
            .and_then(|container| container.query(&ids.ped_dialog_text));
        let dialog = DialogAnchor::new(
            dialog_container,
            dialog_text,
            &language,
            config.dialog_offset,
        );

        let start_screen = StartScreen::new(StartScreenSurfaces {
            page: factory.lookup(&ids.start_page),
            status: factory.lookup(&ids.start_status),
            start_button: factory.lookup(&ids.btn_start),
            retry_button: factory.lookup(&ids.btn_retry),
        });

        let hud = Hud::locate(&factory, ids);
        let controls = Controls::locate(&factory, ids);

        let parents = EffectParents {
            stage_clear: factory.lookup(&ids.stage_clear),
            game_wrap: factory.lookup(&ids.game_wrap),
        };
        let document = factory.clone();
        let effects = EffectScheduler::new(factory, parents, scheduler, Rc::clone(&clock), &config);

        let logger = RingLogger::with_capacity(config.log_capacity, clock);

        log::info!("🎛️ ui controller ready (language: {})", language);

        Self {
            config,
            document,
            logger,
            dialog,
            effects,
            start_screen,
            hud,
            controls,
            scale: DisplayScale::default(),
        }
    }

    pub fn config(&self) -> &UiConfig {
        &self.config
    }

    // --- 診断ログ ---

    pub fn logger(&self) -> &RingLogger {
        &self.logger
    }

    pub fn logger_mut(&mut self) -> &mut RingLogger {
        &mut self.logger
    }

    /// 診断ログに1件記録
    pub fn record(&mut self, level: LogLevel, evt: &str, data: Option<Value>) {
        self.logger.record(level, evt, data);
    }

    /// 診断ログをJSON Lines形式で書き出す
    pub fn export_log(&self) -> String {
        self.logger.export_all()
    }

    /// 診断ログを書き出し先へ送る
    pub fn copy_log(&self, sink: &dyn TextSink) -> LocalBoxFuture<'static, Result<usize, UiError>> {
        self.logger.copy_to(sink)
    }

    pub fn clear_log(&mut self) {
        self.logger.clear();
    }

    // --- 表示倍率 ---

    /// 表示倍率を更新する（キャンバスのリサイズ時）
    pub fn set_display_scale(&mut self, scale: f64) {
        self.scale = DisplayScale::new(scale);
    }

    pub fn display_scale(&self) -> DisplayScale {
        self.scale
    }

    /// リサイズ・画面回転時の処理
    ///
    /// 倍率を知っているのはホストのリサイズ処理なので、ホストがここを呼びます。
    /// 新しい倍率を反映し、表示中のダイアログを最後の位置情報で再配置します。
    pub fn on_viewport_change(&mut self, scale: f64) -> Option<ScreenPoint> {
        self.set_display_scale(scale);
        self.resync_dialog()
    }

    /// 現在の倍率のまま、最後の位置情報でダイアログを再配置する
    fn resync_dialog(&mut self) -> Option<ScreenPoint> {
        self.dialog.resync(self.scale)
    }

    // --- ダイアログ ---

    pub fn dialog(&self) -> &DialogAnchor<F::Node> {
        &self.dialog
    }

    pub fn show_ped_dialog(&mut self, key: &str) {
        self.dialog.show(key);
    }

    pub fn hide_ped_dialog(&mut self) {
        self.dialog.hide();
    }

    /// ダイアログをプレイヤーの頭上に移動
    pub fn sync_dialog_to_player(
        &mut self,
        player: Option<&EntitySnapshot>,
        camera: Option<&CameraState>,
    ) -> Option<ScreenPoint> {
        self.dialog.sync(player, camera, self.scale)
    }

    /// 表示言語を切り替える（ルート要素の`lang`も合わせる）
    pub fn set_language(&mut self, language: &str) {
        log::info!("🌐 language: {}", language);
        self.document.set_document_language(language);
        self.dialog.set_language(language);
    }

    pub fn language(&self) -> &str {
        self.dialog.language()
    }

    // --- エフェクト ---

    pub fn effects(&self) -> &EffectScheduler<F> {
        &self.effects
    }

    pub fn trigger_clear_effect(&self) -> Option<EffectHandle> {
        self.effects.trigger_clear()
    }

    /// スライドの土煙を現在の表示倍率で出す
    pub fn trigger_slide_effect(
        &self,
        x: f64,
        y: f64,
        facing: f64,
        camera: &CameraState,
    ) -> Option<EffectHandle> {
        self.effects.trigger_slide(x, y, facing, camera, self.scale)
    }

    pub fn trigger_fail_effect(&self) -> Option<EffectHandle> {
        self.effects.trigger_fail()
    }

    pub fn trigger_start_effect(&self) -> Option<EffectHandle> {
        self.effects.trigger_start()
    }

    pub fn cancel_effect(&self, handle: EffectHandle) -> bool {
        self.effects.cancel(handle)
    }

    // --- HUD ---

    pub fn hud(&self) -> &Hud<F::Node> {
        &self.hud
    }

    pub fn set_debug(&self, field: DebugField, value: &str) {
        self.hud.set_debug(field, value);
    }

    pub fn set_score(&self, score: &str) {
        self.hud.set_score(score);
    }

    pub fn set_timer(&self, timer: &str) {
        self.hud.set_timer(timer);
    }

    pub fn show_stage_clear(&self) {
        self.hud.show_stage_clear();
    }

    pub fn show_stage_fail(&self) {
        self.hud.show_stage_fail();
    }

    pub fn hide_stage_overlays(&self) {
        self.hud.hide_stage_overlays();
    }

    pub fn set_version(&self, version: &str) {
        self.hud.set_version(version);
    }

    // --- 操作パネル ---

    pub fn controls(&self) -> &Controls<F::Node> {
        &self.controls
    }

    // --- スタート画面 ---

    pub fn start_screen(&self) -> &StartScreen<F::Node> {
        &self.start_screen
    }

    pub fn start_screen_mut(&mut self) -> &mut StartScreen<F::Node> {
        &mut self.start_screen
    }

    pub fn show_loading(&mut self) -> Result<(), UiError> {
        self.start_screen.show_loading()
    }

    pub fn show_start(&mut self, on_start: Box<dyn FnOnce()>) -> Result<(), UiError> {
        self.start_screen.show_start(on_start)
    }

    pub fn show_error(&mut self, on_retry: Box<dyn FnOnce()>) -> Result<(), UiError> {
        self.start_screen.show_error(on_retry)
    }

    pub fn set_status(&mut self, message: &str) {
        self.start_screen.set_status(message);
    }

    /// Startボタン押下
    pub fn press_start(&mut self) -> Result<(), UiError> {
        self.start_screen.activate_start()
    }

    /// Retryボタン押下
    pub fn press_retry(&mut self) -> Result<(), UiError> {
        self.start_screen.activate_retry()
    }
}

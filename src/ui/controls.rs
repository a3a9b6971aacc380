//! 操作パネルモジュール
//!
//! 設定メニュー、情報パネル、BGM、全画面、デザインモードの各ボタンの
//! 表示状態を扱います。音声やデザインモードの実処理はホスト側にあり、
//! ここではトレイト越しに呼び出して結果をボタンに反映するだけです。

use std::cell::Cell;

use crate::config::ElementIds;
use crate::surface::{Surface, SurfaceFactory};

/// ポインタ押下でキャンバスにフォーカスを戻さない要素
pub const INTERACTIVE_SELECTOR: &str = "button, a, input, textarea, select, label";

/// ホスト側の音声処理
pub trait AudioHooks {
    /// オーディオコンテキストを再開する
    fn resume_audio(&self);

    /// BGMを切り替え、切り替え後に鳴っているかを返す
    fn toggle_music(&self) -> bool;
}

/// ホスト側のデザインモード（ステージ編集）
pub trait DesignMode {
    /// デザインモードを切り替え、切り替え後に有効かを返す
    fn enable(&self) -> bool;
    fn toggle_transparent(&self);
    fn toggle_destroyable(&self);
    fn save(&self);
    fn add_block(&self);
}

/// 最初のユーザー操作で一度だけ音声を再開する
#[derive(Debug, Default)]
pub struct AudioUnlock {
    fired: Cell<bool>,
}

impl AudioUnlock {
    pub fn new() -> Self {
        Self::default()
    }

    /// 未発火なら`resume_audio`を呼ぶ。呼んだ場合は`true`
    pub fn fire(&self, audio: &dyn AudioHooks) -> bool {
        if self.fired.replace(true) {
            return false;
        }
        log::info!("🔊 audio unlocked by first user gesture");
        audio.resume_audio();
        true
    }

    pub fn has_fired(&self) -> bool {
        self.fired.get()
    }
}

/// 全画面ボタンを押したときに行う操作
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FullscreenAction {
    Enter,
    Exit,
}

impl FullscreenAction {
    /// 操作後にボタンへ表示するラベル
    pub fn label(&self) -> &'static str {
        match self {
            FullscreenAction::Enter => "🞬",
            FullscreenAction::Exit => "⛶",
        }
    }
}

/// 操作パネルのボタン類
pub struct Controls<S: Surface> {
    settings_menu: Option<S>,
    info_panel: Option<S>,
    bgm_toggle: Option<S>,
    fullscreen_toggle: Option<S>,
    design_enable: Option<S>,
    design_add: Option<S>,
}

impl<S: Surface> Controls<S> {
    pub fn locate<F: SurfaceFactory<Node = S>>(factory: &F, ids: &ElementIds) -> Self {
        Self {
            settings_menu: factory.lookup(&ids.settings_menu),
            info_panel: factory.lookup(&ids.info_panel),
            bgm_toggle: factory.lookup(&ids.bgm_toggle),
            fullscreen_toggle: factory.lookup(&ids.fullscreen_toggle),
            design_enable: factory.lookup(&ids.design_enable),
            design_add: factory.lookup(&ids.design_add),
        }
    }

    /// 設定メニューの`open`クラスを反転。開いた場合は`true`
    pub fn toggle_settings(&self) -> bool {
        self.settings_menu
            .as_ref()
            .map_or(false, |menu| menu.toggle_class("open"))
    }

    /// 情報パネルの表示を反転。表示された場合は`true`
    pub fn toggle_info(&self) -> bool {
        let Some(panel) = &self.info_panel else {
            return false;
        };
        let show = panel.is_hidden();
        panel.set_hidden(!show);
        show
    }

    /// BGMの状態をラベルに反映
    pub fn reflect_music(&self, on: bool) {
        if let Some(button) = &self.bgm_toggle {
            button.set_text(if on { "Mute" } else { "Unmute" });
        }
    }

    /// 全画面ボタンの押下を処理し、行うべき操作を返す
    ///
    /// # 引数
    ///
    /// * `is_fullscreen` - 押下時点で全画面表示中か
    pub fn fullscreen_clicked(&self, is_fullscreen: bool) -> FullscreenAction {
        let action = if is_fullscreen {
            FullscreenAction::Exit
        } else {
            FullscreenAction::Enter
        };
        if let Some(button) = &self.fullscreen_toggle {
            button.set_text(action.label());
        }
        action
    }

    /// デザインモードの有効・無効をボタンに反映
    pub fn reflect_design(&self, on: bool) {
        if let Some(button) = &self.design_enable {
            button.set_class("active", on);
            button.set_attribute("aria-pressed", if on { "true" } else { "false" });
            button.set_text(if on { "停用" } else { "啟用" });
        }
        if let Some(add) = &self.design_add {
            add.set_hidden(!on);
        }
    }
}

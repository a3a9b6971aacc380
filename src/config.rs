//! UI設定モジュール
//!
//! 要素IDの対応表と、表示に関する定数をまとめます。
//! ホストはJSON文字列で部分的に上書きでき、省略した項目は既定値になります。

use serde::Deserialize;

use crate::error::UiError;
use crate::utils::LOG_CAPACITY;

/// UI設定
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default)]
pub struct UiConfig {
    /// 診断ログのリングバッファ容量
    pub log_capacity: usize,
    /// ダイアログを頭上に浮かせる縦オフセット（ワールド単位）
    pub dialog_offset: f64,
    /// スライド土煙のオフセット（横, 縦）
    pub slide_offset: (f64, f64),
    /// スライド土煙の大きさ（幅, 高さ）
    pub slide_size: (f64, f64),
    /// 起動時の言語
    pub default_language: String,
    /// エフェクト画像の配置ディレクトリ
    pub asset_base: String,
    pub ids: ElementIds,
}

impl Default for UiConfig {
    fn default() -> Self {
        Self {
            log_capacity: LOG_CAPACITY,
            dialog_offset: 28.0,
            slide_offset: (12.0, 12.0),
            slide_size: (48.0, 24.0),
            default_language: "en".to_string(),
            asset_base: "assets".to_string(),
            ids: ElementIds::default(),
        }
    }
}

impl UiConfig {
    /// JSON文字列から設定を読み込む
    pub fn from_json(json: &str) -> Result<Self, UiError> {
        Ok(serde_json::from_str(json)?)
    }

    /// アセットのパスを組み立てる
    pub fn asset(&self, file: &str) -> String {
        if self.asset_base.is_empty() {
            file.to_string()
        } else {
            format!("{}/{}", self.asset_base.trim_end_matches('/'), file)
        }
    }
}

/// 画面要素のID
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default)]
pub struct ElementIds {
    pub game_wrap: String,
    pub game_col: String,
    pub start_page: String,
    pub start_status: String,
    pub start_version: String,
    pub btn_start: String,
    pub btn_retry: String,
    pub ped_dialog: String,
    /// ダイアログ内のテキストノードを探すセレクタ
    pub ped_dialog_text: String,
    pub lang_select: String,
    pub log_copy: String,
    pub log_clear: String,
    pub info_toggle: String,
    pub info_panel: String,
    pub settings_toggle: String,
    pub settings_menu: String,
    pub bgm_toggle: String,
    pub fullscreen_toggle: String,
    pub design_enable: String,
    pub design_transparent: String,
    pub design_destroyable: String,
    pub design_save: String,
    pub design_add: String,
    pub version_pill: String,
    pub dbg_fps: String,
    pub dbg_pos: String,
    pub dbg_vel: String,
    pub dbg_ground: String,
    pub dbg_coyote: String,
    pub dbg_buffer: String,
    pub dbg_keys: String,
    pub dbg_press: String,
    pub dbg_fired: String,
    pub score: String,
    pub timer: String,
    pub stage_clear: String,
    pub stage_fail: String,
}

impl Default for ElementIds {
    fn default() -> Self {
        Self {
            game_wrap: "game-wrap".to_string(),
            game_col: "game-col".to_string(),
            start_page: "start-page".to_string(),
            start_status: "start-status".to_string(),
            start_version: "start-version".to_string(),
            btn_start: "btn-start".to_string(),
            btn_retry: "btn-retry".to_string(),
            ped_dialog: "ped-dialog".to_string(),
            ped_dialog_text: ".ped-dialog__text".to_string(),
            lang_select: "lang-select".to_string(),
            log_copy: "log-copy".to_string(),
            log_clear: "log-clear".to_string(),
            info_toggle: "info-toggle".to_string(),
            info_panel: "info-panel".to_string(),
            settings_toggle: "settings-toggle".to_string(),
            settings_menu: "settings-menu".to_string(),
            bgm_toggle: "bgm-toggle".to_string(),
            fullscreen_toggle: "fullscreen-toggle".to_string(),
            design_enable: "design-enable".to_string(),
            design_transparent: "design-transparent".to_string(),
            design_destroyable: "design-destroyable".to_string(),
            design_save: "design-save".to_string(),
            design_add: "design-add".to_string(),
            version_pill: "version-pill".to_string(),
            dbg_fps: "dbg-fps".to_string(),
            dbg_pos: "dbg-pos".to_string(),
            dbg_vel: "dbg-vel".to_string(),
            dbg_ground: "dbg-ground".to_string(),
            dbg_coyote: "dbg-coyote".to_string(),
            dbg_buffer: "dbg-buffer".to_string(),
            dbg_keys: "dbg-keys".to_string(),
            dbg_press: "dbg-press".to_string(),
            dbg_fired: "dbg-fired".to_string(),
            score: "score".to_string(),
            timer: "timer".to_string(),
            stage_clear: "stage-clear".to_string(),
            stage_fail: "stage-fail".to_string(),
        }
    }
}

impl ElementIds {
    /// IDで参照する全要素の（ID, タグ）一覧
    ///
    /// テキストノード用のセレクタは含みません。
    pub fn all(&self) -> Vec<(&str, &str)> {
        vec![
            (self.game_wrap.as_str(), "div"),
            (self.game_col.as_str(), "div"),
            (self.start_page.as_str(), "section"),
            (self.start_status.as_str(), "p"),
            (self.start_version.as_str(), "span"),
            (self.btn_start.as_str(), "button"),
            (self.btn_retry.as_str(), "button"),
            (self.ped_dialog.as_str(), "div"),
            (self.lang_select.as_str(), "select"),
            (self.log_copy.as_str(), "button"),
            (self.log_clear.as_str(), "button"),
            (self.info_toggle.as_str(), "button"),
            (self.info_panel.as_str(), "aside"),
            (self.settings_toggle.as_str(), "button"),
            (self.settings_menu.as_str(), "div"),
            (self.bgm_toggle.as_str(), "button"),
            (self.fullscreen_toggle.as_str(), "button"),
            (self.design_enable.as_str(), "button"),
            (self.design_transparent.as_str(), "button"),
            (self.design_destroyable.as_str(), "button"),
            (self.design_save.as_str(), "button"),
            (self.design_add.as_str(), "button"),
            (self.version_pill.as_str(), "span"),
            (self.dbg_fps.as_str(), "span"),
            (self.dbg_pos.as_str(), "span"),
            (self.dbg_vel.as_str(), "span"),
            (self.dbg_ground.as_str(), "span"),
            (self.dbg_coyote.as_str(), "span"),
            (self.dbg_buffer.as_str(), "span"),
            (self.dbg_keys.as_str(), "span"),
            (self.dbg_press.as_str(), "span"),
            (self.dbg_fired.as_str(), "span"),
            (self.score.as_str(), "span"),
            (self.timer.as_str(), "span"),
            (self.stage_clear.as_str(), "div"),
            (self.stage_fail.as_str(), "div"),
        ]
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = UiConfig::default();
        assert_eq!(config.log_capacity, 400);
        assert_eq!(config.dialog_offset, 28.0);
        assert_eq!(config.ids.ped_dialog, "ped-dialog");
        assert_eq!(config.asset("slide-dust.svg"), "assets/slide-dust.svg");
    }

    #[test]
    fn test_partial_json_override() {
        let config = UiConfig::from_json(
            r#"{ "log_capacity": 50, "ids": { "score": "hud-score" } }"#,
        )
        .unwrap();

        assert_eq!(config.log_capacity, 50);
        assert_eq!(config.ids.score, "hud-score");
        // 省略した項目は既定値
        assert_eq!(config.ids.timer, "timer");
        assert_eq!(config.default_language, "en");
    }

    #[test]
    fn test_invalid_json() {
        assert!(matches!(
            UiConfig::from_json("{ not json"),
            Err(UiError::Config(_))
        ));
    }
}

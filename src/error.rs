//! エラー型モジュール
//!
//! UI層で発生しうるエラーを表します。いずれもプロセスにとって致命的ではなく、
//! 最悪でも表示要素が欠けるだけです。

use wasm_bindgen::JsValue;

use crate::ui::start_screen::StartScreenState;

/// UIエラーを表す列挙型
#[derive(Debug, Clone, PartialEq)]
pub enum UiError {
    /// 必要な要素やブラウザオブジェクトが存在しない
    Unavailable(&'static str),
    /// クリップボードへのコピーに失敗
    Clipboard(String),
    /// スタート画面の状態機械で許されない操作
    InvalidTransition {
        state: StartScreenState,
        action: &'static str,
    },
    /// 設定の読み込みに失敗
    Config(String),
}

impl std::fmt::Display for UiError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            UiError::Unavailable(what) => write!(f, "{} is not available", what),
            UiError::Clipboard(msg) => write!(f, "clipboard write failed: {}", msg),
            UiError::InvalidTransition { state, action } => {
                write!(f, "cannot {} while start screen is {:?}", action, state)
            }
            UiError::Config(msg) => write!(f, "invalid ui config: {}", msg),
        }
    }
}

impl std::error::Error for UiError {}

impl From<UiError> for JsValue {
    fn from(error: UiError) -> Self {
        JsValue::from_str(&error.to_string())
    }
}

impl From<serde_json::Error> for UiError {
    fn from(error: serde_json::Error) -> Self {
        UiError::Config(error.to_string())
    }
}

//! ロギングユーティリティモジュール
//!
//! ゲーム内の診断ログを固定長のリングバッファに保持します。
//! 各レコードは`log`クレート経由でブラウザのコンソールにも出力されます。
//! バッファの内容はJSON Lines形式で書き出し、クリップボードへコピーできます。

use std::collections::VecDeque;
use std::rc::Rc;

use futures::future::LocalBoxFuture;
use futures::FutureExt;
use serde::Serialize;
use serde_json::Value;
use wasm_bindgen_futures::JsFuture;

use super::time::{iso_timestamp, Clock};
use crate::error::UiError;

/// リングバッファの既定容量
pub const LOG_CAPACITY: usize = 400;

/// ログレベル
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize)]
pub enum LogLevel {
    /// デバッグ情報（詳細な情報）
    #[serde(rename = "DEBUG")]
    Debug,
    /// 情報（一般的な情報）
    #[serde(rename = "INFO")]
    Info,
    /// 警告（潜在的な問題）
    #[serde(rename = "WARN")]
    Warning,
    /// エラー（実行を妨げる問題）
    #[serde(rename = "ERROR")]
    Error,
}

impl LogLevel {
    /// 書き出し時のラベル
    pub fn as_str(&self) -> &'static str {
        match self {
            LogLevel::Debug => "DEBUG",
            LogLevel::Info => "INFO",
            LogLevel::Warning => "WARN",
            LogLevel::Error => "ERROR",
        }
    }

    /// 文字列からレベルを解釈（大文字小文字は区別しない）
    pub fn parse(level: &str) -> Option<Self> {
        match level.to_ascii_uppercase().as_str() {
            "DEBUG" => Some(LogLevel::Debug),
            "INFO" => Some(LogLevel::Info),
            "WARN" | "WARNING" => Some(LogLevel::Warning),
            "ERROR" => Some(LogLevel::Error),
            _ => None,
        }
    }
}

/// ログレコード（追加後は変更されない）
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct LogRecord {
    /// ISO-8601形式のタイムスタンプ
    pub ts: String,
    pub level: LogLevel,
    /// イベント名
    pub evt: String,
    /// 付加情報。空でないJSONオブジェクトの場合のみ保持
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data: Option<Value>,
}

impl LogRecord {
    /// 1行のJSONとして書き出す
    pub fn to_json(&self) -> String {
        serde_json::to_string(self).unwrap_or_default()
    }
}

/// テキストの書き出し先（クリップボードなど）
pub trait TextSink {
    fn write_text(&self, text: String) -> LocalBoxFuture<'static, Result<(), UiError>>;
}

/// `navigator.clipboard`への書き出し
#[derive(Debug, Clone, Copy, Default)]
pub struct ClipboardSink;

impl TextSink for ClipboardSink {
    fn write_text(&self, text: String) -> LocalBoxFuture<'static, Result<(), UiError>> {
        async move {
            let window = web_sys::window().ok_or(UiError::Unavailable("window"))?;
            // 非セキュアコンテキストなどで使えない場合はwriteTextが拒否される
            let clipboard = window.navigator().clipboard();
            JsFuture::from(clipboard.write_text(&text))
                .await
                .map_err(|err| UiError::Clipboard(format!("{:?}", err)))?;
            Ok(())
        }
        .boxed_local()
    }
}

/// 固定長リングバッファのロガー
///
/// `record`のたびに容量を超えた分だけ古いレコードから捨てるため、
/// バッファ長は常に容量以下に保たれます。
pub struct RingLogger {
    buffer: VecDeque<LogRecord>,
    capacity: usize,
    clock: Rc<dyn Clock>,
    /// コンソール出力時のタグ
    tag: String,
}

impl RingLogger {
    /// 既定容量（400件）のロガーを作成
    pub fn new(clock: Rc<dyn Clock>) -> Self {
        Self::with_capacity(LOG_CAPACITY, clock)
    }

    /// 容量を指定してロガーを作成（最小1件）
    pub fn with_capacity(capacity: usize, clock: Rc<dyn Clock>) -> Self {
        let capacity = capacity.max(1);
        Self {
            buffer: VecDeque::with_capacity(capacity),
            capacity,
            clock,
            tag: "ring".to_string(),
        }
    }

    /// レコードを追加
    ///
    /// # 引数
    ///
    /// * `level` - ログレベル
    /// * `evt` - イベント名
    /// * `data` - 付加情報（空でないオブジェクト以外は捨てる）
    pub fn record(&mut self, level: LogLevel, evt: &str, data: Option<Value>) {
        let data = data.filter(|value| value.as_object().map_or(false, |map| !map.is_empty()));
        let record = LogRecord {
            ts: iso_timestamp(self.clock.now_millis()),
            level,
            evt: evt.to_string(),
            data,
        };

        mirror_to_console(&self.tag, &record);

        self.buffer.push_back(record);
        while self.buffer.len() > self.capacity {
            self.buffer.pop_front();
        }
    }

    pub fn debug(&mut self, evt: &str, data: Option<Value>) {
        self.record(LogLevel::Debug, evt, data);
    }

    pub fn info(&mut self, evt: &str, data: Option<Value>) {
        self.record(LogLevel::Info, evt, data);
    }

    pub fn warn(&mut self, evt: &str, data: Option<Value>) {
        self.record(LogLevel::Warning, evt, data);
    }

    pub fn error(&mut self, evt: &str, data: Option<Value>) {
        self.record(LogLevel::Error, evt, data);
    }

    /// 全レコードを古い順にJSON Lines形式で書き出す
    pub fn export_all(&self) -> String {
        self.buffer
            .iter()
            .map(LogRecord::to_json)
            .collect::<Vec<_>>()
            .join("\n")
    }

    /// 書き出した内容を`sink`へコピーするタスクを作る
    ///
    /// 内容はこの時点で確定するため、タスクの完了を待たずに記録を続けてよい。
    /// 失敗は`Err`として返し、扱いは呼び出し側に任せる。
    ///
    /// # 戻り値
    ///
    /// * 書き出したバイト数
    pub fn copy_to(&self, sink: &dyn TextSink) -> LocalBoxFuture<'static, Result<usize, UiError>> {
        let text = self.export_all();
        let bytes = text.len();
        let write = sink.write_text(text);
        async move { write.await.map(|_| bytes) }.boxed_local()
    }

    /// バッファを空にする
    pub fn clear(&mut self) {
        self.buffer.clear();
    }

    pub fn len(&self) -> usize {
        self.buffer.len()
    }

    pub fn is_empty(&self) -> bool {
        self.buffer.is_empty()
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// 古い順のレコード
    pub fn records(&self) -> impl Iterator<Item = &LogRecord> {
        self.buffer.iter()
    }
}

/// レコードを`log`クレートへ転送
fn mirror_to_console(tag: &str, record: &LogRecord) {
    let data = record
        .data
        .as_ref()
        .map(|data| format!(" {}", data))
        .unwrap_or_default();

    match record.level {
        LogLevel::Debug => log::debug!("[{}] {}{}", tag, record.evt, data),
        LogLevel::Info => log::info!("[{}] {}{}", tag, record.evt, data),
        LogLevel::Warning => log::warn!("[{}] {}{}", tag, record.evt, data),
        LogLevel::Error => log::error!("[{}] {}{}", tag, record.evt, data),
    }
}


#[cfg(all(test, target_arch = "wasm32"))]
mod browser_tests {
    use super::*;
    use wasm_bindgen_test::*;

    wasm_bindgen_test_configure!(run_in_browser);

    #[wasm_bindgen_test]
    async fn test_clipboard_sink_settles_without_panicking() {
        // ヘッドレス環境では権限が無く拒否されうるが、その場合もエラーとして返る
        let result = ClipboardSink.write_text("clipboard test".to_string()).await;
        assert!(matches!(result, Ok(()) | Err(UiError::Clipboard(_))));
    }
}

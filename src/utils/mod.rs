//! ユーティリティモジュール
//!
//! UI層全体で使う時間管理、ID生成、診断ログを提供します。

pub mod id_generator;
pub mod logger;
pub mod time;

// サブモジュールの再エクスポート
pub use id_generator::*;
pub use logger::*;
pub use time::*;

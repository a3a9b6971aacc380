//! ID生成ユーティリティモジュール
//!
//! エフェクトインスタンスやタイマーに割り当てる連番IDを生成します。

use std::cell::Cell;

/// シンプルな連番ID生成器
#[derive(Debug)]
pub struct IdGenerator {
    /// 次に生成するID値
    next_id: Cell<u64>,
}

impl IdGenerator {
    /// 新しいID生成器を作成（最初のIDは1）
    pub fn new() -> Self {
        Self {
            next_id: Cell::new(1),
        }
    }

    /// 新しいIDを払い出す
    pub fn next_id(&self) -> u64 {
        let id = self.next_id.get();
        self.next_id.set(id.wrapping_add(1));
        id
    }
}

impl Default for IdGenerator {
    fn default() -> Self {
        Self::new()
    }
}

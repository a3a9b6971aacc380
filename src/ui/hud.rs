//! HUDモジュール
//!
//! デバッグ表示、スコア・タイマー、ステージクリア/失敗のオーバーレイ、
//! バージョン表記を扱います。どれも要素が無ければ何もしません。

use crate::config::ElementIds;
use crate::surface::{Surface, SurfaceFactory};

/// デバッグ表示の項目
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum DebugField {
    Fps,
    Pos,
    Vel,
    Ground,
    Coyote,
    Buffer,
    Keys,
    Press,
    Fired,
}

impl DebugField {
    pub const ALL: [DebugField; 9] = [
        DebugField::Fps,
        DebugField::Pos,
        DebugField::Vel,
        DebugField::Ground,
        DebugField::Coyote,
        DebugField::Buffer,
        DebugField::Keys,
        DebugField::Press,
        DebugField::Fired,
    ];

    /// 項目名から変換（大文字小文字は区別しない）
    pub fn parse(name: &str) -> Option<Self> {
        match name.to_ascii_lowercase().as_str() {
            "fps" => Some(DebugField::Fps),
            "pos" => Some(DebugField::Pos),
            "vel" => Some(DebugField::Vel),
            "ground" => Some(DebugField::Ground),
            "coyote" => Some(DebugField::Coyote),
            "buffer" => Some(DebugField::Buffer),
            "keys" => Some(DebugField::Keys),
            "press" => Some(DebugField::Press),
            "fired" => Some(DebugField::Fired),
            _ => None,
        }
    }

    fn element_id<'a>(&self, ids: &'a ElementIds) -> &'a str {
        match self {
            DebugField::Fps => &ids.dbg_fps,
            DebugField::Pos => &ids.dbg_pos,
            DebugField::Vel => &ids.dbg_vel,
            DebugField::Ground => &ids.dbg_ground,
            DebugField::Coyote => &ids.dbg_coyote,
            DebugField::Buffer => &ids.dbg_buffer,
            DebugField::Keys => &ids.dbg_keys,
            DebugField::Press => &ids.dbg_press,
            DebugField::Fired => &ids.dbg_fired,
        }
    }
}

/// HUD要素
pub struct Hud<S: Surface> {
    debug: Vec<(DebugField, S)>,
    score: Option<S>,
    timer: Option<S>,
    stage_clear: Option<S>,
    stage_fail: Option<S>,
    version_pill: Option<S>,
    start_version: Option<S>,
}

impl<S: Surface> Hud<S> {
    /// ドキュメントから要素を集めてHUDを作成
    pub fn locate<F: SurfaceFactory<Node = S>>(factory: &F, ids: &ElementIds) -> Self {
        let debug = DebugField::ALL
            .iter()
            .filter_map(|field| factory.lookup(field.element_id(ids)).map(|node| (*field, node)))
            .collect();

        Self {
            debug,
            score: factory.lookup(&ids.score),
            timer: factory.lookup(&ids.timer),
            stage_clear: factory.lookup(&ids.stage_clear),
            stage_fail: factory.lookup(&ids.stage_fail),
            version_pill: factory.lookup(&ids.version_pill),
            start_version: factory.lookup(&ids.start_version),
        }
    }

    /// デバッグ項目の表示を更新
    pub fn set_debug(&self, field: DebugField, value: &str) {
        if let Some((_, node)) = self.debug.iter().find(|(f, _)| *f == field) {
            node.set_text(value);
        }
    }

    pub fn set_score(&self, score: &str) {
        if let Some(node) = &self.score {
            node.set_text(score);
        }
    }

    pub fn set_timer(&self, timer: &str) {
        if let Some(node) = &self.timer {
            node.set_text(timer);
        }
    }

    pub fn show_stage_clear(&self) {
        if let Some(node) = &self.stage_clear {
            node.set_hidden(false);
        }
    }

    pub fn show_stage_fail(&self) {
        if let Some(node) = &self.stage_fail {
            node.set_hidden(false);
        }
    }

    /// クリア・失敗のオーバーレイを両方隠す
    pub fn hide_stage_overlays(&self) {
        for node in [&self.stage_clear, &self.stage_fail].into_iter().flatten() {
            node.set_hidden(true);
        }
    }

    /// バージョン表記（`v{version}`）を書き込む
    pub fn set_version(&self, version: &str) {
        let badge = format!("v{}", version);
        for node in [&self.version_pill, &self.start_version].into_iter().flatten() {
            node.set_text(&badge);
        }
    }
}

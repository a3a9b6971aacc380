//! 座標変換モジュール
//!
//! ワールド座標をスクリーン（CSSピクセル）座標に変換します。
//! 表示倍率はグローバル状態から読まず、呼び出し側から明示的に渡します。

/// カメラ（ビューポート原点のワールド座標）
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct CameraState {
    pub x: f64,
    pub y: f64,
}

impl CameraState {
    pub fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }
}

/// ダイアログが追従するエンティティの位置と高さ
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct EntitySnapshot {
    pub x: f64,
    pub y: f64,
    pub h: f64,
}

impl EntitySnapshot {
    pub fn new(x: f64, y: f64, h: f64) -> Self {
        Self { x, y, h }
    }

    /// 頭頂（アンカー点）のワールド座標
    pub fn top_anchor(&self) -> (f64, f64) {
        (self.x, self.y - self.h / 2.0)
    }
}

/// 表示倍率（ワールド1単位あたりのCSSピクセル）
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DisplayScale(f64);

impl DisplayScale {
    /// 倍率を作成。0以下や非有限値は未設定とみなして1.0にする
    pub fn new(scale: f64) -> Self {
        if scale.is_finite() && scale > 0.0 {
            Self(scale)
        } else {
            Self(1.0)
        }
    }

    pub fn get(&self) -> f64 {
        self.0
    }
}

impl Default for DisplayScale {
    fn default() -> Self {
        Self(1.0)
    }
}

/// スクリーン座標と、変換に使った倍率
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ScreenPoint {
    pub x: f64,
    pub y: f64,
    pub scale: f64,
}

/// ワールド座標をスクリーン座標に変換
pub fn to_screen(world_x: f64, world_y: f64, camera: &CameraState, scale: DisplayScale) -> ScreenPoint {
    let scale = scale.get();
    ScreenPoint {
        x: (world_x - camera.x) * scale,
        y: (world_y - camera.y) * scale,
        scale,
    }
}

/// CSSのピクセル値として書式化
pub fn px(value: f64) -> String {
    format!("{}px", value)
}

//! 歩行者ダイアログモジュール
//!
//! 吹き出しダイアログの表示・非表示と、動くエンティティの頭上への追従を扱います。
//! リサイズ時には新しい位置情報が届かないため、最後に同期できた
//! エンティティとカメラの組を保持して再同期に使います。

use super::coords::{px, to_screen, CameraState, DisplayScale, EntitySnapshot, ScreenPoint};
use super::i18n::resolve_dialog;
use crate::surface::Surface;

/// ダイアログを隠すときに付けるクラス
pub const HIDDEN_CLASS: &str = "hidden";

/// 表示中のダイアログ
#[derive(Debug, Clone, Default, PartialEq)]
pub struct DialogState {
    pub visible: bool,
    pub key: Option<String>,
}

/// エンティティに追従するダイアログ
pub struct DialogAnchor<S: Surface> {
    container: Option<S>,
    text: Option<S>,
    state: DialogState,
    language: String,
    /// 頭上に浮かせる縦オフセット（ワールド単位）
    offset: f64,
    last: Option<(EntitySnapshot, CameraState)>,
}

impl<S: Surface> DialogAnchor<S> {
    /// 新しいダイアログを作成
    ///
    /// # 引数
    ///
    /// * `container` - ダイアログ要素（無い場合すべての操作が何もしない）
    /// * `text` - 文言を書き込むテキストノード
    /// * `language` - 初期言語
    /// * `offset` - 頭上オフセット
    pub fn new(container: Option<S>, text: Option<S>, language: &str, offset: f64) -> Self {
        let visible = container
            .as_ref()
            .map_or(false, |container| !container.has_class(HIDDEN_CLASS));
        Self {
            container,
            text,
            state: DialogState { visible, key: None },
            language: language.to_string(),
            offset,
            last: None,
        }
    }

    /// キーに対応する文言でダイアログを表示
    pub fn show(&mut self, key: &str) {
        let Some(container) = &self.container else {
            return;
        };
        if let Some(text) = &self.text {
            text.set_text(&resolve_dialog(key, &self.language));
        }
        container.set_class(HIDDEN_CLASS, false);
        self.state = DialogState {
            visible: true,
            key: Some(key.to_string()),
        };
        log::debug!("💬 dialog shown: {}", key);
    }

    /// ダイアログを隠す
    pub fn hide(&mut self) {
        if let Some(container) = &self.container {
            container.set_class(HIDDEN_CLASS, true);
        }
        self.state = DialogState::default();
    }

    /// 言語を切り替え、表示中の文言を描き直す
    pub fn set_language(&mut self, language: &str) {
        self.language = language.to_string();
        if let (Some(key), Some(text)) = (&self.state.key, &self.text) {
            text.set_text(&resolve_dialog(key, &self.language));
        }
    }

    pub fn language(&self) -> &str {
        &self.language
    }

    pub fn state(&self) -> &DialogState {
        &self.state
    }

    pub fn is_visible(&self) -> bool {
        self.container.is_some() && self.state.visible
    }

    /// ダイアログをエンティティの頭上に移動
    ///
    /// ダイアログが非表示のとき、またはどちらかの引数が無いときは何もしない。
    ///
    /// # 戻り値
    ///
    /// * 配置したスクリーン座標（`y`はオフセット適用後）
    pub fn sync(
        &mut self,
        entity: Option<&EntitySnapshot>,
        camera: Option<&CameraState>,
        scale: DisplayScale,
    ) -> Option<ScreenPoint> {
        if !self.is_visible() {
            return None;
        }
        let (entity, camera) = (entity?, camera?);
        let container = self.container.as_ref()?;

        self.last = Some((*entity, *camera));

        let (anchor_x, anchor_y) = entity.top_anchor();
        let point = to_screen(anchor_x, anchor_y, camera, scale);
        let top = point.y - self.offset * point.scale;

        container.set_style("left", &px(point.x));
        container.set_style("top", &px(top));

        Some(ScreenPoint { y: top, ..point })
    }

    /// 最後に同期した組でもう一度同期する（リサイズ・画面回転時）
    pub fn resync(&mut self, scale: DisplayScale) -> Option<ScreenPoint> {
        let (entity, camera) = self.last?;
        self.sync(Some(&entity), Some(&camera), scale)
    }

    /// 最後に同期したエンティティとカメラ
    pub fn last_snapshot(&self) -> Option<(EntitySnapshot, CameraState)> {
        self.last
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::surface::{MemorySurface, Surface};

    fn anchor(language: &str) -> (DialogAnchor<MemorySurface>, MemorySurface, MemorySurface) {
        let container = MemorySurface::new("div");
        container.set_class(HIDDEN_CLASS, true);
        let text = MemorySurface::new("span");
        container.append_child(&text);
        let anchor = DialogAnchor::new(Some(container.clone()), Some(text.clone()), language, 28.0);
        (anchor, container, text)
    }

    #[test]
    fn test_show_and_hide() {
        let (mut dialog, container, text) = anchor("en");

        dialog.show("wait");
        assert!(!container.has_class(HIDDEN_CLASS));
        assert_eq!(text.text(), "Wait for the light to turn green before crossing");
        assert_eq!(dialog.state().key.as_deref(), Some("wait"));

        dialog.hide();
        assert!(container.has_class(HIDDEN_CLASS));
        assert_eq!(dialog.state(), &DialogState::default());
    }

    #[test]
    fn test_unsupported_language_shows_raw_key() {
        let (mut dialog, _container, text) = anchor("xx");
        dialog.show("wait");
        assert_eq!(text.text(), "wait");
    }

    #[test]
    fn test_language_change_rerenders_visible_dialog() {
        let (mut dialog, _container, text) = anchor("en");
        dialog.show("wait");
        dialog.set_language("ja");
        assert_eq!(text.text(), "青に変わるまでお待ちください");

        // 隠した後は描き直さない
        dialog.hide();
        dialog.set_language("zh-Hans");
        assert_eq!(text.text(), "青に変わるまでお待ちください");
    }

    #[test]
    fn test_sync_positions_above_head() {
        let (mut dialog, container, _text) = anchor("en");
        dialog.show("wait");

        let entity = EntitySnapshot::new(110.0, 80.0, 20.0);
        let camera = CameraState::new(10.0, 30.0);
        let point = dialog
            .sync(Some(&entity), Some(&camera), DisplayScale::new(2.0))
            .unwrap();

        // x = (110-10)*2 = 200, y = (70-30)*2 = 80, top = 80 - 28*2 = 24
        assert_eq!((point.x, point.y), (200.0, 24.0));
        assert_eq!(container.style("left").as_deref(), Some("200px"));
        assert_eq!(container.style("top").as_deref(), Some("24px"));
    }

    #[test]
    fn test_sync_is_noop_when_hidden_or_missing_args() {
        let (mut dialog, container, _text) = anchor("en");
        let entity = EntitySnapshot::new(1.0, 2.0, 3.0);
        let camera = CameraState::default();

        assert!(dialog.sync(Some(&entity), Some(&camera), DisplayScale::default()).is_none());
        assert!(container.style("left").is_none());
        assert!(dialog.last_snapshot().is_none());

        dialog.show("wait");
        assert!(dialog.sync(None, Some(&camera), DisplayScale::default()).is_none());
        assert!(dialog.sync(Some(&entity), None, DisplayScale::default()).is_none());
        assert!(container.style("left").is_none());
    }

    #[test]
    fn test_resync_matches_repeated_sync() {
        let (mut dialog, container, _text) = anchor("en");
        dialog.show("wait");

        let entity = EntitySnapshot::new(50.0, 60.0, 16.0);
        let camera = CameraState::new(5.0, 5.0);
        let scale = DisplayScale::new(1.5);

        dialog.sync(Some(&entity), Some(&camera), scale);
        let resynced = dialog.resync(scale).unwrap();
        let left_after_resync = container.style("left");
        let top_after_resync = container.style("top");

        let again = dialog.sync(Some(&entity), Some(&camera), scale).unwrap();
        assert_eq!(resynced, again);
        assert_eq!(container.style("left"), left_after_resync);
        assert_eq!(container.style("top"), top_after_resync);
    }

    #[test]
    fn test_resync_uses_new_scale() {
        let (mut dialog, container, _text) = anchor("en");
        dialog.show("wait");
        dialog.sync(
            Some(&EntitySnapshot::new(10.0, 40.0, 0.0)),
            Some(&CameraState::default()),
            DisplayScale::new(1.0),
        );

        dialog.resync(DisplayScale::new(2.0));
        assert_eq!(container.style("left").as_deref(), Some("20px"));
        assert_eq!(container.style("top").as_deref(), Some("24px"));
    }

    #[test]
    fn test_resync_without_snapshot_is_noop() {
        let (mut dialog, _container, _text) = anchor("en");
        dialog.show("wait");
        assert!(dialog.resync(DisplayScale::default()).is_none());
    }

    #[test]
    fn test_missing_container_is_silent() {
        let mut dialog: DialogAnchor<MemorySurface> = DialogAnchor::new(None, None, "en", 28.0);
        dialog.show("wait");
        assert!(!dialog.is_visible());
        assert!(dialog
            .sync(
                Some(&EntitySnapshot::default()),
                Some(&CameraState::default()),
                DisplayScale::default()
            )
            .is_none());
        dialog.hide();
    }
}

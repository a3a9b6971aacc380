//! スタート画面モジュール
//!
//! ゲーム開始前の画面を「読み込み中 → 準備完了 / エラー」の状態機械で管理します。
//!
//! ```text
//! Loading --(読み込み成功)--> Ready --(Start押下)--> ゲームループへ
//!    ^
//!    +--(Retry押下)-- Error <--(読み込み失敗)-- Loading
//! ```
//!
//! ボタンは状態と連動して表示・非表示が切り替わるため、UIからは
//! 不正な遷移を起こせません。Rust APIから不正な遷移を要求した場合は
//! `UiError::InvalidTransition`を返し、状態は変わりません。

use crate::error::UiError;
use crate::surface::Surface;

/// 読み込み中に表示する文言
pub const LOADING_MESSAGE: &str = "Loading...";
/// 読み込み失敗時に表示する文言
pub const LOAD_FAILED_MESSAGE: &str = "Failed to load resources";

/// スタート画面の状態
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StartScreenState {
    /// リソース読み込み中
    Loading,
    /// 読み込み完了、Startボタン表示中
    Ready,
    /// 読み込み失敗、Retryボタン表示中
    Error,
}

/// スタート画面を構成する要素
pub struct StartScreenSurfaces<S: Surface> {
    pub page: Option<S>,
    pub status: Option<S>,
    pub start_button: Option<S>,
    pub retry_button: Option<S>,
}

/// ボタン押下時に一度だけ呼ばれるコールバック
pub type ScreenCallback = Box<dyn FnOnce()>;

/// スタート画面の状態機械
pub struct StartScreen<S: Surface> {
    surfaces: StartScreenSurfaces<S>,
    state: StartScreenState,
    message: String,
    /// Startが押され、制御をゲームループに渡した後か
    started: bool,
    on_start: Option<ScreenCallback>,
    on_retry: Option<ScreenCallback>,
}

impl<S: Surface> StartScreen<S> {
    /// 読み込み中の状態でスタート画面を作成
    pub fn new(surfaces: StartScreenSurfaces<S>) -> Self {
        let mut screen = Self {
            surfaces,
            state: StartScreenState::Loading,
            message: String::new(),
            started: false,
            on_start: None,
            on_retry: None,
        };
        screen.enter_loading();
        screen
    }

    pub fn state(&self) -> StartScreenState {
        self.state
    }

    pub fn status_message(&self) -> &str {
        &self.message
    }

    pub fn is_started(&self) -> bool {
        self.started
    }

    /// ステータス文言を書き換える（どの状態でも可）
    pub fn set_status(&mut self, message: &str) {
        self.message = message.to_string();
        if let Some(status) = &self.surfaces.status {
            status.set_text(message);
        }
    }

    /// 読み込み中の表示に戻す（Loading または Error から）
    pub fn show_loading(&mut self) -> Result<(), UiError> {
        self.require(&[StartScreenState::Loading, StartScreenState::Error], "show loading")?;
        self.on_retry = None;
        self.enter_loading();
        Ok(())
    }

    /// 読み込み成功: Loading → Ready
    ///
    /// # 引数
    ///
    /// * `on_start` - Start押下時に一度だけ呼ばれる
    pub fn show_start(&mut self, on_start: ScreenCallback) -> Result<(), UiError> {
        self.require(&[StartScreenState::Loading], "show start")?;

        self.set_status("");
        set_hidden(&self.surfaces.retry_button, true);
        set_hidden(&self.surfaces.start_button, false);

        self.on_start = Some(on_start);
        self.transition(StartScreenState::Ready);
        Ok(())
    }

    /// 読み込み失敗: Loading → Error
    ///
    /// # 引数
    ///
    /// * `on_retry` - Retry押下時に一度だけ呼ばれる
    pub fn show_error(&mut self, on_retry: ScreenCallback) -> Result<(), UiError> {
        self.require(&[StartScreenState::Loading], "show error")?;

        self.set_status(LOAD_FAILED_MESSAGE);
        set_hidden(&self.surfaces.start_button, true);
        set_hidden(&self.surfaces.retry_button, false);
        set_hidden(&self.surfaces.page, false);

        self.on_retry = Some(on_retry);
        self.transition(StartScreenState::Error);
        Ok(())
    }

    /// Start押下の処理を行い、呼ぶべきコールバックを返す
    ///
    /// コールバックを内部の借用の外で呼びたい場合（JSからの再入がありうる場合）に使う。
    pub fn take_start_action(&mut self) -> Result<Option<ScreenCallback>, UiError> {
        self.require(&[StartScreenState::Ready], "start")?;

        set_hidden(&self.surfaces.page, true);
        self.started = true;
        log::info!("▶️ start screen handed control to the game loop");
        Ok(self.on_start.take())
    }

    /// Start押下: 画面を隠し、開始コールバックを呼ぶ
    pub fn activate_start(&mut self) -> Result<(), UiError> {
        if let Some(on_start) = self.take_start_action()? {
            on_start();
        }
        Ok(())
    }

    /// Retry押下の処理を行い、呼ぶべきコールバックを返す
    pub fn take_retry_action(&mut self) -> Result<Option<ScreenCallback>, UiError> {
        self.require(&[StartScreenState::Error], "retry")?;

        let on_retry = self.on_retry.take();
        self.enter_loading();
        Ok(on_retry)
    }

    /// Retry押下: Error → Loading にしてから再試行コールバックを呼ぶ
    pub fn activate_retry(&mut self) -> Result<(), UiError> {
        if let Some(on_retry) = self.take_retry_action()? {
            on_retry();
        }
        Ok(())
    }

    fn enter_loading(&mut self) {
        self.set_status(LOADING_MESSAGE);
        set_hidden(&self.surfaces.start_button, true);
        set_hidden(&self.surfaces.retry_button, true);
        set_hidden(&self.surfaces.page, false);
        self.transition(StartScreenState::Loading);
    }

    fn transition(&mut self, next: StartScreenState) {
        if self.state != next {
            log::info!("start screen: {:?} -> {:?}", self.state, next);
        }
        self.state = next;
    }

    fn require(&self, allowed: &[StartScreenState], action: &'static str) -> Result<(), UiError> {
        if !self.started && allowed.contains(&self.state) {
            Ok(())
        } else {
            log::warn!("start screen: cannot {} in {:?}", action, self.state);
            Err(UiError::InvalidTransition {
                state: self.state,
                action,
            })
        }
    }
}

fn set_hidden<S: Surface>(surface: &Option<S>, hidden: bool) {
    if let Some(surface) = surface {
        surface.set_hidden(hidden);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::surface::MemorySurface;
    use std::cell::Cell;
    use std::rc::Rc;

    struct Fixture {
        screen: StartScreen<MemorySurface>,
        page: MemorySurface,
        status: MemorySurface,
        start: MemorySurface,
        retry: MemorySurface,
    }

    fn fixture() -> Fixture {
        let page = MemorySurface::new("section");
        let status = MemorySurface::new("p");
        let start = MemorySurface::new("button");
        let retry = MemorySurface::new("button");
        let screen = StartScreen::new(StartScreenSurfaces {
            page: Some(page.clone()),
            status: Some(status.clone()),
            start_button: Some(start.clone()),
            retry_button: Some(retry.clone()),
        });
        Fixture {
            screen,
            page,
            status,
            start,
            retry,
        }
    }

    fn counter() -> (Rc<Cell<u32>>, ScreenCallback) {
        let count = Rc::new(Cell::new(0));
        let inner = Rc::clone(&count);
        (count, Box::new(move || inner.set(inner.get() + 1)))
    }

    #[test]
    fn test_initial_loading_state() {
        let f = fixture();
        assert_eq!(f.screen.state(), StartScreenState::Loading);
        assert_eq!(f.status.text(), "Loading...");
        assert!(f.start.is_hidden());
        assert!(f.retry.is_hidden());
        assert!(!f.page.is_hidden());
    }

    #[test]
    fn test_loading_to_ready_to_started() {
        let mut f = fixture();
        let (started, on_start) = counter();

        f.screen.show_start(on_start).unwrap();
        assert_eq!(f.screen.state(), StartScreenState::Ready);
        assert_eq!(f.status.text(), "");
        assert!(!f.start.is_hidden());
        assert!(f.retry.is_hidden());

        f.screen.activate_start().unwrap();
        assert!(f.page.is_hidden());
        assert_eq!(started.get(), 1);
        assert!(f.screen.is_started());

        // 制御を渡した後は何もできない
        assert!(f.screen.activate_start().is_err());
        assert!(f.screen.show_loading().is_err());
        assert_eq!(started.get(), 1);
    }

    #[test]
    fn test_loading_to_error() {
        let mut f = fixture();
        let (_retried, on_retry) = counter();

        f.screen.show_error(on_retry).unwrap();
        assert_eq!(f.screen.state(), StartScreenState::Error);
        assert_eq!(f.status.text(), "Failed to load resources");
        assert!(f.start.is_hidden());
        assert!(!f.retry.is_hidden());
        assert!(!f.page.is_hidden());
    }

    #[test]
    fn test_fail_retry_success_sequence() {
        let mut f = fixture();
        let (retried, on_retry) = counter();
        let (started, on_start) = counter();

        f.screen.show_error(on_retry).unwrap();
        f.screen.activate_retry().unwrap();

        assert_eq!(f.screen.state(), StartScreenState::Loading);
        assert_eq!(f.status.text(), "Loading...");
        assert!(f.start.is_hidden());
        assert!(f.retry.is_hidden());
        assert_eq!(retried.get(), 1);

        f.screen.show_start(on_start).unwrap();
        assert_eq!(f.screen.state(), StartScreenState::Ready);
        f.screen.activate_start().unwrap();

        assert_eq!(started.get(), 1);
        assert_eq!(retried.get(), 1);
    }

    #[test]
    fn test_transition_closure() {
        let mut f = fixture();

        // Loading からは Ready / Error のみ
        assert!(f.screen.activate_start().is_err());
        assert!(f.screen.activate_retry().is_err());

        // Error からは Loading のみ
        let (_, on_retry) = counter();
        f.screen.show_error(on_retry).unwrap();
        let (_, on_start) = counter();
        assert_eq!(
            f.screen.show_start(on_start),
            Err(UiError::InvalidTransition {
                state: StartScreenState::Error,
                action: "show start",
            })
        );
        let (_, again) = counter();
        assert!(f.screen.show_error(again).is_err());
        assert!(f.screen.activate_start().is_err());
        assert_eq!(f.screen.state(), StartScreenState::Error);

        // Ready からは Start 押下のみ
        f.screen.activate_retry().unwrap();
        let (_, on_start) = counter();
        f.screen.show_start(on_start).unwrap();
        let (_, on_retry) = counter();
        assert!(f.screen.show_error(on_retry).is_err());
        assert!(f.screen.activate_retry().is_err());
        assert_eq!(f.screen.state(), StartScreenState::Ready);
    }

    #[test]
    fn test_show_loading_from_error_drops_retry_callback() {
        let mut f = fixture();
        let (retried, on_retry) = counter();

        f.screen.show_error(on_retry).unwrap();
        f.screen.show_loading().unwrap();
        assert_eq!(f.screen.state(), StartScreenState::Loading);
        assert!(f.retry.is_hidden());
        assert_eq!(retried.get(), 0);
    }

    #[test]
    fn test_take_start_action_defers_callback() {
        let mut f = fixture();
        let (started, on_start) = counter();
        f.screen.show_start(on_start).unwrap();

        let action = f.screen.take_start_action().unwrap();
        assert!(f.page.is_hidden());
        assert_eq!(started.get(), 0);

        action.unwrap()();
        assert_eq!(started.get(), 1);
    }

    #[test]
    fn test_set_status_any_state() {
        let mut f = fixture();
        f.screen.set_status("42%");
        assert_eq!(f.status.text(), "42%");
        assert_eq!(f.screen.status_message(), "42%");
        assert_eq!(f.screen.state(), StartScreenState::Loading);
    }

    #[test]
    fn test_missing_surfaces_still_track_state() {
        let mut screen: StartScreen<MemorySurface> = StartScreen::new(StartScreenSurfaces {
            page: None,
            status: None,
            start_button: None,
            retry_button: None,
        });
        let (started, on_start) = counter();
        screen.show_start(on_start).unwrap();
        screen.activate_start().unwrap();
        assert_eq!(started.get(), 1);
    }
}

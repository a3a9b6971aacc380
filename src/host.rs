//! ホストページとの接続モジュール
//!
//! JavaScript側のフック（音声・デザインモード）をトレイト実装に包み、
//! DOMイベントのリスナーを登録します。リスナーは`EventListeners`が保持し、
//! 破棄時に取り外します。

use std::cell::RefCell;
use std::rc::{Rc, Weak};

use gloo_timers::callback::Timeout;
use js_sys::{Function, Reflect};
use wasm_bindgen::prelude::*;
use wasm_bindgen::JsCast;
use web_sys::{Element, Event, EventTarget, HtmlCanvasElement, HtmlSelectElement};

use crate::surface::{DomDocument, SurfaceFactory};
use crate::ui::controls::INTERACTIVE_SELECTOR;
use crate::ui::{
    AudioHooks, AudioUnlock, CameraState, DesignMode, EntitySnapshot, FullscreenAction, UiController,
};
use crate::utils::ClipboardSink;

/// ブラウザ上のUIコントローラ
pub type SharedController = Rc<RefCell<UiController<DomDocument>>>;

/// JSオブジェクトのメソッドを呼ぶ
fn call_method(target: &JsValue, name: &str) -> Option<JsValue> {
    let method = Reflect::get(target, &JsValue::from_str(name))
        .ok()?
        .dyn_into::<Function>()
        .ok()?;
    match method.call0(target) {
        Ok(value) => Some(value),
        Err(err) => {
            log::warn!("host hook {}() threw: {:?}", name, err);
            None
        }
    }
}

/// `{ resumeAudio, toggleMusic }`を持つJSオブジェクト
pub struct JsAudioHooks {
    hooks: JsValue,
}

impl JsAudioHooks {
    pub fn new(hooks: JsValue) -> Self {
        Self { hooks }
    }
}

impl AudioHooks for JsAudioHooks {
    fn resume_audio(&self) {
        call_method(&self.hooks, "resumeAudio");
    }

    fn toggle_music(&self) -> bool {
        call_method(&self.hooks, "toggleMusic")
            .and_then(|value| value.as_bool())
            .unwrap_or(false)
    }
}

/// `{ enable, toggleTransparent, toggleDestroyable, save, addBlock }`を持つJSオブジェクト
pub struct JsDesignMode {
    design: JsValue,
}

impl JsDesignMode {
    /// フックの`design`プロパティから作成。無ければ`None`
    pub fn from_hooks(hooks: &JsValue) -> Option<Self> {
        let design = Reflect::get(hooks, &JsValue::from_str("design")).ok()?;
        if design.is_undefined() || design.is_null() {
            return None;
        }
        Some(Self { design })
    }
}

impl DesignMode for JsDesignMode {
    fn enable(&self) -> bool {
        call_method(&self.design, "enable")
            .and_then(|value| value.as_bool())
            .unwrap_or(false)
    }

    fn toggle_transparent(&self) {
        call_method(&self.design, "toggleTransparent");
    }

    fn toggle_destroyable(&self) {
        call_method(&self.design, "toggleDestroyable");
    }

    fn save(&self) {
        call_method(&self.design, "save");
    }

    fn add_block(&self) {
        call_method(&self.design, "addBlock");
    }
}

/// JSオブジェクトの数値プロパティ
fn js_number(object: &JsValue, key: &str) -> Option<f64> {
    Reflect::get(object, &JsValue::from_str(key)).ok()?.as_f64()
}

/// `{x, y, h}`からエンティティ位置を読む（欠けていれば`None`）
pub fn entity_from_js(value: &JsValue) -> Option<EntitySnapshot> {
    if !value.is_object() {
        return None;
    }
    Some(EntitySnapshot::new(
        js_number(value, "x")?,
        js_number(value, "y")?,
        js_number(value, "h")?,
    ))
}

/// `{x, y}`からカメラ位置を読む（欠けていれば`None`）
pub fn camera_from_js(value: &JsValue) -> Option<CameraState> {
    if !value.is_object() {
        return None;
    }
    Some(CameraState::new(js_number(value, "x")?, js_number(value, "y")?))
}

/// フックの`version`プロパティ
pub fn hook_version(hooks: &JsValue) -> Option<String> {
    Reflect::get(hooks, &JsValue::from_str("version"))
        .ok()
        .and_then(|value| value.as_string().or_else(|| value.as_f64().map(|v| v.to_string())))
}

type Listener = Closure<dyn FnMut(Event)>;

/// 登録済みのイベントリスナー
#[derive(Default)]
pub struct EventListeners {
    entries: Vec<(EventTarget, &'static str, Listener)>,
}

impl EventListeners {
    pub fn new() -> Self {
        Self::default()
    }

    /// リスナーを登録して保持する
    pub fn listen(
        &mut self,
        target: &EventTarget,
        event: &'static str,
        handler: impl FnMut(Event) + 'static,
    ) {
        let closure = Closure::wrap(Box::new(handler) as Box<dyn FnMut(Event)>);
        match target.add_event_listener_with_callback(event, closure.as_ref().unchecked_ref()) {
            Ok(()) => self.entries.push((target.clone(), event, closure)),
            Err(err) => log::warn!("addEventListener({}) failed: {:?}", event, err),
        }
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// すべてのリスナーを取り外す
    pub fn clear(&mut self) {
        for (target, event, closure) in self.entries.drain(..) {
            let _ = target.remove_event_listener_with_callback(event, closure.as_ref().unchecked_ref());
        }
    }
}

impl Drop for EventListeners {
    fn drop(&mut self) {
        self.clear();
    }
}

/// ホストページへの接続に必要なもの
pub struct HostBindings {
    pub document: DomDocument,
    pub canvas: Option<HtmlCanvasElement>,
    pub audio: Option<Rc<JsAudioHooks>>,
    pub design: Option<Rc<JsDesignMode>>,
}

/// DOMイベントをコントローラに結びつける
///
/// リスナーはコントローラを弱参照で持つため、ハンドルが破棄された後の
/// イベントは何もしません。JSのフックやコールバックは内部の借用を
/// 解放してから呼び出します。
/// リサイズ・画面回転は登録しません。新しい倍率を持つホストが
/// `UiHandle::on_viewport_change`を呼びます。
pub fn bind_dom(controller: &SharedController, host: HostBindings) -> EventListeners {
    let mut listeners = EventListeners::new();
    let Some(window) = web_sys::window() else {
        log::warn!("window is not available; ui events are not bound");
        return listeners;
    };
    let ids = controller.borrow().config().ids.clone();
    let document = host.document.clone();
    let weak = Rc::downgrade(controller);

    let element = |id: &str| -> Option<EventTarget> {
        document
            .lookup(id)
            .map(|surface| surface.element().clone().unchecked_into::<EventTarget>())
    };

    // スタート画面
    if let Some(button) = element(&ids.btn_start) {
        let weak = weak.clone();
        listeners.listen(&button, "click", move |_| {
            let action = with_controller(&weak, |ui| ui.start_screen_mut().take_start_action());
            if let Some(Ok(Some(on_start))) = action {
                on_start();
            }
        });
    }
    if let Some(button) = element(&ids.btn_retry) {
        let weak = weak.clone();
        listeners.listen(&button, "click", move |_| {
            let action = with_controller(&weak, |ui| ui.start_screen_mut().take_retry_action());
            if let Some(Ok(Some(on_retry))) = action {
                on_retry();
            }
        });
    }

    // 診断ログ
    if let Some(button) = element(&ids.log_copy) {
        let weak = weak.clone();
        listeners.listen(&button, "click", move |_| {
            if let Some(copy) = with_controller(&weak, |ui| ui.copy_log(&ClipboardSink)) {
                wasm_bindgen_futures::spawn_local(async move {
                    match copy.await {
                        Ok(bytes) => log::info!("📋 copied {} bytes of diagnostics", bytes),
                        Err(err) => log::warn!("log copy failed: {}", err),
                    }
                });
            }
        });
    }
    if let Some(button) = element(&ids.log_clear) {
        let weak = weak.clone();
        listeners.listen(&button, "click", move |_| {
            with_controller(&weak, |ui| ui.clear_log());
        });
    }

    // 設定・情報パネル
    if let Some(button) = element(&ids.settings_toggle) {
        let weak = weak.clone();
        listeners.listen(&button, "click", move |_| {
            with_controller(&weak, |ui| ui.controls().toggle_settings());
        });
    }
    if let Some(button) = element(&ids.info_toggle) {
        let weak = weak.clone();
        listeners.listen(&button, "click", move |_| {
            with_controller(&weak, |ui| ui.controls().toggle_info());
        });
    }

    // BGM
    if let (Some(button), Some(audio)) = (element(&ids.bgm_toggle), host.audio.clone()) {
        let weak = weak.clone();
        listeners.listen(&button, "click", move |_| {
            let on = audio.toggle_music();
            with_controller(&weak, |ui| ui.controls().reflect_music(on));
        });
    }

    // 全画面
    if let Some(button) = element(&ids.fullscreen_toggle) {
        let weak = weak.clone();
        let dom = host.document.document().clone();
        let target: Option<Element> = document
            .lookup(&ids.game_col)
            .map(|surface| surface.element().clone().unchecked_into::<Element>())
            .or_else(|| host.canvas.clone().map(|canvas| canvas.unchecked_into::<Element>()));
        listeners.listen(&button, "click", move |_| {
            let is_fullscreen = dom.fullscreen_element().is_some();
            let Some(action) = with_controller(&weak, |ui| ui.controls().fullscreen_clicked(is_fullscreen)) else {
                return;
            };
            match action {
                FullscreenAction::Enter => {
                    if let Some(target) = &target {
                        let _ = target.request_fullscreen();
                    }
                }
                FullscreenAction::Exit => {
                    let _ = dom.exit_fullscreen();
                }
            }
            // 全画面の切り替えが反映されてからキャンバスを合わせ直す
            Timeout::new(0, request_canvas_resize).forget();
        });
    }

    // デザインモード
    if let Some(design) = host.design.clone() {
        if let Some(button) = element(&ids.design_enable) {
            let weak = weak.clone();
            let design = Rc::clone(&design);
            listeners.listen(&button, "click", move |_| {
                let on = design.enable();
                with_controller(&weak, |ui| ui.controls().reflect_design(on));
            });
        }
        let forwards: [(&str, fn(&JsDesignMode)); 4] = [
            (ids.design_transparent.as_str(), |d: &JsDesignMode| d.toggle_transparent()),
            (ids.design_destroyable.as_str(), |d: &JsDesignMode| d.toggle_destroyable()),
            (ids.design_save.as_str(), |d: &JsDesignMode| d.save()),
            (ids.design_add.as_str(), |d: &JsDesignMode| d.add_block()),
        ];
        for (id, forward) in forwards {
            if let Some(button) = element(id) {
                let design = Rc::clone(&design);
                listeners.listen(&button, "click", move |_| forward(design.as_ref()));
            }
        }
    }

    // 言語選択（初期値はコントローラ作成時に反映済み）
    if let Some(select) = element(&ids.lang_select) {
        let weak = weak.clone();
        listeners.listen(&select, "change", move |event| {
            let Some(language) = event
                .target()
                .and_then(|target| target.dyn_into::<HtmlSelectElement>().ok())
                .map(|select| select.value())
            else {
                return;
            };
            with_controller(&weak, |ui| ui.set_language(&language));
        });
    }

    // 最初のキー入力・ポインタ押下で音声を有効にする
    if let Some(audio) = host.audio.clone() {
        let unlock = Rc::new(AudioUnlock::new());
        for event in ["keydown", "pointerdown"] {
            let unlock = Rc::clone(&unlock);
            let audio = Rc::clone(&audio);
            listeners.listen(&window, event, move |_| {
                unlock.fire(audio.as_ref());
            });
        }
    }

    // 操作要素以外を押したらキャンバスにフォーカスを戻す
    if let Some(canvas) = host.canvas {
        let _ = canvas.set_attribute("tabindex", "0");
        let _ = canvas.focus();
        listeners.listen(&window, "pointerdown", move |event| {
            let interactive = event
                .target()
                .and_then(|target| target.dyn_into::<Element>().ok())
                .map_or(false, |element| element.matches(INTERACTIVE_SELECTOR).unwrap_or(false));
            if !interactive {
                event.prevent_default();
                let _ = canvas.focus();
            }
        });
    }

    log::info!("🔗 bound {} ui event listeners", listeners.len());
    listeners
}

/// コントローラが生きていれば借用して処理する
fn with_controller<T>(
    weak: &Weak<RefCell<UiController<DomDocument>>>,
    f: impl FnOnce(&mut UiController<DomDocument>) -> T,
) -> Option<T> {
    let controller = weak.upgrade()?;
    let mut ui = controller.try_borrow_mut().ok()?;
    Some(f(&mut ui))
}

/// ホストのキャンバスリサイズ処理（`window.__resizeGameCanvas`）を呼ぶ
fn request_canvas_resize() {
    if let Some(window) = web_sys::window() {
        call_method(&window.into(), "__resizeGameCanvas");
    }
}

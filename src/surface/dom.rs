//! DOMサーフェスモジュール
//!
//! `web-sys`の`HtmlElement`を`Surface`として扱います。

use wasm_bindgen::JsCast;
use web_sys::{Document, HtmlElement, HtmlSelectElement};

use super::{Surface, SurfaceFactory};
use crate::error::UiError;

/// DOM要素のハンドル
#[derive(Debug, Clone, PartialEq)]
pub struct DomSurface(pub HtmlElement);

impl DomSurface {
    /// 内部の`HtmlElement`を取得
    pub fn element(&self) -> &HtmlElement {
        &self.0
    }
}

impl Surface for DomSurface {
    fn set_text(&self, text: &str) {
        self.0.set_text_content(Some(text));
    }

    fn text(&self) -> String {
        self.0.text_content().unwrap_or_default()
    }

    fn set_hidden(&self, hidden: bool) {
        self.0.set_hidden(hidden);
    }

    fn is_hidden(&self) -> bool {
        self.0.hidden()
    }

    fn set_class(&self, class: &str, on: bool) {
        if let Err(err) = self.0.class_list().toggle_with_force(class, on) {
            log::debug!("class_list.toggle({}) failed: {:?}", class, err);
        }
    }

    fn has_class(&self, class: &str) -> bool {
        self.0.class_list().contains(class)
    }

    fn set_class_name(&self, class_name: &str) {
        self.0.set_class_name(class_name);
    }

    fn set_style(&self, property: &str, value: &str) {
        if let Err(err) = self.0.style().set_property(property, value) {
            log::debug!("style.setProperty({}) failed: {:?}", property, err);
        }
    }

    fn set_attribute(&self, name: &str, value: &str) {
        if let Err(err) = self.0.set_attribute(name, value) {
            log::debug!("setAttribute({}) failed: {:?}", name, err);
        }
    }

    fn value(&self) -> String {
        match self.0.dyn_ref::<HtmlSelectElement>() {
            Some(select) => select.value(),
            None => self.0.get_attribute("value").unwrap_or_default(),
        }
    }

    fn append_child(&self, child: &Self) -> bool {
        self.0.append_child(&child.0).is_ok()
    }

    fn detach(&self) -> bool {
        if self.0.parent_node().is_none() {
            return false;
        }
        self.0.remove();
        true
    }

    fn is_attached(&self) -> bool {
        self.0.parent_node().is_some()
    }

    fn query(&self, selector: &str) -> Option<Self> {
        self.0
            .query_selector(selector)
            .ok()
            .flatten()
            .and_then(|element| element.dyn_into::<HtmlElement>().ok())
            .map(DomSurface)
    }
}

/// ブラウザの`document`
#[derive(Debug, Clone)]
pub struct DomDocument {
    document: Document,
}

impl DomDocument {
    pub fn new(document: Document) -> Self {
        Self { document }
    }

    /// `window.document`から作成
    pub fn from_window() -> Result<Self, UiError> {
        let window = web_sys::window().ok_or(UiError::Unavailable("window"))?;
        let document = window.document().ok_or(UiError::Unavailable("document"))?;
        Ok(Self::new(document))
    }

    pub fn document(&self) -> &Document {
        &self.document
    }
}

impl SurfaceFactory for DomDocument {
    type Node = DomSurface;

    fn lookup(&self, id: &str) -> Option<DomSurface> {
        self.document
            .get_element_by_id(id)
            .and_then(|element| element.dyn_into::<HtmlElement>().ok())
            .map(DomSurface)
    }

    fn create(&self, tag: &str) -> Option<DomSurface> {
        self.document
            .create_element(tag)
            .ok()
            .and_then(|element| element.dyn_into::<HtmlElement>().ok())
            .map(DomSurface)
    }

    fn set_document_language(&self, language: &str) {
        if let Some(root) = self.document.document_element() {
            if let Err(err) = root.set_attribute("lang", language) {
                log::debug!("setAttribute(lang) failed: {:?}", err);
            }
        }
    }
}

#[cfg(all(test, target_arch = "wasm32"))]
mod tests {
    use super::*;
    use wasm_bindgen_test::*;

    wasm_bindgen_test_configure!(run_in_browser);

    #[wasm_bindgen_test]
    fn test_dom_surface_roundtrip() {
        let document = DomDocument::from_window().unwrap();
        let parent = document.create("div").unwrap();
        parent.0.set_id("dom_surface_test_parent");
        document
            .document()
            .body()
            .unwrap()
            .append_child(&parent.0)
            .unwrap();

        let found = document.lookup("dom_surface_test_parent").unwrap();
        let child = document.create("span").unwrap();
        child.set_class_name("inner");
        child.set_text("hello");
        assert!(found.append_child(&child));
        assert!(child.is_attached());

        let queried = found.query(".inner").unwrap();
        assert_eq!(queried.text(), "hello");

        queried.set_class("hidden", true);
        assert!(queried.has_class("hidden"));

        assert!(child.detach());
        assert!(!child.detach());

        parent.detach();
    }

    #[wasm_bindgen_test]
    fn test_select_value_and_document_language() {
        let document = DomDocument::from_window().unwrap();
        let select = document.create("select").unwrap();
        for language in ["en", "ja"] {
            let option = document.create("option").unwrap();
            option.set_attribute("value", language);
            option.set_text(language);
            select.append_child(&option);
        }
        select
            .0
            .unchecked_ref::<HtmlSelectElement>()
            .set_value("ja");
        assert_eq!(select.value(), "ja");

        document.set_document_language("ja");
        let root = document.document().document_element().unwrap();
        assert_eq!(root.get_attribute("lang").as_deref(), Some("ja"));
    }
}

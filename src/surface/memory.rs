//! メモリ上のサーフェスモジュール
//!
//! DOMを持たない環境（ネイティブのテスト、ヘッドレスなホスト）向けに、
//! 要素ツリーをメモリ上で再現します。

use std::cell::RefCell;
use std::collections::{BTreeSet, HashMap};
use std::rc::{Rc, Weak};

use super::{Surface, SurfaceFactory};
use crate::config::ElementIds;

#[derive(Debug, Default)]
struct MemoryNode {
    tag: String,
    id: Option<String>,
    text: String,
    hidden: bool,
    classes: BTreeSet<String>,
    styles: HashMap<String, String>,
    attributes: HashMap<String, String>,
    children: Vec<MemorySurface>,
    parent: Weak<RefCell<MemoryNode>>,
}

/// メモリ上の要素ハンドル
#[derive(Debug, Clone)]
pub struct MemorySurface(Rc<RefCell<MemoryNode>>);

impl PartialEq for MemorySurface {
    fn eq(&self, other: &Self) -> bool {
        Rc::ptr_eq(&self.0, &other.0)
    }
}

impl MemorySurface {
    /// 新しい未接続の要素を作成
    pub fn new(tag: &str) -> Self {
        MemorySurface(Rc::new(RefCell::new(MemoryNode {
            tag: tag.to_string(),
            ..Default::default()
        })))
    }

    pub fn tag(&self) -> String {
        self.0.borrow().tag.clone()
    }

    /// クラス名（空白区切り）
    pub fn class_name(&self) -> String {
        self.0
            .borrow()
            .classes
            .iter()
            .cloned()
            .collect::<Vec<_>>()
            .join(" ")
    }

    pub fn style(&self, property: &str) -> Option<String> {
        self.0.borrow().styles.get(property).cloned()
    }

    pub fn attribute(&self, name: &str) -> Option<String> {
        self.0.borrow().attributes.get(name).cloned()
    }

    pub fn children(&self) -> Vec<MemorySurface> {
        self.0.borrow().children.clone()
    }

    pub fn child_count(&self) -> usize {
        self.0.borrow().children.len()
    }

    fn matches(&self, selector: &str) -> bool {
        let node = self.0.borrow();
        if let Some(class) = selector.strip_prefix('.') {
            node.classes.contains(class)
        } else if let Some(id) = selector.strip_prefix('#') {
            node.id.as_deref() == Some(id)
        } else {
            node.tag.eq_ignore_ascii_case(selector)
        }
    }
}

impl Surface for MemorySurface {
    fn set_text(&self, text: &str) {
        let mut node = self.0.borrow_mut();
        node.text = text.to_string();
        // DOMのtextContentと同じく子要素は置き換えられる
        for child in node.children.drain(..) {
            child.0.borrow_mut().parent = Weak::new();
        }
    }

    fn text(&self) -> String {
        self.0.borrow().text.clone()
    }

    fn set_hidden(&self, hidden: bool) {
        self.0.borrow_mut().hidden = hidden;
    }

    fn is_hidden(&self) -> bool {
        self.0.borrow().hidden
    }

    fn set_class(&self, class: &str, on: bool) {
        let mut node = self.0.borrow_mut();
        if on {
            node.classes.insert(class.to_string());
        } else {
            node.classes.remove(class);
        }
    }

    fn has_class(&self, class: &str) -> bool {
        self.0.borrow().classes.contains(class)
    }

    fn set_class_name(&self, class_name: &str) {
        self.0.borrow_mut().classes = class_name.split_whitespace().map(str::to_string).collect();
    }

    fn set_style(&self, property: &str, value: &str) {
        self.0
            .borrow_mut()
            .styles
            .insert(property.to_string(), value.to_string());
    }

    fn set_attribute(&self, name: &str, value: &str) {
        let mut node = self.0.borrow_mut();
        if name == "id" {
            node.id = Some(value.to_string());
        }
        node.attributes.insert(name.to_string(), value.to_string());
    }

    fn value(&self) -> String {
        self.attribute("value").unwrap_or_default()
    }

    fn append_child(&self, child: &Self) -> bool {
        if Rc::ptr_eq(&self.0, &child.0) {
            return false;
        }
        // 別の親に付いていれば先に外す（DOMのappendChildと同じ挙動）
        child.detach();
        child.0.borrow_mut().parent = Rc::downgrade(&self.0);
        self.0.borrow_mut().children.push(child.clone());
        true
    }

    fn detach(&self) -> bool {
        let parent = self.0.borrow().parent.upgrade();
        match parent {
            Some(parent) => {
                parent
                    .borrow_mut()
                    .children
                    .retain(|sibling| !Rc::ptr_eq(&sibling.0, &self.0));
                self.0.borrow_mut().parent = Weak::new();
                true
            }
            None => false,
        }
    }

    fn is_attached(&self) -> bool {
        self.0.borrow().parent.upgrade().is_some()
    }

    fn query(&self, selector: &str) -> Option<Self> {
        for child in self.children() {
            if child.matches(selector) {
                return Some(child);
            }
            if let Some(found) = child.query(selector) {
                return Some(found);
            }
        }
        None
    }
}

/// メモリ上のドキュメント
///
/// クローンは同じ要素表を共有します。
#[derive(Debug, Clone, Default)]
pub struct MemoryDocument {
    by_id: Rc<RefCell<HashMap<String, MemorySurface>>>,
    root: Rc<RefCell<Option<MemorySurface>>>,
    language: Rc<RefCell<Option<String>>>,
}

impl MemoryDocument {
    /// 空のドキュメントを作成
    pub fn new() -> Self {
        let document = Self::default();
        *document.root.borrow_mut() = Some(MemorySurface::new("body"));
        document
    }

    /// 標準的なゲーム画面のマークアップを組み立てる
    ///
    /// `ids`の全要素を作成し、ダイアログにはテキストノードを入れ、
    /// 初期状態で隠れているべき要素を隠します。
    pub fn with_markup(ids: &ElementIds) -> Self {
        let document = Self::new();

        for (id, tag) in ids.all() {
            document.insert(id, tag);
        }

        if let Some(dialog) = document.lookup(&ids.ped_dialog) {
            dialog.set_class("hidden", true);
            let text = MemorySurface::new("span");
            text.set_class("ped-dialog__text", true);
            dialog.append_child(&text);
        }
        for id in [&ids.stage_clear, &ids.stage_fail, &ids.info_panel, &ids.design_add] {
            if let Some(surface) = document.lookup(id) {
                surface.set_hidden(true);
            }
        }

        document
    }

    /// IDを持つ要素を作ってルートに接続する
    pub fn insert(&self, id: &str, tag: &str) -> MemorySurface {
        let surface = MemorySurface::new(tag);
        surface.set_attribute("id", id);
        if let Some(root) = self.root.borrow().as_ref() {
            root.append_child(&surface);
        }
        self.by_id.borrow_mut().insert(id.to_string(), surface.clone());
        surface
    }

    /// ルート要素の`lang`属性
    pub fn document_language(&self) -> Option<String> {
        self.language.borrow().clone()
    }

    /// IDの要素を取り除く（部分的なマークアップの再現用）
    pub fn remove(&self, id: &str) -> Option<MemorySurface> {
        let surface = self.by_id.borrow_mut().remove(id)?;
        surface.detach();
        Some(surface)
    }
}

impl SurfaceFactory for MemoryDocument {
    type Node = MemorySurface;

    fn lookup(&self, id: &str) -> Option<MemorySurface> {
        self.by_id.borrow().get(id).cloned()
    }

    fn create(&self, tag: &str) -> Option<MemorySurface> {
        Some(MemorySurface::new(tag))
    }

    fn set_document_language(&self, language: &str) {
        *self.language.borrow_mut() = Some(language.to_string());
    }
}

//! 表示要素（サーフェス）の抽象化モジュール
//!
//! UIコントローラはDOM要素を直接触らず、このモジュールの`Surface`トレイトを通して
//! テキスト・表示状態・クラス・スタイルを操作します。
//!
//! - [`dom`] - `web-sys`の`HtmlElement`をラップした実装（ブラウザ用）
//! - [`memory`] - メモリ上の要素ツリー（ネイティブのテストやヘッドレス実行用）

pub mod dom;
pub mod memory;

pub use dom::{DomDocument, DomSurface};
pub use memory::{MemoryDocument, MemorySurface};

/// 操作対象となる1つの表示要素
///
/// 実装はクローンしても同じ要素を指す「ハンドル」でなければなりません。
/// 操作はすべて失敗しても黙って無視され、UIの描画を止めることはありません。
pub trait Surface: Clone + 'static {
    /// テキスト内容を置き換える
    fn set_text(&self, text: &str);

    /// 現在のテキスト内容
    fn text(&self) -> String;

    /// `hidden`属性を設定する
    fn set_hidden(&self, hidden: bool);

    fn is_hidden(&self) -> bool;

    /// クラスの付け外し
    fn set_class(&self, class: &str, on: bool);

    fn has_class(&self, class: &str) -> bool;

    /// クラス名全体を置き換える
    fn set_class_name(&self, class_name: &str);

    /// インラインスタイル（CSSカスタムプロパティを含む）を設定する
    fn set_style(&self, property: &str, value: &str);

    fn set_attribute(&self, name: &str, value: &str);

    /// 入力要素の現在の値（`<select>`なら選択中の値）。値が無ければ空文字
    fn value(&self) -> String;

    /// 子要素として追加する。成功した場合は`true`
    fn append_child(&self, child: &Self) -> bool;

    /// 親から取り外す。親がすでに無い場合は何もせず`false`
    fn detach(&self) -> bool;

    /// 親要素に接続されているか
    fn is_attached(&self) -> bool;

    /// 子孫要素をセレクタで探す
    fn query(&self, selector: &str) -> Option<Self>;

    /// クラスを反転し、反転後に付いているかを返す
    fn toggle_class(&self, class: &str) -> bool {
        let on = !self.has_class(class);
        self.set_class(class, on);
        on
    }
}

/// 要素の検索と生成を担うドキュメント
pub trait SurfaceFactory: Clone + 'static {
    type Node: Surface;

    /// IDで要素を探す
    fn lookup(&self, id: &str) -> Option<Self::Node>;

    /// 新しい要素を作る（まだどこにも接続されていない）
    fn create(&self, tag: &str) -> Option<Self::Node>;

    /// ルート要素の`lang`属性を設定する
    fn set_document_language(&self, language: &str);
}

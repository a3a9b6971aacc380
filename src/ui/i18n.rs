//! ダイアログ文言の多言語化モジュール
//!
//! ダイアログキー → 言語コード → 文言 の静的な対応表を持ちます。
//! 対応表に無いキーや言語は、キーそのものを表示します。

use std::collections::HashMap;

use lazy_static::lazy_static;

lazy_static! {
    static ref DIALOG_CATALOG: HashMap<&'static str, HashMap<&'static str, &'static str>> = {
        let mut catalog = HashMap::new();

        let mut wait = HashMap::new();
        wait.insert("en", "Wait for the light to turn green before crossing");
        wait.insert("ja", "青に変わるまでお待ちください");
        wait.insert("zh-Hant", "請等待紅燈變綠燈後再通行");
        wait.insert("zh-Hans", "请等待红灯变绿灯后再通行");
        catalog.insert("wait", wait);

        catalog
    };
}

/// ダイアログの文言を解決する
///
/// # 引数
///
/// * `key` - ダイアログキー
/// * `language` - 言語コード
///
/// # 戻り値
///
/// * 対応する文言。見つからなければ`key`
pub fn resolve_dialog(key: &str, language: &str) -> String {
    DIALOG_CATALOG
        .get(key)
        .and_then(|texts| texts.get(language))
        .map(|text| text.to_string())
        .unwrap_or_else(|| key.to_string())
}

//! 補完機能
//!
//! 補完行のデータモデル、補完ソースのインターフェース、
//! 集約・整列・選択カーソルを提供

pub mod aggregator;
pub mod sources;

// 公開API
pub use aggregator::{
    CompletionAggregator, RenderCell, RenderGroup, RenderProjection, RenderRow,
};
pub use sources::ExcmdCompletionSource;

use crate::error::CompletionError;

/// 補完行の1セル
///
/// 表示テキスト、行内での相対幅、スタイルタグを持つ
#[derive(Debug, Clone, PartialEq)]
pub struct RowCell {
    /// 表示テキスト
    pub text: String,
    /// 相対幅（デフォルト 1.0）
    pub weight: f32,
    /// 表示側が解釈するスタイルタグ
    pub style_tags: Vec<String>,
}

impl RowCell {
    /// デフォルト幅のセルを作成
    pub fn new(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            weight: 1.0,
            style_tags: Vec::new(),
        }
    }

    /// 相対幅を指定
    pub fn with_weight(mut self, weight: f32) -> Self {
        self.weight = weight;
        self
    }

    /// スタイルタグを追加
    pub fn with_tag(mut self, tag: impl Into<String>) -> Self {
        self.style_tags.push(tag.into());
        self
    }
}

/// 1件の補完候補行
///
/// 集約パスのたびに新しく生成され、パスをまたいで保持されない
#[derive(Debug, Clone, PartialEq)]
pub struct CompletionRow {
    /// 表示セル列
    pub cells: Vec<RowCell>,
    /// 選択時にバッファへ挿入される文字列
    pub completion: String,
    /// グループ化に使うソース種別ラベル
    pub source_type: String,
    /// グループ内の整列に使うスコア
    pub score: f64,
}

impl CompletionRow {
    /// 単一セルの行を作成
    pub fn simple(
        completion: impl Into<String>,
        source_type: impl Into<String>,
        score: f64,
    ) -> Self {
        let completion = completion.into();
        Self {
            cells: vec![RowCell::new(completion.clone())],
            completion,
            source_type: source_type.into(),
            score,
        }
    }
}

/// 補完ソースのインターフェース
///
/// フィルタ文字列を受け取り、スコア付きの補完行を返す。
/// 各ソースは独立しており、失敗しても他のソースへ波及しない
pub trait CompletionSource {
    /// ソース名（ログ・診断用）
    fn name(&self) -> &str;

    /// フィルタ文字列に対する補完行を生成
    fn query(&self, filter: &str) -> Result<Vec<CompletionRow>, CompletionError>;
}

/// 数学的剰余（ユークリッド除法）
///
/// 負のインデックスも正しく折り返す。選択カーソルのラップに使用
pub fn euclid_mod(index: isize, len: usize) -> usize {
    debug_assert!(len > 0);
    index.rem_euclid(len as isize) as usize
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_euclid_mod_wraps_both_directions() {
        assert_eq!(euclid_mod(0, 3), 0);
        assert_eq!(euclid_mod(3, 3), 0);
        assert_eq!(euclid_mod(4, 3), 1);
        assert_eq!(euclid_mod(-1, 3), 2);
        assert_eq!(euclid_mod(-4, 3), 2);
    }

    #[test]
    fn test_row_cell_builder() {
        let cell = RowCell::new("url").with_weight(2.0).with_tag("url");
        assert_eq!(cell.text, "url");
        assert_eq!(cell.weight, 2.0);
        assert_eq!(cell.style_tags, vec!["url".to_string()]);
    }

    #[test]
    fn test_simple_row() {
        let row = CompletionRow::simple("open", "Commands", 0.0);
        assert_eq!(row.cells.len(), 1);
        assert_eq!(row.cells[0].text, "open");
        assert_eq!(row.completion, "open");
    }
}

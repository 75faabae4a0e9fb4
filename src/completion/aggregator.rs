//! 補完集約器
//!
//! 登録された補完ソースへフィルタ文字列をファンアウトし、結果を
//! スコア昇順の安定ソートとソース種別グループ化でまとめ、描画用の
//! 射影（RenderProjection）を生成する。ソース単位の失敗は隔離され、
//! そのソースが0行を寄与したものとして扱う

use super::{euclid_mod, CompletionRow, CompletionSource};
use std::cmp::Ordering;
use unicode_width::UnicodeWidthStr;

/// 描画用の1セル
#[derive(Debug, Clone, PartialEq)]
pub struct RenderCell {
    /// 表示テキスト
    pub text: String,
    /// 行全体に対する幅の割合（百分率、合計100）
    pub width_percent: f32,
    /// スタイルタグ
    pub style_tags: Vec<String>,
}

/// 描画用の1行
#[derive(Debug, Clone, PartialEq)]
pub struct RenderRow {
    /// セル列
    pub cells: Vec<RenderCell>,
    /// 選択時に挿入される文字列
    pub completion: String,
    /// この行が現在選択されているか
    pub is_selected: bool,
}

impl RenderRow {
    /// 全セルのテキストを表示幅で合算した最小表示幅
    pub fn min_display_width(&self) -> usize {
        self.cells.iter().map(|c| c.text.width()).sum()
    }
}

/// グループ見出しとその行
#[derive(Debug, Clone, PartialEq)]
pub struct RenderGroup {
    /// ソース種別ラベル（見出し）
    pub label: String,
    /// グループ内の行（整列済み）
    pub rows: Vec<RenderRow>,
}

/// 描画側へ渡す射影
///
/// 表示は外部コラボレータの責務であり、コアはこの構造だけを公開する
#[derive(Debug, Clone, PartialEq, Default)]
pub struct RenderProjection {
    /// 出現順のグループ列
    pub groups: Vec<RenderGroup>,
    /// 平坦化した行列上の選択インデックス（行が無ければ None）
    pub selected: Option<usize>,
}

impl RenderProjection {
    /// 全グループの行数合計
    pub fn row_count(&self) -> usize {
        self.groups.iter().map(|g| g.rows.len()).sum()
    }

    /// 行が存在しないか
    pub fn is_empty(&self) -> bool {
        self.row_count() == 0
    }

    /// 選択中の行を取得
    pub fn selected_row(&self) -> Option<&RenderRow> {
        self.groups
            .iter()
            .flat_map(|g| g.rows.iter())
            .find(|row| row.is_selected)
    }

    /// 選択中の行の挿入文字列を取得
    pub fn selected_completion(&self) -> Option<&str> {
        self.selected_row().map(|row| row.completion.as_str())
    }
}

/// 補完集約器
///
/// ソースの登録順は保持されるが、最終的な行順はスコアと種別
/// グループ化のみで決まるため、呼び出し順に依存しない
#[derive(Default)]
pub struct CompletionAggregator {
    sources: Vec<Box<dyn CompletionSource>>,
}

impl CompletionAggregator {
    /// 空の集約器を作成
    pub fn new() -> Self {
        Self { sources: Vec::new() }
    }

    /// 補完ソースを登録
    pub fn register(&mut self, source: Box<dyn CompletionSource>) {
        self.sources.push(source);
    }

    /// 登録済みソース数
    pub fn source_count(&self) -> usize {
        self.sources.len()
    }

    /// フィルタ文字列で全ソースを照会し、描画用射影を生成する
    ///
    /// `selected` は平坦化した行列上の選択カーソル。範囲外の値は
    /// ユークリッド剰余で折り返され、行が1件以上あれば必ず1行だけが
    /// 選択状態になる。デバウンスと陳腐化チェックは呼び出し側の責務
    pub fn refresh(&self, filter: &str, selected: isize) -> RenderProjection {
        let mut rows: Vec<CompletionRow> = Vec::new();

        for source in &self.sources {
            match source.query(filter) {
                Ok(mut produced) => rows.append(&mut produced),
                Err(error) => {
                    // ソース単位で失敗を隔離：0行の寄与として続行
                    log::warn!("completion source '{}' failed: {}", source.name(), error);
                }
            }
        }

        // スコア昇順の安定ソート（同点は投入順を保つ）
        rows.sort_by(|a, b| a.score.partial_cmp(&b.score).unwrap_or(Ordering::Equal));

        let selected_index = if rows.is_empty() {
            None
        } else {
            Some(euclid_mod(selected, rows.len()))
        };

        // ソート後の出現順で種別ラベルごとにグループ化
        let mut groups: Vec<RenderGroup> = Vec::new();
        for (index, row) in rows.into_iter().enumerate() {
            let is_selected = selected_index == Some(index);
            let rendered = render_row(row, is_selected);
            let label = &rendered.0;

            match groups.iter_mut().find(|g| &g.label == label) {
                Some(group) => group.rows.push(rendered.1),
                None => groups.push(RenderGroup {
                    label: rendered.0,
                    rows: vec![rendered.1],
                }),
            }
        }

        RenderProjection { groups, selected: selected_index }
    }
}

/// 行のセル幅を百分率へ正規化して描画行へ変換する
fn render_row(row: CompletionRow, is_selected: bool) -> (String, RenderRow) {
    let total: f32 = row.cells.iter().map(|c| c.weight).sum();
    let total = if total > 0.0 { total } else { 1.0 };

    let cells = row
        .cells
        .into_iter()
        .map(|cell| RenderCell {
            text: cell.text,
            width_percent: cell.weight / total * 100.0,
            style_tags: cell.style_tags,
        })
        .collect();

    (
        row.source_type,
        RenderRow {
            cells,
            completion: row.completion,
            is_selected,
        },
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::completion::RowCell;
    use crate::error::CompletionError;

    /// 固定行を返すテスト用ソース
    struct FixedSource {
        name: String,
        rows: Vec<CompletionRow>,
    }

    impl FixedSource {
        fn boxed(name: &str, rows: Vec<CompletionRow>) -> Box<dyn CompletionSource> {
            Box::new(Self { name: name.to_string(), rows })
        }
    }

    impl CompletionSource for FixedSource {
        fn name(&self) -> &str {
            &self.name
        }

        fn query(&self, _filter: &str) -> Result<Vec<CompletionRow>, CompletionError> {
            Ok(self.rows.clone())
        }
    }

    /// 常に失敗するテスト用ソース
    struct FailingSource;

    impl CompletionSource for FailingSource {
        fn name(&self) -> &str {
            "failing"
        }

        fn query(&self, _filter: &str) -> Result<Vec<CompletionRow>, CompletionError> {
            Err(CompletionError::Source {
                name: "failing".to_string(),
                message: "boom".to_string(),
            })
        }
    }

    fn aggregator_with_mixed_scores() -> CompletionAggregator {
        let mut aggregator = CompletionAggregator::new();
        aggregator.register(FixedSource::boxed(
            "tabs",
            vec![
                CompletionRow::simple("tab-one", "Tabs", 1.0),
                CompletionRow::simple("tab-two", "Tabs", 0.0),
            ],
        ));
        aggregator.register(FixedSource::boxed(
            "flabs",
            vec![CompletionRow::simple("flab-one", "Flabs", 0.0)],
        ));
        aggregator
    }

    #[test]
    fn test_rows_sorted_by_score_then_grouped() {
        let aggregator = aggregator_with_mixed_scores();
        let projection = aggregator.refresh("", 0);

        // スコア0の Tabs 行と Flabs 行がスコア1の Tabs 行より前に来る。
        // グループはソート後の出現順：Tabs（tab-two が先）、Flabs
        assert_eq!(projection.groups.len(), 2);
        assert_eq!(projection.groups[0].label, "Tabs");
        assert_eq!(projection.groups[0].rows[0].completion, "tab-two");
        assert_eq!(projection.groups[0].rows[1].completion, "tab-one");
        assert_eq!(projection.groups[1].label, "Flabs");
        assert_eq!(projection.groups[1].rows[0].completion, "flab-one");
    }

    #[test]
    fn test_equal_scores_keep_same_group_adjacent() {
        let aggregator = aggregator_with_mixed_scores();
        let projection = aggregator.refresh("", 0);

        // 平坦化順: tab-two(0), flab-one(0), tab-one(1) だが、
        // グループ化により同一グループの行は見出しの下に隣接する
        assert_eq!(projection.row_count(), 3);
        let tabs = &projection.groups[0];
        assert_eq!(tabs.rows.len(), 2);
    }

    #[test]
    fn test_exactly_one_row_selected() {
        let aggregator = aggregator_with_mixed_scores();
        let projection = aggregator.refresh("", 1);

        let selected: Vec<&RenderRow> = projection
            .groups
            .iter()
            .flat_map(|g| g.rows.iter())
            .filter(|r| r.is_selected)
            .collect();
        assert_eq!(selected.len(), 1);
    }

    #[test]
    fn test_selection_wraps_forward_and_backward() {
        let aggregator = aggregator_with_mixed_scores();

        // 3行で選択インデックス2の次は0
        let projection = aggregator.refresh("", 3);
        assert_eq!(projection.selected, Some(0));

        // 選択インデックス0の前は2
        let projection = aggregator.refresh("", -1);
        assert_eq!(projection.selected, Some(2));
    }

    #[test]
    fn test_empty_result_has_no_selection() {
        let aggregator = CompletionAggregator::new();
        let projection = aggregator.refresh("", 0);

        assert!(projection.is_empty());
        assert_eq!(projection.selected, None);
        assert_eq!(projection.selected_completion(), None);
    }

    #[test]
    fn test_width_normalization() {
        let row = CompletionRow {
            cells: vec![
                RowCell::new("left"),
                RowCell::new("middle").with_weight(2.0),
                RowCell::new("right"),
            ],
            completion: "left_right_middle".to_string(),
            source_type: "Tabs".to_string(),
            score: 0.0,
        };
        let mut aggregator = CompletionAggregator::new();
        aggregator.register(FixedSource::boxed("tabs", vec![row]));

        let projection = aggregator.refresh("", 0);
        let cells = &projection.groups[0].rows[0].cells;
        assert_eq!(cells[0].width_percent, 25.0);
        assert_eq!(cells[1].width_percent, 50.0);
        assert_eq!(cells[2].width_percent, 25.0);
    }

    #[test]
    fn test_failing_source_is_isolated() {
        let mut aggregator = CompletionAggregator::new();
        aggregator.register(Box::new(FailingSource));
        aggregator.register(FixedSource::boxed(
            "tabs",
            vec![CompletionRow::simple("tab-one", "Tabs", 0.0)],
        ));

        let projection = aggregator.refresh("", 0);
        assert_eq!(projection.row_count(), 1);
        assert_eq!(projection.selected_completion(), Some("tab-one"));
    }

    #[test]
    fn test_source_order_does_not_affect_result() {
        let forward = aggregator_with_mixed_scores();

        let mut reversed = CompletionAggregator::new();
        reversed.register(FixedSource::boxed(
            "flabs",
            vec![CompletionRow::simple("flab-one", "Flabs", 0.0)],
        ));
        reversed.register(FixedSource::boxed(
            "tabs",
            vec![
                CompletionRow::simple("tab-one", "Tabs", 1.0),
                CompletionRow::simple("tab-two", "Tabs", 0.0),
            ],
        ));

        // 注意：安定ソートのため同点行の相対順は投入順に従う。
        // ソース順が変わると同点行の順も入れ替わるが、グループの
        // 構成要素とスコア順の不変条件は保たれる
        let a = forward.refresh("", 0);
        let b = reversed.refresh("", 0);
        assert_eq!(a.row_count(), b.row_count());
        assert_eq!(
            a.groups.iter().map(|g| g.rows.len()).sum::<usize>(),
            b.groups.iter().map(|g| g.rows.len()).sum::<usize>()
        );
    }

    #[test]
    fn test_min_display_width() {
        let row = RenderRow {
            cells: vec![
                RenderCell { text: "ab".to_string(), width_percent: 50.0, style_tags: vec![] },
                RenderCell { text: "cd".to_string(), width_percent: 50.0, style_tags: vec![] },
            ],
            completion: "abcd".to_string(),
            is_selected: false,
        };
        assert_eq!(row.min_display_width(), 4);
    }
}

//! キーシーケンスマッチャー
//!
//! バッファされたキーイベント列をキーバインドテーブルと照合し、
//! 解決（コマンド文字列）・部分一致・不一致のいずれかに分類する。
//! マッチャーは分類のみを行い、編集バッファには一切触れない

use super::key::{Key, KeyEvent};
use super::keymap::KeymapTable;

/// 照合結果
#[derive(Debug, Clone, PartialEq)]
pub enum MatchResult {
    /// バインドが解決された。呼び出し側はペンディング列をクリアすること
    Resolved { command: String },
    /// いずれかのバインドの前方一致。続きのキー入力を待つ
    Partial { pending: Vec<KeyEvent> },
    /// どのバインドの接頭辞にも一致しない。
    /// 新しいマッチの先頭になり得る末尾だけを保持して返す
    Rejected { retained: Vec<KeyEvent> },
}

/// キーシーケンスマッチャー
///
/// ペンディング列の所有者は呼び出し側（InputSession）であり、
/// マッチャー自身は参照するテーブルとモード名のみを保持する
#[derive(Debug, Clone)]
pub struct KeySequenceMatcher {
    table: KeymapTable,
    mode: String,
}

impl KeySequenceMatcher {
    /// テーブルとモード名からマッチャーを作成
    pub fn new(table: KeymapTable, mode: impl Into<String>) -> Self {
        Self { table, mode: mode.into() }
    }

    /// バインドテーブルへの参照を取得
    pub fn table(&self) -> &KeymapTable {
        &self.table
    }

    /// バインドテーブルへの可変参照を取得（再バインド用）
    pub fn table_mut(&mut self) -> &mut KeymapTable {
        &mut self.table
    }

    /// バッファされたイベント列を照合する
    ///
    /// 信頼されていないイベントは照合対象から除外される（バッファ列の
    /// 変更も行わない）。完全一致があれば解決し、複数のバインドが等しく
    /// 一致する場合は最長（最も具体的）のものが勝つ
    pub fn feed(&self, pending: &[KeyEvent]) -> MatchResult {
        let keys: Vec<Key> = pending
            .iter()
            .filter(|ev| ev.trusted)
            .map(|ev| ev.key.clone())
            .collect();

        if keys.is_empty() {
            return MatchResult::Partial { pending: Vec::new() };
        }

        let bindings = self.table.mode_bindings(&self.mode);

        // 完全一致の検索（同長の競合があれば最長優先、ここでは同値）
        let mut resolved: Option<&str> = None;
        let mut resolved_len = 0usize;
        for binding in bindings {
            if binding.sequence.keys == keys && binding.sequence.len() >= resolved_len {
                resolved = Some(&binding.command);
                resolved_len = binding.sequence.len();
            }
        }
        if let Some(command) = resolved {
            return MatchResult::Resolved { command: command.to_string() };
        }

        // 前方一致（バッファ列がいずれかのバインドの真の接頭辞）
        let is_prefix_of_binding = bindings
            .iter()
            .any(|b| b.sequence.len() > keys.len() && b.sequence.starts_with(&keys));
        if is_prefix_of_binding {
            return MatchResult::Partial { pending: pending.to_vec() };
        }

        // 不一致：新しいマッチの先頭になり得る最長の末尾を保持する
        let trusted: Vec<&KeyEvent> = pending.iter().filter(|ev| ev.trusted).collect();
        for start in 1..trusted.len() {
            let tail: Vec<Key> = trusted[start..].iter().map(|ev| ev.key.clone()).collect();
            let viable = bindings
                .iter()
                .any(|b| b.sequence.starts_with(&tail) || b.sequence.keys == tail);
            if viable {
                return MatchResult::Rejected {
                    retained: trusted[start..].iter().map(|ev| (*ev).clone()).collect(),
                };
            }
        }

        MatchResult::Rejected { retained: Vec::new() }
    }
}

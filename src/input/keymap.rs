//! キーバインドテーブル
//!
//! モード別のキーシーケンス → コマンド文字列のマッピングを管理
//! 本コアはコマンドライン用モード（`cmdline`）のテーブルを参照する

use super::key::KeySequence;
use crate::error::KeyParseError;
use std::collections::HashMap;

/// コマンドラインモードの名前
pub const CMDLINE_MODE: &str = "cmdline";

/// 1件のキーバインド
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Binding {
    /// バインドされたキーシーケンス
    pub sequence: KeySequence,
    /// 解決されるコマンド文字列（引数込み、例: `"history -1"`）
    pub command: String,
}

/// モード別キーバインドテーブル
///
/// 読み取り専用で参照される設定。設定規律としてシーケンスの重複は
/// 想定しないが、同一シーケンスを再バインドした場合は後勝ちとする
#[derive(Debug, Clone, Default)]
pub struct KeymapTable {
    modes: HashMap<String, Vec<Binding>>,
}

impl KeymapTable {
    /// 空のテーブルを作成
    pub fn new() -> Self {
        Self { modes: HashMap::new() }
    }

    /// コマンドラインモードのデフォルトバインドを登録したテーブルを作成
    pub fn with_default_cmdline_bindings() -> Self {
        let mut table = Self::new();
        let defaults = [
            ("Up", "history -1"),
            ("C-p", "history -1"),
            ("Down", "history 1"),
            ("C-n", "history 1"),
            ("Tab", "next_completion"),
            ("S-Tab", "prev_completion"),
            ("C-f", "insert_completion"),
            ("Enter", "accept_line"),
            ("Esc", "hide_and_clear"),
            ("C-g", "hide_and_clear"),
            ("C-u", "clear"),
        ];

        for (spec, command) in defaults {
            // 固定表記のパースは失敗しない
            if let Ok(sequence) = KeySequence::parse(spec) {
                table.bind(CMDLINE_MODE, sequence, command);
            }
        }

        table
    }

    /// バインドを追加（同一シーケンスは置き換え）
    pub fn bind(&mut self, mode: &str, sequence: KeySequence, command: impl Into<String>) {
        let bindings = self.modes.entry(mode.to_string()).or_default();
        let command = command.into();

        if let Some(existing) = bindings.iter_mut().find(|b| b.sequence == sequence) {
            existing.command = command;
        } else {
            bindings.push(Binding { sequence, command });
        }
    }

    /// 文字列表記でバインドを追加
    pub fn bind_spec(&mut self, mode: &str, spec: &str, command: impl Into<String>) -> Result<(), KeyParseError> {
        let sequence = KeySequence::parse(spec)?;
        self.bind(mode, sequence, command);
        Ok(())
    }

    /// バインドを削除
    pub fn unbind(&mut self, mode: &str, sequence: &KeySequence) {
        if let Some(bindings) = self.modes.get_mut(mode) {
            bindings.retain(|b| &b.sequence != sequence);
        }
    }

    /// 指定モードのバインド一覧を取得
    pub fn mode_bindings(&self, mode: &str) -> &[Binding] {
        self.modes.get(mode).map(|b| b.as_slice()).unwrap_or(&[])
    }

    /// バインド件数
    pub fn len(&self, mode: &str) -> usize {
        self.mode_bindings(mode).len()
    }

    /// 指定モードが空かどうか
    pub fn is_empty(&self, mode: &str) -> bool {
        self.mode_bindings(mode).is_empty()
    }
}

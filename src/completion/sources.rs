//! 組み込み補完ソース
//!
//! コマンド名補完ソースの実装。具体的な補完ソースのカタログ
//! （ブックマーク、タブ等）はホスト側の責務であり、ここでは
//! 契約の参照実装として最小のソースのみを提供する

use super::{CompletionRow, CompletionSource, RowCell};
use crate::error::CompletionError;

/// ソース種別ラベル
const EXCMD_TYPE: &str = "Commands";

/// コマンド名補完ソース
///
/// 登録済みコマンド名の前方一致補完を提供する
#[derive(Debug)]
pub struct ExcmdCompletionSource {
    commands: Vec<String>,
}

impl ExcmdCompletionSource {
    /// 組み込みコマンドを登録したソースを作成
    pub fn new() -> Self {
        let mut commands = vec![
            "accept_line".to_string(),
            "clear".to_string(),
            "fill_cmdline".to_string(),
            "hide_and_clear".to_string(),
            "history".to_string(),
            "insert_completion".to_string(),
            "next_completion".to_string(),
            "prev_completion".to_string(),
        ];
        commands.sort();

        Self { commands }
    }

    /// 空のソースを作成
    pub fn empty() -> Self {
        Self { commands: Vec::new() }
    }

    /// コマンドを追加
    pub fn add_command(&mut self, command: impl Into<String>) {
        let command = command.into();
        if !self.commands.contains(&command) {
            self.commands.push(command);
            self.commands.sort();
        }
    }

    /// すべてのコマンドを取得
    pub fn all_commands(&self) -> &[String] {
        &self.commands
    }
}

impl Default for ExcmdCompletionSource {
    fn default() -> Self {
        Self::new()
    }
}

impl CompletionSource for ExcmdCompletionSource {
    fn name(&self) -> &str {
        "excmds"
    }

    fn query(&self, filter: &str) -> Result<Vec<CompletionRow>, CompletionError> {
        let filter = filter.trim_start();

        let rows = self
            .commands
            .iter()
            .filter(|cmd| cmd.starts_with(filter))
            .map(|cmd| CompletionRow {
                cells: vec![RowCell::new(cmd.clone()).with_tag("excmd")],
                completion: cmd.clone(),
                source_type: EXCMD_TYPE.to_string(),
                // 短い名前ほど上位に表示する
                score: cmd.len() as f64,
            })
            .collect();

        Ok(rows)
    }
}

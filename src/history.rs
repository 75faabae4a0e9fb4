//! コマンド履歴
//!
//! 履歴ストアの読み取りインターフェースと、検索プレフィックス付きの
//! 有界ステップナビゲーションを提供する。永続化と書き戻しはコアの
//! 責務外（ホスト側の履歴ストアが行う）

use crate::error::HistoryError;
use crate::session::SessionState;
use std::collections::{HashSet, VecDeque};

/// セッション内履歴の最大保存数
const MAX_HISTORY_SIZE: usize = 100;

/// 履歴ストアの読み取りインターフェース
///
/// スナップショットは古い順（oldest → newest）で返すこと
pub trait HistoryStore {
    fn snapshot(&self) -> Result<Vec<String>, HistoryError>;
}

/// セッション内のインメモリ履歴ストア
///
/// 生の投入列をそのまま保持する（重複除去はナビゲーション側の責務）
#[derive(Debug, Clone, Default)]
pub struct SessionHistory {
    /// 履歴エントリ（古いものが先頭）
    entries: VecDeque<String>,
    /// 最大保存数
    max_size: usize,
}

impl SessionHistory {
    /// 新しい履歴ストアを作成
    pub fn new() -> Self {
        Self::with_capacity(MAX_HISTORY_SIZE)
    }

    /// 指定した容量で履歴ストアを作成
    pub fn with_capacity(max_size: usize) -> Self {
        Self {
            entries: VecDeque::with_capacity(max_size),
            max_size,
        }
    }

    /// エントリを末尾に追加
    pub fn push(&mut self, entry: String) {
        // 空文字列は追加しない
        if entry.is_empty() {
            return;
        }

        self.entries.push_back(entry);

        // サイズ制限：古いものから破棄
        while self.entries.len() > self.max_size {
            self.entries.pop_front();
        }
    }

    /// 履歴のサイズを取得
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// 履歴が空かどうかを判定
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// 履歴をクリア
    pub fn clear(&mut self) {
        self.entries.clear();
    }

    /// 履歴の反復子を取得（古いものから新しいものへ）
    pub fn iter(&self) -> impl Iterator<Item = &String> {
        self.entries.iter()
    }
}

impl HistoryStore for SessionHistory {
    fn snapshot(&self) -> Result<Vec<String>, HistoryError> {
        Ok(self.entries.iter().cloned().collect())
    }
}

/// スナップショットの重複除去
///
/// 逆順にしてから最初の出現（＝元の順での最後の出現）を残し、
/// 再度逆順にして時系列順へ戻す。結果：各値は一意で時系列順、
/// 重複時は最新の出現が勝つ
pub fn dedup_most_recent(snapshot: Vec<String>) -> Vec<String> {
    let mut seen = HashSet::new();
    let mut result: Vec<String> = Vec::with_capacity(snapshot.len());

    for entry in snapshot.into_iter().rev() {
        if seen.insert(entry.clone()) {
            result.push(entry);
        }
    }

    result.reverse();
    result
}

/// 履歴ナビゲータ
///
/// 検索プレフィックスで絞り込んだ履歴の上を有界ステップで移動する。
/// 履歴に入る直前のバッファ内容は「作業中ドラフト」として保存され、
/// 履歴の範囲を出たときに復元される
pub struct HistoryNavigator {
    store: Box<dyn HistoryStore>,
    /// 絞り込みに使う検索プレフィックス
    search_prefix: String,
    /// 履歴ナビゲーション開始前のバッファ内容
    working_draft: String,
}

impl HistoryNavigator {
    /// ストアからナビゲータを作成
    pub fn new(store: Box<dyn HistoryStore>) -> Self {
        Self {
            store,
            search_prefix: String::new(),
            working_draft: String::new(),
        }
    }

    /// 履歴を n ステップ移動する
    ///
    /// `reuse_prefix` が false の場合は現在のバッファ内容を新しい検索
    /// プレフィックスとして取り込む。連続した履歴ステップでは true を
    /// 渡すことで、バッファに代入済みの履歴テキストではなく元の入力で
    /// 絞り込みを続けられる
    pub fn step(
        &mut self,
        n: isize,
        state: &mut SessionState,
        reuse_prefix: bool,
    ) -> Result<(), HistoryError> {
        if !reuse_prefix {
            self.search_prefix = state.buffer.clone();
        }

        let snapshot = self.store.snapshot()?;
        let matches: Vec<String> = dedup_most_recent(snapshot)
            .into_iter()
            .filter(|entry| entry.starts_with(&self.search_prefix))
            .collect();

        if state.history_offset == 0 {
            self.working_draft = state.buffer.clone();
        }

        let len = matches.len() as isize;
        let target = len + n - state.history_offset;
        let clamped = target.clamp(0, len);

        state.buffer = match matches.get(clamped as usize) {
            Some(entry) => entry.clone(),
            None => self.working_draft.clone(),
        };

        // クランプが起きなかった場合のみオフセットを進める
        // （履歴範囲を超えたオフセットのドリフトを防ぐ）
        if clamped == target {
            state.history_offset -= n;
        }

        Ok(())
    }

    /// ナビゲーション状態をリセットする（バッファクリア時に呼ぶ）
    pub fn reset(&mut self) {
        self.search_prefix.clear();
        self.working_draft.clear();
    }

    /// 現在の検索プレフィックスを取得
    pub fn search_prefix(&self) -> &str {
        &self.search_prefix
    }
}

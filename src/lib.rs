//! exline - キーボード駆動コマンドラインの入力処理コア
//!
//! キーシーケンス解決、コマンドキュー、履歴ナビゲーション、
//! 補完集約、セッションオーケストレーションの実装

// コアモジュール
pub mod error;

// 入力層
pub mod input;
pub mod queue;

// ロジック層
pub mod completion;
pub mod history;

// オーケストレーション
pub mod session;

// 公開API
pub use completion::{CompletionAggregator, CompletionRow, CompletionSource, RenderProjection};
pub use error::{ExlineError, Result};
pub use history::{HistoryNavigator, HistoryStore, SessionHistory};
pub use input::{Key, KeyCode, KeyEvent, KeySequence, KeySequenceMatcher, KeymapTable, MatchResult};
pub use queue::{CommandInvocation, CommandQueue, TaskHandle, TaskStatus};
pub use session::{
    CommandExecutor, InputSession, KeyOutcome, RenderSink, SessionConfig, SessionState,
};

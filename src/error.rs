//! エラーハンドリングシステム
//!
//! exline コア全体で使用される統一されたエラー型を定義
//! 方針：キー処理経路には決してエラーを投げず、分類結果として返す

use thiserror::Error;

/// コア全体のエラー型
#[derive(Error, Debug, Clone)]
pub enum ExlineError {
    /// 入力処理エラー
    #[error("Input processing failed")]
    Input(#[from] InputError),

    /// 補完処理エラー
    #[error("Completion failed")]
    Completion(#[from] CompletionError),

    /// 履歴アクセスエラー
    #[error("History access failed")]
    History(#[from] HistoryError),

    /// アプリケーション論理エラー
    #[error("Application error: {0}")]
    Application(String),
}

/// 入力処理固有のエラー
#[derive(Error, Debug, Clone)]
pub enum InputError {
    #[error("Invalid key sequence: {sequence}")]
    InvalidKeySequence { sequence: String },

    #[error("Command not found: {command}")]
    CommandNotFound { command: String },

    #[error("Invalid argument: {arg}")]
    InvalidArgument { arg: String },
}

/// キーシーケンス表記のパースエラー
#[derive(Error, Debug, Clone)]
pub enum KeyParseError {
    #[error("Invalid key sequence format: {0}")]
    InvalidFormat(String),

    #[error("Unknown key: {0}")]
    UnknownKey(String),

    #[error("Empty key sequence")]
    EmptySequence,
}

/// 補完ソース固有のエラー
#[derive(Error, Debug, Clone)]
pub enum CompletionError {
    #[error("Completion source '{name}' failed: {message}")]
    Source { name: String, message: String },
}

/// 履歴ストア固有のエラー
#[derive(Error, Debug, Clone)]
pub enum HistoryError {
    #[error("History store unavailable: {message}")]
    Store { message: String },
}

// KeyParseError は入力エラーとして扱う
impl From<KeyParseError> for ExlineError {
    fn from(error: KeyParseError) -> Self {
        ExlineError::Input(InputError::InvalidKeySequence {
            sequence: error.to_string(),
        })
    }
}

/// プロジェクト標準のResult型
pub type Result<T> = std::result::Result<T, ExlineError>;

//! 入力処理モジュール
//!
//! キー表現、キーバインドテーブル、シーケンス照合を提供

pub mod key;
pub mod keymap;
pub mod matcher;

// 公開API
pub use key::{Key, KeyCode, KeyEvent, KeyModifiers, KeySequence};
pub use keymap::{Binding, KeymapTable, CMDLINE_MODE};
pub use matcher::{KeySequenceMatcher, MatchResult};

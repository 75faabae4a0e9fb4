//! キー表現
//!
//! キー入力の内部表現とキーシーケンス表記のパース

use crate::error::KeyParseError;
use crossterm::event::{KeyCode as CrosstermKeyCode, KeyEvent as CrosstermKeyEvent, KeyModifiers as CrosstermModifiers};

/// キー入力の内部表現
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Key {
    /// 修飾キー
    pub modifiers: KeyModifiers,
    /// 基本キー
    pub code: KeyCode,
}

/// 修飾キーの組み合わせ
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct KeyModifiers {
    pub ctrl: bool,
    pub alt: bool,
    pub shift: bool,
}

/// 基本キーコード
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum KeyCode {
    Char(char),
    Enter,
    Backspace,
    Delete,
    Tab,
    Up,
    Down,
    Left,
    Right,
    F(u8),
    Esc,
    Unknown,
}

impl Key {
    /// 修飾キーなしのキーを作成
    pub fn plain(code: KeyCode) -> Self {
        Self { modifiers: KeyModifiers::default(), code }
    }

    /// Ctrl+文字のキーを作成
    pub fn ctrl(c: char) -> Self {
        Self {
            modifiers: KeyModifiers { ctrl: true, alt: false, shift: false },
            code: KeyCode::Char(c),
        }
    }

    /// Alt+文字のキーを作成
    pub fn alt(c: char) -> Self {
        Self {
            modifiers: KeyModifiers { ctrl: false, alt: true, shift: false },
            code: KeyCode::Char(c),
        }
    }

    /// 挿入可能な文字かどうかを判定
    pub fn is_insertable_char(&self) -> bool {
        matches!(self.code, KeyCode::Char(_)) && !self.modifiers.ctrl && !self.modifiers.alt
    }

    /// 文字に変換
    pub fn to_char(&self) -> Option<char> {
        match self.code {
            KeyCode::Char(c) => Some(c),
            _ => None,
        }
    }
}

/// 1回の物理キー押下イベント
///
/// `trusted` が false のイベントは合成イベントであり、
/// バインディングのなりすましを防ぐため一切処理されない
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct KeyEvent {
    /// 押下されたキー
    pub key: Key,
    /// 実際のユーザー入力由来かどうか
    pub trusted: bool,
}

impl KeyEvent {
    /// ユーザー入力由来のイベントを作成
    pub fn trusted(key: Key) -> Self {
        Self { key, trusted: true }
    }

    /// 合成イベントを作成（テスト・ホスト側シミュレーション用）
    pub fn synthetic(key: Key) -> Self {
        Self { key, trusted: false }
    }
}

/// キーシーケンス（連続キー対応）
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct KeySequence {
    pub keys: Vec<Key>,
}

impl KeySequence {
    /// 単一キーからシーケンスを作成
    pub fn single(key: Key) -> Self {
        Self { keys: vec![key] }
    }

    /// 複数キーからシーケンスを作成
    pub fn multi(keys: Vec<Key>) -> Self {
        Self { keys }
    }

    /// シーケンスの長さ
    pub fn len(&self) -> usize {
        self.keys.len()
    }

    /// シーケンスが空か
    pub fn is_empty(&self) -> bool {
        self.keys.is_empty()
    }

    /// 前方一致チェック
    pub fn starts_with(&self, prefix: &[Key]) -> bool {
        if prefix.len() > self.keys.len() {
            return false;
        }
        &self.keys[..prefix.len()] == prefix
    }

    /// 文字列表現からパース
    ///
    /// 例: `"C-x C-f"`, `"M-p"`, `"Tab"`, `"S-Tab"`
    pub fn parse(s: &str) -> Result<Self, KeyParseError> {
        if s.trim().is_empty() {
            return Err(KeyParseError::EmptySequence);
        }

        let parts: Vec<&str> = s.split_whitespace().collect();
        let mut keys = Vec::new();

        for part in parts {
            keys.push(Self::parse_single_key(part)?);
        }

        Ok(Self { keys })
    }

    fn parse_single_key(s: &str) -> Result<Key, KeyParseError> {
        let mut modifiers = KeyModifiers::default();
        let mut remaining = s;

        // 修飾キーの解析
        loop {
            if let Some(rest) = remaining.strip_prefix("C-") {
                modifiers.ctrl = true;
                remaining = rest;
            } else if let Some(rest) = remaining.strip_prefix("M-") {
                modifiers.alt = true;
                remaining = rest;
            } else if let Some(rest) = remaining.strip_prefix("S-") {
                modifiers.shift = true;
                remaining = rest;
            } else {
                break;
            }
        }

        let code = match remaining {
            "Enter" => KeyCode::Enter,
            "Backspace" => KeyCode::Backspace,
            "Delete" => KeyCode::Delete,
            "Tab" => KeyCode::Tab,
            "Up" => KeyCode::Up,
            "Down" => KeyCode::Down,
            "Left" => KeyCode::Left,
            "Right" => KeyCode::Right,
            "Esc" => KeyCode::Esc,
            s if s.chars().count() == 1 => {
                KeyCode::Char(s.chars().next().ok_or_else(|| KeyParseError::InvalidFormat(s.to_string()))?)
            }
            "" => return Err(KeyParseError::InvalidFormat(s.to_string())),
            _ => return Err(KeyParseError::UnknownKey(remaining.to_string())),
        };

        Ok(Key { modifiers, code })
    }
}

/// crossterm統合
impl From<CrosstermKeyEvent> for Key {
    fn from(event: CrosstermKeyEvent) -> Self {
        let modifiers = KeyModifiers {
            ctrl: event.modifiers.contains(CrosstermModifiers::CONTROL),
            alt: event.modifiers.contains(CrosstermModifiers::ALT),
            shift: event.modifiers.contains(CrosstermModifiers::SHIFT),
        };

        let code = match event.code {
            CrosstermKeyCode::Char(c) => KeyCode::Char(c),
            CrosstermKeyCode::Enter => KeyCode::Enter,
            CrosstermKeyCode::Backspace => KeyCode::Backspace,
            CrosstermKeyCode::Delete => KeyCode::Delete,
            CrosstermKeyCode::Tab => KeyCode::Tab,
            CrosstermKeyCode::Up => KeyCode::Up,
            CrosstermKeyCode::Down => KeyCode::Down,
            CrosstermKeyCode::Left => KeyCode::Left,
            CrosstermKeyCode::Right => KeyCode::Right,
            CrosstermKeyCode::F(n) => KeyCode::F(n),
            CrosstermKeyCode::Esc => KeyCode::Esc,
            _ => KeyCode::Unknown,
        };

        Key { modifiers, code }
    }
}

/// 端末からのキーイベントは信頼済みとして扱う
impl From<CrosstermKeyEvent> for KeyEvent {
    fn from(event: CrosstermKeyEvent) -> Self {
        KeyEvent::trusted(event.into())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_single_key() {
        let seq = KeySequence::parse("C-p").unwrap();
        assert_eq!(seq.len(), 1);
        assert_eq!(seq.keys[0], Key::ctrl('p'));
    }

    #[test]
    fn test_parse_multi_key_sequence() {
        let seq = KeySequence::parse("C-x C-f").unwrap();
        assert_eq!(seq.len(), 2);
        assert_eq!(seq.keys[0], Key::ctrl('x'));
        assert_eq!(seq.keys[1], Key::ctrl('f'));
    }

    #[test]
    fn test_parse_named_keys() {
        let seq = KeySequence::parse("S-Tab").unwrap();
        assert_eq!(
            seq.keys[0],
            Key {
                modifiers: KeyModifiers { ctrl: false, alt: false, shift: true },
                code: KeyCode::Tab,
            }
        );

        let seq = KeySequence::parse("Up").unwrap();
        assert_eq!(seq.keys[0], Key::plain(KeyCode::Up));
    }

    #[test]
    fn test_parse_errors() {
        assert!(matches!(
            KeySequence::parse(""),
            Err(KeyParseError::EmptySequence)
        ));
        assert!(matches!(
            KeySequence::parse("Hyper-x"),
            Err(KeyParseError::UnknownKey(_))
        ));
    }

    #[test]
    fn test_starts_with() {
        let seq = KeySequence::parse("C-x C-f").unwrap();
        assert!(seq.starts_with(&[Key::ctrl('x')]));
        assert!(!seq.starts_with(&[Key::ctrl('f')]));
        assert!(seq.starts_with(&seq.keys.clone()));
    }

    #[test]
    fn test_crossterm_conversion() {
        let event = CrosstermKeyEvent::new(CrosstermKeyCode::Char('p'), CrosstermModifiers::CONTROL);
        let key: Key = event.into();
        assert_eq!(key, Key::ctrl('p'));

        let event = CrosstermKeyEvent::new(CrosstermKeyCode::Up, CrosstermModifiers::NONE);
        let key_event: KeyEvent = event.into();
        assert!(key_event.trusted);
        assert_eq!(key_event.key, Key::plain(KeyCode::Up));
    }

    #[test]
    fn test_insertable_char() {
        assert!(Key::plain(KeyCode::Char('a')).is_insertable_char());
        assert!(!Key::ctrl('a').is_insertable_char());
        assert!(!Key::plain(KeyCode::Enter).is_insertable_char());
        assert_eq!(Key::plain(KeyCode::Char('a')).to_char(), Some('a'));
        assert_eq!(Key::plain(KeyCode::Enter).to_char(), None);
    }
}

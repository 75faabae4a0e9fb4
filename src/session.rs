//! 入力セッション（オーケストレータ）
//!
//! ライブバッファ状態を所有し、キーイベントをマッチャーへ、解決済み
//! コマンドをキューへ、バッファ変更を（デバウンス付きで）補完集約器へ
//! 配線する。履歴ナビゲーションとバッファ編集操作も公開する

use crate::completion::{CompletionAggregator, CompletionSource, RenderProjection};
use crate::error::InputError;
use crate::history::{HistoryNavigator, HistoryStore};
use crate::input::{Key, KeyEvent, KeySequenceMatcher, KeymapTable, MatchResult, CMDLINE_MODE};
use crate::queue::{CommandInvocation, CommandQueue, TaskHandle, TaskKind};
use std::time::{Duration, Instant};

/// コマンド実行コラボレータ
///
/// 解決済みコマンド名と省略可能な単一引数を受け取り効果を実行する。
/// 効果の内容（ローカル編集か別プロセスへの送出か）はコアにとって不透明
pub trait CommandExecutor {
    fn execute(&mut self, name: &str, arg: Option<&str>) -> anyhow::Result<()>;
}

/// 描画コラボレータ
///
/// 描画専用であり、コアへ値を返さない
pub trait RenderSink {
    fn render(&mut self, projection: &RenderProjection);
}

/// セッションの可変状態
///
/// InputSession が排他的に所有する。他コンポーネントは1回の呼び出しの
/// 間だけ参照を受け取り、呼び出しをまたいで保持してはならない
#[derive(Debug, Clone, PartialEq, Default)]
pub struct SessionState {
    /// バッファテキスト
    pub buffer: String,
    /// マージ済み補完リスト上の選択カーソル（剰余で折り返す生の値）
    pub completion_index: isize,
    /// 履歴カーソルオフセット（0 = 履歴外）
    pub history_offset: isize,
    /// コマンドラインが表示中か
    pub visible: bool,
    /// コマンドラインがフォーカスを持つか
    pub focused: bool,
}

/// セッション設定
#[derive(Debug, Clone)]
pub struct SessionConfig {
    /// 補完再計算のデバウンス時間
    pub debounce: Duration,
    /// 参照するキーバインドモード
    pub mode: String,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            debounce: Duration::from_millis(100),
            mode: CMDLINE_MODE.to_string(),
        }
    }
}

/// キーイベント処理の結果
#[derive(Debug)]
pub enum KeyOutcome {
    /// 合成イベント等、処理対象外
    Ignored,
    /// 部分一致：続きのキー入力を待つ
    Pending,
    /// コマンドが解決されキューに投入された
    Consumed { handle: TaskHandle },
    /// 未バインドキー：ホスト側で文字として自己挿入する
    SelfInsert { key: Key },
}

/// 入力セッション
pub struct InputSession {
    config: SessionConfig,
    state: SessionState,
    /// ペンディング中のキーシーケンス（セッションが唯一の所有者）
    pending: Vec<KeyEvent>,
    matcher: KeySequenceMatcher,
    queue: CommandQueue,
    navigator: HistoryNavigator,
    aggregator: CompletionAggregator,
    executor: Box<dyn CommandExecutor>,
    renderer: Box<dyn RenderSink>,
    /// 直近に反映された描画射影（insert_completion が参照する）
    last_projection: RenderProjection,
    /// 未反映のバッファ変更が発生した時刻
    dirty_since: Option<Instant>,
}

impl InputSession {
    /// セッションを構築する
    pub fn new(
        config: SessionConfig,
        table: KeymapTable,
        history: Box<dyn HistoryStore>,
        executor: Box<dyn CommandExecutor>,
        renderer: Box<dyn RenderSink>,
    ) -> Self {
        let mode = config.mode.clone();
        Self {
            config,
            state: SessionState::default(),
            pending: Vec::new(),
            matcher: KeySequenceMatcher::new(table, mode),
            queue: CommandQueue::new(),
            navigator: HistoryNavigator::new(history),
            aggregator: CompletionAggregator::new(),
            executor,
            renderer,
            last_projection: RenderProjection::default(),
            dirty_since: None,
        }
    }

    /// 補完ソースを登録する
    pub fn register_source(&mut self, source: Box<dyn CompletionSource>) {
        self.aggregator.register(source);
    }

    /// 現在の状態への参照を取得
    pub fn state(&self) -> &SessionState {
        &self.state
    }

    /// バッファテキストを取得
    pub fn buffer_text(&self) -> &str {
        &self.state.buffer
    }

    /// 直近に反映された描画射影を取得
    pub fn last_projection(&self) -> &RenderProjection {
        &self.last_projection
    }

    /// キーイベントを1件処理する
    ///
    /// 解決：ペンディング列をクリアしコマンドをキューへ投入。
    /// 部分一致：マッチャーが返した列を保持して継続。
    /// 不一致：再マッチの先頭になり得る末尾を残し、自己挿入を通知
    pub fn on_key(&mut self, event: KeyEvent) -> KeyOutcome {
        // 合成イベントはペンディング列に触れず黙って無視する
        if !event.trusted {
            return KeyOutcome::Ignored;
        }

        let key = event.key.clone();
        self.pending.push(event);

        match self.matcher.feed(&self.pending) {
            MatchResult::Resolved { command } => {
                self.pending.clear();
                match self.enqueue_command(&command) {
                    Some(handle) => {
                        self.pump();
                        KeyOutcome::Consumed { handle }
                    }
                    None => KeyOutcome::Ignored,
                }
            }
            MatchResult::Partial { pending } => {
                self.pending = pending;
                KeyOutcome::Pending
            }
            MatchResult::Rejected { retained } => {
                self.pending = retained;
                // 自己挿入はキューを通らないため履歴フラグを明示的に落とす
                self.queue.reset_history_flag();
                KeyOutcome::SelfInsert { key }
            }
        }
    }

    /// コマンド文字列を直接実行する（ホスト・テスト用の入口）
    pub fn run_command(&mut self, command: &str) -> Option<TaskHandle> {
        let handle = self.enqueue_command(command)?;
        self.pump();
        Some(handle)
    }

    /// コマンド文字列をパースしてキューに投入する
    fn enqueue_command(&mut self, command: &str) -> Option<TaskHandle> {
        let invocation = match CommandInvocation::parse(command) {
            Some(invocation) => invocation,
            None => {
                log::warn!("empty command string resolved from key binding");
                return None;
            }
        };

        let kind = if invocation.name == "history" {
            TaskKind::HistoryStep
        } else {
            TaskKind::Normal
        };

        Some(self.queue.enqueue(invocation, kind))
    }

    /// キューのポンプループ
    ///
    /// 実行中の再入は無視される：タスク本体から投入されたコマンドは
    /// 現在のタスクが確定した後、投入順に実行される
    fn pump(&mut self) {
        if self.queue.is_running() {
            return;
        }

        while let Some(task) = self.queue.start_next() {
            let result = self.dispatch(&task.invocation);
            if let Err(error) = &result {
                // 失敗してもセッションは停止しない（ログに記録するのみ）
                log::error!("command '{}' failed: {:#}", task.invocation.name, error);
            }
            self.queue.settle(task, result);
        }
    }

    /// 組み込みコマンドのディスパッチ
    ///
    /// 未知の名前は実行コラボレータへ転送され、そこでも解決できない
    /// 失敗は該当タスクのハンドルだけが観測する
    fn dispatch(&mut self, invocation: &CommandInvocation) -> anyhow::Result<()> {
        match invocation.name.as_str() {
            "history" => {
                let arg = invocation.arg.as_deref().unwrap_or("-1");
                let n: isize = arg.trim().parse().map_err(|_| {
                    anyhow::Error::new(InputError::InvalidArgument { arg: arg.to_string() })
                })?;
                let reuse_prefix = self.queue.predecessor_was_history();
                self.navigator.step(n, &mut self.state, reuse_prefix)?;
                self.refresh_now();
                Ok(())
            }
            "next_completion" => {
                self.state.completion_index += 1;
                self.refresh_now();
                Ok(())
            }
            "prev_completion" => {
                self.state.completion_index -= 1;
                self.refresh_now();
                Ok(())
            }
            "insert_completion" => {
                let selected = self.last_projection.selected_completion().map(String::from);
                if let Some(completion) = selected {
                    self.state.buffer = format!("{} ", completion);
                }
                self.refresh_now();
                Ok(())
            }
            "fill_cmdline" => {
                let text = invocation.arg.clone().unwrap_or_default();
                self.fill_buffer(&text, true, true);
                Ok(())
            }
            "clear" => {
                self.clear_buffer(false);
                Ok(())
            }
            "hide_and_clear" => {
                self.clear_buffer(true);
                Ok(())
            }
            "accept_line" => {
                let line = self.state.buffer.trim().to_string();
                self.clear_buffer(true);
                if let Some(submitted) = CommandInvocation::parse(&line) {
                    self.executor.execute(&submitted.name, submitted.arg.as_deref())?;
                }
                Ok(())
            }
            name => self.executor.execute(name, invocation.arg.as_deref()),
        }
    }

    /// バッファを指定テキストで満たす
    ///
    /// 補完関連状態が変わるため、操作後に即座に再計算を行う
    pub fn fill_buffer(&mut self, text: &str, trailing_space: bool, take_focus: bool) {
        self.state.buffer = if trailing_space {
            format!("{} ", text)
        } else {
            text.to_string()
        };
        self.state.visible = true;
        if take_focus {
            self.state.focused = true;
        }
        self.refresh_now();
    }

    /// バッファをクリアする
    pub fn clear_buffer(&mut self, yield_focus: bool) {
        self.state.buffer.clear();
        self.state.history_offset = 0;
        self.navigator.reset();
        if yield_focus {
            self.state.focused = false;
            self.state.visible = false;
        }
        self.refresh_now();
    }

    /// バッファ末尾へテキストを挿入する（自己挿入・ペースト用）
    ///
    /// 再計算は即座には行わず、デバウンス対象として記録する
    pub fn insert_text(&mut self, text: &str) {
        self.state.buffer.push_str(text);
        self.mark_dirty();
    }

    /// バッファ全体を置き換える（外部編集用）
    pub fn set_buffer_text(&mut self, text: &str) {
        self.state.buffer = text.to_string();
        self.mark_dirty();
    }

    /// デバウンス期限を確認し、必要なら補完を再計算する
    ///
    /// ホストのイベントループから定期的に呼び出すこと
    pub fn tick(&mut self) {
        if let Some(since) = self.dirty_since {
            if since.elapsed() >= self.config.debounce {
                self.refresh_now();
            }
        }
    }

    /// 未反映の変更があるか
    pub fn has_pending_refresh(&self) -> bool {
        self.dirty_since.is_some()
    }

    /// 補完を即座に再計算して反映する
    pub fn refresh_now(&mut self) {
        self.dirty_since = None;
        let filter = self.state.buffer.clone();
        let projection = self.aggregator.refresh(&filter, self.state.completion_index);
        self.commit_refresh(&filter, projection);
    }

    /// 計算済みの射影を陳腐化チェック付きで反映する
    ///
    /// 呼び出し時に捕捉したフィルタ文字列と現在のバッファが一致する
    /// 場合のみ描画コラボレータへ渡す（last-writer-wins）。
    /// 陳腐化した結果は状態にも射影にも影響を与えず破棄される
    pub fn commit_refresh(&mut self, captured_filter: &str, projection: RenderProjection) -> bool {
        if captured_filter != self.state.buffer {
            log::debug!("discarding stale completion refresh for '{}'", captured_filter);
            return false;
        }
        self.renderer.render(&projection);
        self.last_projection = projection;
        true
    }

    fn mark_dirty(&mut self) {
        self.dirty_since = Some(Instant::now());
    }
}

//! コマンドキュー
//!
//! 解決されたコマンドを投入順に直列実行するための明示的なFIFOキュー。
//! タスク i+1 は タスク i が確定（成功または失敗）するまで開始されない。
//! 先行タスクの失敗は後続タスクの実行を妨げない

use std::cell::RefCell;
use std::collections::VecDeque;
use std::fmt;
use std::rc::Rc;

/// 解決されたコマンドの呼び出し形
///
/// コマンド名と省略可能な単一文字列引数。`"history -1"` のような
/// コマンド文字列を先頭語と残り（引数）に分解したもの
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CommandInvocation {
    pub name: String,
    pub arg: Option<String>,
}

impl CommandInvocation {
    /// コマンド文字列から呼び出し形をパース
    ///
    /// 先頭語がコマンド名、残り全体が単一の引数になる
    pub fn parse(command: &str) -> Option<Self> {
        let mut words = command.split_whitespace();
        let name = words.next()?.to_string();
        let rest: Vec<&str> = words.collect();
        let arg = if rest.is_empty() { None } else { Some(rest.join(" ")) };
        Some(Self { name, arg })
    }
}

/// タスクの種別
///
/// 履歴ナビゲーションかどうかをキューが追跡し、HistoryNavigator が
/// 検索プレフィックスを再利用するかの判定に使う（暗黙のグローバル
/// フラグではなく、タスクに付随する明示的なフィールド）
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TaskKind {
    Normal,
    HistoryStep,
}

/// タスクの状態
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TaskStatus {
    /// 未実行
    Pending,
    /// 確定済み（結果が未取得）
    Settled,
    /// 結果が取得済み（キュー側には何も残らない）
    Taken,
}

/// タスク結果の共有スロット
struct TaskSlot {
    result: Option<anyhow::Result<()>>,
    settled: bool,
}

/// タスクの完了を観測するためのハンドル
///
/// Promiseに相当する。結果は一度取得されるとスロットから解放され、
/// 以後は `TaskStatus::Taken` になる
#[derive(Clone)]
pub struct TaskHandle {
    slot: Rc<RefCell<TaskSlot>>,
}

impl TaskHandle {
    fn new() -> Self {
        Self {
            slot: Rc::new(RefCell::new(TaskSlot { result: None, settled: false })),
        }
    }

    /// 現在の状態を取得
    pub fn status(&self) -> TaskStatus {
        let slot = self.slot.borrow();
        if !slot.settled {
            TaskStatus::Pending
        } else if slot.result.is_some() {
            TaskStatus::Settled
        } else {
            TaskStatus::Taken
        }
    }

    /// 確定した結果を取り出す（一度だけ）
    pub fn take_result(&self) -> Option<anyhow::Result<()>> {
        self.slot.borrow_mut().result.take()
    }

    fn settle(&self, result: anyhow::Result<()>) {
        let mut slot = self.slot.borrow_mut();
        slot.result = Some(result);
        slot.settled = true;
    }
}

impl fmt::Debug for TaskHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TaskHandle").field("status", &self.status()).finish()
    }
}

/// キューに積まれた1件のコマンド
#[derive(Debug)]
pub struct QueuedCommand {
    pub invocation: CommandInvocation,
    pub kind: TaskKind,
    handle: TaskHandle,
}

impl QueuedCommand {
    /// このタスクのハンドルを取得
    pub fn handle(&self) -> TaskHandle {
        self.handle.clone()
    }
}

/// 実行中タスクのチケット
///
/// `start_next` で取り出し、ディスパッチ後に必ず `settle` へ返すこと
#[derive(Debug)]
pub struct RunningTask {
    pub invocation: CommandInvocation,
    pub kind: TaskKind,
    handle: TaskHandle,
}

/// コマンドの直列実行キュー
///
/// 「順序付きリスト + 実行中フラグ」方式。enqueue は呼び出し側を
/// ブロックせず、実行は所有者（InputSession）のポンプループが行う
#[derive(Debug, Default)]
pub struct CommandQueue {
    pending: VecDeque<QueuedCommand>,
    running: bool,
    /// 直近に確定したタスクの種別（履歴プレフィックス再利用の判定に使用）
    last_finished: Option<TaskKind>,
}

impl CommandQueue {
    /// 空のキューを作成
    pub fn new() -> Self {
        Self::default()
    }

    /// コマンドを投入する。即座にハンドルを返し、実行は行わない
    pub fn enqueue(&mut self, invocation: CommandInvocation, kind: TaskKind) -> TaskHandle {
        let handle = TaskHandle::new();
        self.pending.push_back(QueuedCommand {
            invocation,
            kind,
            handle: handle.clone(),
        });
        handle
    }

    /// 次のタスクの実行を開始する
    ///
    /// 実行中のタスクがある間は `None` を返す（重なり実行の禁止）
    pub fn start_next(&mut self) -> Option<RunningTask> {
        if self.running {
            return None;
        }
        let task = self.pending.pop_front()?;
        self.running = true;
        Some(RunningTask {
            invocation: task.invocation,
            kind: task.kind,
            handle: task.handle,
        })
    }

    /// 実行を終えたタスクを確定させる
    ///
    /// 失敗してもキューは停止しない。失敗はハンドルの保持者だけが観測する
    pub fn settle(&mut self, task: RunningTask, result: anyhow::Result<()>) {
        task.handle.settle(result);
        self.last_finished = Some(task.kind);
        self.running = false;
    }

    /// 直前に確定したタスクが履歴ナビゲーションだったか
    pub fn predecessor_was_history(&self) -> bool {
        matches!(self.last_finished, Some(TaskKind::HistoryStep))
    }

    /// 履歴フラグをリセットする
    ///
    /// 未バインドキーの自己挿入はキューを通らないため、
    /// 呼び出し側が明示的にリセットする
    pub fn reset_history_flag(&mut self) {
        self.last_finished = Some(TaskKind::Normal);
    }

    /// 実行中かどうか
    pub fn is_running(&self) -> bool {
        self.running
    }

    /// 未実行タスク数
    pub fn pending_len(&self) -> usize {
        self.pending.len()
    }

    /// キューが空かどうか
    pub fn is_empty(&self) -> bool {
        self.pending.is_empty()
    }
}

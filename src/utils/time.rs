//! 時間ユーティリティモジュール
//!
//! 現在時刻の取得（`Clock`）と、一回限りの遅延実行（`Scheduler`）を提供します。
//! ブラウザ実装はJSのタイマーを、`ManualScheduler`は仮想時間を使います。

use std::cell::{Cell, RefCell};
use std::cmp::Ordering;
use std::collections::HashMap;
use std::rc::Rc;

use gloo_timers::callback::Timeout;

use super::id_generator::IdGenerator;

/// 現在のブラウザ時間を取得（ミリ秒）
pub fn current_time_millis() -> f64 {
    js_sys::Date::now()
}

/// UNIXエポックからのミリ秒をISO-8601形式（UTC、ミリ秒精度）に変換
///
/// JSの`Date.prototype.toISOString()`と同じ書式になります。
pub fn iso_timestamp(millis: f64) -> String {
    chrono::DateTime::from_timestamp_millis(millis as i64)
        .unwrap_or_default()
        .to_rfc3339_opts(chrono::SecondsFormat::Millis, true)
}

/// 現在時刻の供給元
pub trait Clock {
    /// UNIXエポックからの経過ミリ秒
    fn now_millis(&self) -> f64;
}

/// `Date.now()`を使うブラウザ用の時計
#[derive(Debug, Clone, Copy, Default)]
pub struct BrowserClock;

impl Clock for BrowserClock {
    fn now_millis(&self) -> f64 {
        current_time_millis()
    }
}

/// スケジュールされたタスクの識別子
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct TimerId(pub u64);

/// 一回限りの遅延タスクを実行するスケジューラ
///
/// 登録したタスクは`cancel`されない限り、必ずちょうど一度だけ実行されます。
pub trait Scheduler {
    /// `delay_ms`ミリ秒後に`task`を実行する
    fn schedule(&self, delay_ms: u32, task: Box<dyn FnOnce()>) -> TimerId;

    /// 未実行のタスクを取り消す。取り消せた場合は`true`
    fn cancel(&self, id: TimerId) -> bool;
}

/// `setTimeout`ベースのスケジューラ
///
/// 保留中の`Timeout`を保持し、`cancel`でドロップ（= `clearTimeout`）します。
pub struct BrowserScheduler {
    ids: IdGenerator,
    pending: Rc<RefCell<HashMap<TimerId, Timeout>>>,
}

impl BrowserScheduler {
    /// 新しいスケジューラを作成
    pub fn new() -> Self {
        Self {
            ids: IdGenerator::new(),
            pending: Rc::new(RefCell::new(HashMap::new())),
        }
    }

    /// 保留中のタスク数
    pub fn pending(&self) -> usize {
        self.pending.borrow().len()
    }
}

impl Default for BrowserScheduler {
    fn default() -> Self {
        Self::new()
    }
}

impl Scheduler for BrowserScheduler {
    fn schedule(&self, delay_ms: u32, task: Box<dyn FnOnce()>) -> TimerId {
        let id = TimerId(self.ids.next_id());
        let pending = Rc::downgrade(&self.pending);

        let timeout = Timeout::new(delay_ms, move || {
            // 発火済みのハンドルを表から外してからタスクを実行
            let finished = pending
                .upgrade()
                .and_then(|pending| pending.borrow_mut().remove(&id));
            task();
            drop(finished);
        });

        self.pending.borrow_mut().insert(id, timeout);
        id
    }

    fn cancel(&self, id: TimerId) -> bool {
        // Timeoutのドロップがタイマーを解除する
        self.pending.borrow_mut().remove(&id).is_some()
    }
}

struct PendingTask {
    id: TimerId,
    due: f64,
    task: Box<dyn FnOnce()>,
}

/// 仮想時間で動くスケジューラ兼時計
///
/// `advance`で時間を進めると、期限を迎えたタスクが期限順（同時刻なら登録順）に
/// 実行されます。ネイティブのテストやヘッドレス実行で使います。
pub struct ManualScheduler {
    now: Cell<f64>,
    ids: IdGenerator,
    queue: RefCell<Vec<PendingTask>>,
}

impl ManualScheduler {
    /// 時刻0から始まるスケジューラを作成
    pub fn new() -> Self {
        Self::starting_at(0.0)
    }

    /// 指定した時刻（エポックミリ秒）から始まるスケジューラを作成
    pub fn starting_at(now: f64) -> Self {
        Self {
            now: Cell::new(now),
            ids: IdGenerator::new(),
            queue: RefCell::new(Vec::new()),
        }
    }

    /// 仮想時間を`ms`ミリ秒進め、期限を迎えたタスクを実行する
    ///
    /// # 戻り値
    ///
    /// * 実行したタスクの数
    pub fn advance(&self, ms: f64) -> usize {
        let target = self.now.get() + ms;
        let mut fired = 0;

        loop {
            // タスク実行前に借用を閉じる
            let next = {
                let mut queue = self.queue.borrow_mut();
                let index = queue
                    .iter()
                    .enumerate()
                    .filter(|(_, pending)| pending.due <= target)
                    .min_by(|(_, a), (_, b)| {
                        a.due
                            .partial_cmp(&b.due)
                            .unwrap_or(Ordering::Equal)
                            .then(a.id.cmp(&b.id))
                    })
                    .map(|(index, _)| index);
                index.map(|index| queue.remove(index))
            };

            match next {
                Some(pending) => {
                    if pending.due > self.now.get() {
                        self.now.set(pending.due);
                    }
                    (pending.task)();
                    fired += 1;
                }
                None => break,
            }
        }

        self.now.set(target);
        fired
    }

    /// 保留中のタスク数
    pub fn pending(&self) -> usize {
        self.queue.borrow().len()
    }

    /// 現在の仮想時刻
    pub fn now(&self) -> f64 {
        self.now.get()
    }
}

impl Default for ManualScheduler {
    fn default() -> Self {
        Self::new()
    }
}

impl Clock for ManualScheduler {
    fn now_millis(&self) -> f64 {
        self.now.get()
    }
}

impl Scheduler for ManualScheduler {
    fn schedule(&self, delay_ms: u32, task: Box<dyn FnOnce()>) -> TimerId {
        let id = TimerId(self.ids.next_id());
        self.queue.borrow_mut().push(PendingTask {
            id,
            due: self.now.get() + f64::from(delay_ms),
            task,
        });
        id
    }

    fn cancel(&self, id: TimerId) -> bool {
        let mut queue = self.queue.borrow_mut();
        let before = queue.len();
        queue.retain(|pending| pending.id != id);
        queue.len() != before
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_iso_timestamp_matches_js_format() {
        assert_eq!(iso_timestamp(0.0), "1970-01-01T00:00:00.000Z");
        assert_eq!(iso_timestamp(1_714_564_800_123.0), "2024-05-01T12:00:00.123Z");
    }

    #[test]
    fn test_manual_scheduler_fires_at_due_time() {
        let scheduler = ManualScheduler::new();
        let fired = Rc::new(Cell::new(0));

        let counter = Rc::clone(&fired);
        scheduler.schedule(100, Box::new(move || counter.set(counter.get() + 1)));

        assert_eq!(scheduler.advance(99.0), 0);
        assert_eq!(fired.get(), 0);
        assert_eq!(scheduler.advance(1.0), 1);
        assert_eq!(fired.get(), 1);
        assert_eq!(scheduler.pending(), 0);

        // 二度目は実行されない
        assert_eq!(scheduler.advance(1000.0), 0);
        assert_eq!(fired.get(), 1);
    }

    #[test]
    fn test_manual_scheduler_orders_by_due_then_registration() {
        let scheduler = ManualScheduler::new();
        let order = Rc::new(RefCell::new(Vec::new()));

        for (delay, label) in [(30, "c"), (10, "a"), (10, "b")] {
            let order = Rc::clone(&order);
            scheduler.schedule(delay, Box::new(move || order.borrow_mut().push(label)));
        }

        scheduler.advance(50.0);
        assert_eq!(*order.borrow(), vec!["a", "b", "c"]);
    }

    #[test]
    fn test_manual_scheduler_cancel() {
        let scheduler = ManualScheduler::new();
        let fired = Rc::new(Cell::new(false));

        let flag = Rc::clone(&fired);
        let id = scheduler.schedule(10, Box::new(move || flag.set(true)));

        assert!(scheduler.cancel(id));
        assert!(!scheduler.cancel(id));
        scheduler.advance(20.0);
        assert!(!fired.get());
    }

    #[test]
    fn test_task_may_schedule_follow_up() {
        let scheduler = Rc::new(ManualScheduler::new());
        let fired = Rc::new(Cell::new(0));

        let inner_scheduler = Rc::clone(&scheduler);
        let counter = Rc::clone(&fired);
        scheduler.schedule(
            10,
            Box::new(move || {
                counter.set(counter.get() + 1);
                let counter = Rc::clone(&counter);
                inner_scheduler.schedule(10, Box::new(move || counter.set(counter.get() + 1)));
            }),
        );

        scheduler.advance(25.0);
        assert_eq!(fired.get(), 2);
        assert_eq!(scheduler.now(), 25.0);
    }
}

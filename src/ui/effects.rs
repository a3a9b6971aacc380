//! 一時エフェクトモジュール
//!
//! ステージクリアの星、スライドの土煙、失敗・開始の全面演出など、
//! 一定時間だけ表示される要素を生成し、寿命が来たら自動で取り除きます。
//!
//! 同じ種類のエフェクトを続けて発生させても合体はせず、
//! それぞれが独立したインスタンスとして個別に取り除かれます。

use std::cell::{Cell, RefCell};
use std::collections::HashMap;
use std::rc::Rc;

use super::coords::{px, to_screen, CameraState, DisplayScale};
use crate::config::UiConfig;
use crate::surface::{Surface, SurfaceFactory};
use crate::utils::{Clock, IdGenerator, Scheduler, TimerId};

/// 開始演出に表示する文言
pub const START_LABEL: &str = "Let's Go!";

/// エフェクトの種類
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum EffectKind {
    /// ステージクリアの星（クリアオーバーレイ内）
    StageClear,
    /// スライドの土煙（エンティティの足元）
    Slide,
    /// 失敗時の全面演出
    Fail,
    /// 開始時の全面演出
    Start,
}

impl EffectKind {
    pub const ALL: [EffectKind; 4] = [
        EffectKind::StageClear,
        EffectKind::Slide,
        EffectKind::Fail,
        EffectKind::Start,
    ];

    /// 寿命（ミリ秒）
    pub fn ttl_ms(&self) -> u32 {
        match self {
            EffectKind::StageClear => 1500,
            EffectKind::Slide => 500,
            EffectKind::Fail => 1000,
            EffectKind::Start => 1000,
        }
    }

    pub fn class_name(&self) -> &'static str {
        match self {
            EffectKind::StageClear => "clear-effect",
            EffectKind::Slide => "slide-effect",
            EffectKind::Fail => "fail-effect",
            EffectKind::Start => "start-effect",
        }
    }

    fn tag(&self) -> &'static str {
        match self {
            EffectKind::StageClear | EffectKind::Slide => "img",
            EffectKind::Fail | EffectKind::Start => "div",
        }
    }

    fn image(&self) -> Option<&'static str> {
        match self {
            EffectKind::StageClear => Some("clear-star.svg"),
            EffectKind::Slide => Some("slide-dust.svg"),
            EffectKind::Fail | EffectKind::Start => None,
        }
    }
}

/// 発生させたエフェクトの取り消し用ハンドル
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct EffectHandle {
    pub id: u64,
    pub kind: EffectKind,
}

/// 生存中のエフェクト
#[derive(Debug)]
pub struct EffectInstance<S: Surface> {
    pub id: u64,
    pub kind: EffectKind,
    /// 生成時刻（ミリ秒）
    pub born_at: f64,
    /// 寿命（ミリ秒）
    pub ttl: u32,
    node: S,
    timer: TimerId,
}

/// エフェクトの親要素
pub struct EffectParents<S: Surface> {
    /// ステージクリアのオーバーレイ
    pub stage_clear: Option<S>,
    /// ゲーム画面のラッパー
    pub game_wrap: Option<S>,
}

type LiveEffects<S> = Rc<RefCell<HashMap<u64, EffectInstance<S>>>>;

/// エフェクトの生成と寿命管理
pub struct EffectScheduler<F: SurfaceFactory> {
    factory: F,
    parents: EffectParents<F::Node>,
    scheduler: Rc<dyn Scheduler>,
    clock: Rc<dyn Clock>,
    ids: IdGenerator,
    live: LiveEffects<F::Node>,
    removed: Rc<Cell<u64>>,
    config: UiConfig,
}

impl<F: SurfaceFactory> EffectScheduler<F> {
    pub fn new(
        factory: F,
        parents: EffectParents<F::Node>,
        scheduler: Rc<dyn Scheduler>,
        clock: Rc<dyn Clock>,
        config: &UiConfig,
    ) -> Self {
        Self {
            factory,
            parents,
            scheduler,
            clock,
            ids: IdGenerator::new(),
            live: Rc::new(RefCell::new(HashMap::new())),
            removed: Rc::new(Cell::new(0)),
            config: config.clone(),
        }
    }

    /// ステージクリアの星を出す（1500ms）
    pub fn trigger_clear(&self) -> Option<EffectHandle> {
        let parent = self.parents.stage_clear.clone();
        self.spawn(EffectKind::StageClear, parent.as_ref(), |_| {})
    }

    /// スライドの土煙を出す（500ms）
    ///
    /// # 引数
    ///
    /// * `x`, `y` - 土煙の基準となるワールド座標
    /// * `facing` - 向き。負なら左（-1）、それ以外は右（+1）
    /// * `camera` - 変換に使うカメラ
    /// * `scale` - 表示倍率
    pub fn trigger_slide(
        &self,
        x: f64,
        y: f64,
        facing: f64,
        camera: &CameraState,
        scale: DisplayScale,
    ) -> Option<EffectHandle> {
        let facing = if facing < 0.0 { -1.0 } else { 1.0 };
        let (h_off, v_off) = self.config.slide_offset;
        let (width, height) = self.config.slide_size;
        let point = to_screen(x - facing * h_off, y - v_off, camera, scale);

        let parent = self.parents.game_wrap.clone();
        self.spawn(EffectKind::Slide, parent.as_ref(), |node| {
            node.set_style("left", &px(point.x));
            node.set_style("top", &px(point.y));
            node.set_style("width", &px(width * point.scale));
            node.set_style("height", &px(height * point.scale));
            // CSS側で左右反転に使う
            node.set_style("--sx", &facing.to_string());
        })
    }

    /// 失敗演出を出す（1000ms）
    pub fn trigger_fail(&self) -> Option<EffectHandle> {
        let parent = self.parents.game_wrap.clone();
        self.spawn(EffectKind::Fail, parent.as_ref(), |_| {})
    }

    /// 開始演出を出す（1000ms）
    pub fn trigger_start(&self) -> Option<EffectHandle> {
        let parent = self.parents.game_wrap.clone();
        self.spawn(EffectKind::Start, parent.as_ref(), |node| node.set_text(START_LABEL))
    }

    fn spawn(
        &self,
        kind: EffectKind,
        parent: Option<&F::Node>,
        decorate: impl FnOnce(&F::Node),
    ) -> Option<EffectHandle> {
        let Some(parent) = parent else {
            log::debug!("effect {:?} skipped: parent surface missing", kind);
            return None;
        };
        let node = self.factory.create(kind.tag())?;

        node.set_class_name(kind.class_name());
        if let Some(image) = kind.image() {
            node.set_attribute("src", &self.config.asset(image));
            node.set_attribute("alt", "");
        }
        decorate(&node);

        if !parent.append_child(&node) {
            log::warn!("effect {:?} could not be attached", kind);
            return None;
        }

        let id = self.ids.next_id();
        let ttl = kind.ttl_ms();
        let live = Rc::downgrade(&self.live);
        let removed = Rc::clone(&self.removed);

        let timer = self.scheduler.schedule(
            ttl,
            Box::new(move || {
                let Some(live) = live.upgrade() else {
                    return;
                };
                let expired = live.borrow_mut().remove(&id);
                if let Some(instance) = expired {
                    remove_node(&instance);
                    removed.set(removed.get() + 1);
                }
            }),
        );

        self.live.borrow_mut().insert(
            id,
            EffectInstance {
                id,
                kind,
                born_at: self.clock.now_millis(),
                ttl,
                node,
                timer,
            },
        );

        log::debug!("✨ effect {:?}#{} spawned (ttl {}ms)", kind, id, ttl);
        Some(EffectHandle { id, kind })
    }

    /// 保留中の削除を取り消し、その場で要素を取り除く
    ///
    /// # 戻り値
    ///
    /// * まだ生存していた場合は`true`
    pub fn cancel(&self, handle: EffectHandle) -> bool {
        let instance = self.live.borrow_mut().remove(&handle.id);
        match instance {
            Some(instance) => {
                self.scheduler.cancel(instance.timer);
                remove_node(&instance);
                self.removed.set(self.removed.get() + 1);
                true
            }
            None => false,
        }
    }

    /// 生存中のすべてのエフェクトを取り除く（画面の破棄時）
    pub fn teardown(&self) -> usize {
        let instances: Vec<_> = self.live.borrow_mut().drain().map(|(_, instance)| instance).collect();
        for instance in &instances {
            self.scheduler.cancel(instance.timer);
            remove_node(instance);
        }
        self.removed.set(self.removed.get() + instances.len() as u64);
        instances.len()
    }

    pub fn is_live(&self, handle: EffectHandle) -> bool {
        self.live.borrow().contains_key(&handle.id)
    }

    pub fn live_count(&self) -> usize {
        self.live.borrow().len()
    }

    pub fn live_count_of(&self, kind: EffectKind) -> usize {
        self.live
            .borrow()
            .values()
            .filter(|instance| instance.kind == kind)
            .count()
    }

    /// これまでに取り除いたエフェクトの数
    pub fn removed_count(&self) -> u64 {
        self.removed.get()
    }
}

impl<F: SurfaceFactory> Drop for EffectScheduler<F> {
    fn drop(&mut self) {
        self.teardown();
    }
}

/// 要素を親から外す。親がすでに無い場合は何もしない
fn remove_node<S: Surface>(instance: &EffectInstance<S>) {
    if instance.node.detach() {
        log::debug!("effect {:?}#{} removed", instance.kind, instance.id);
    } else {
        log::debug!("effect {:?}#{} was already detached", instance.kind, instance.id);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::surface::{MemoryDocument, MemorySurface};
    use crate::utils::ManualScheduler;

    struct Fixture {
        effects: EffectScheduler<MemoryDocument>,
        scheduler: Rc<ManualScheduler>,
        stage_clear: MemorySurface,
        game_wrap: MemorySurface,
    }

    fn fixture() -> Fixture {
        let document = MemoryDocument::new();
        let stage_clear = document.insert("stage-clear", "div");
        let game_wrap = document.insert("game-wrap", "div");
        let scheduler = Rc::new(ManualScheduler::new());
        let effects = EffectScheduler::new(
            document,
            EffectParents {
                stage_clear: Some(stage_clear.clone()),
                game_wrap: Some(game_wrap.clone()),
            },
            scheduler.clone(),
            scheduler.clone(),
            &UiConfig::default(),
        );
        Fixture {
            effects,
            scheduler,
            stage_clear,
            game_wrap,
        }
    }

    #[test]
    fn test_each_kind_removed_exactly_at_ttl() {
        for kind in EffectKind::ALL {
            let f = fixture();
            let handle = match kind {
                EffectKind::StageClear => f.effects.trigger_clear(),
                EffectKind::Slide => f.effects.trigger_slide(
                    0.0,
                    0.0,
                    1.0,
                    &CameraState::default(),
                    DisplayScale::default(),
                ),
                EffectKind::Fail => f.effects.trigger_fail(),
                EffectKind::Start => f.effects.trigger_start(),
            }
            .unwrap();
            let parent = if kind == EffectKind::StageClear {
                &f.stage_clear
            } else {
                &f.game_wrap
            };

            assert_eq!(parent.child_count(), 1);
            f.scheduler.advance(f64::from(kind.ttl_ms()) - 1.0);
            assert!(f.effects.is_live(handle), "{:?} removed too early", kind);
            assert_eq!(parent.child_count(), 1);

            f.scheduler.advance(1.0);
            assert!(!f.effects.is_live(handle), "{:?} not removed at ttl", kind);
            assert_eq!(parent.child_count(), 0);
            assert_eq!(f.effects.removed_count(), 1);
        }
    }

    #[test]
    fn test_concurrent_instances_are_independent() {
        let f = fixture();

        let first = f.effects.trigger_fail().unwrap();
        f.scheduler.advance(400.0);
        let second = f.effects.trigger_fail().unwrap();
        let third = f.effects.trigger_fail().unwrap();

        assert_ne!(first, second);
        assert_ne!(second, third);
        assert_eq!(f.effects.live_count_of(EffectKind::Fail), 3);
        assert_eq!(f.game_wrap.child_count(), 3);

        f.scheduler.advance(600.0);
        assert!(!f.effects.is_live(first));
        assert!(f.effects.is_live(second));
        assert_eq!(f.game_wrap.child_count(), 2);

        f.scheduler.advance(400.0);
        assert_eq!(f.effects.live_count(), 0);
        assert_eq!(f.game_wrap.child_count(), 0);
        assert_eq!(f.effects.removed_count(), 3);
    }

    #[test]
    fn test_mixed_kinds_overlap() {
        let f = fixture();
        f.effects.trigger_start();
        f.effects.trigger_slide(10.0, 10.0, -1.0, &CameraState::default(), DisplayScale::default());
        f.effects.trigger_clear();

        assert_eq!(f.effects.live_count(), 3);
        f.scheduler.advance(500.0);
        assert_eq!(f.effects.live_count_of(EffectKind::Slide), 0);
        f.scheduler.advance(500.0);
        assert_eq!(f.effects.live_count_of(EffectKind::Start), 0);
        assert_eq!(f.effects.live_count_of(EffectKind::StageClear), 1);
        f.scheduler.advance(500.0);
        assert_eq!(f.effects.live_count(), 0);
    }

    #[test]
    fn test_slide_geometry() {
        let f = fixture();
        let camera = CameraState::new(100.0, 50.0);
        f.effects
            .trigger_slide(160.0, 92.0, -1.0, &camera, DisplayScale::new(2.0))
            .unwrap();

        let node = f.game_wrap.children().remove(0);
        assert_eq!(node.tag(), "img");
        assert!(node.has_class("slide-effect"));
        assert_eq!(node.attribute("src").as_deref(), Some("assets/slide-dust.svg"));
        assert_eq!(node.attribute("alt").as_deref(), Some(""));
        // x: (160 + 12 - 100) * 2 = 144, y: (92 - 12 - 50) * 2 = 60
        assert_eq!(node.style("left").as_deref(), Some("144px"));
        assert_eq!(node.style("top").as_deref(), Some("60px"));
        assert_eq!(node.style("width").as_deref(), Some("96px"));
        assert_eq!(node.style("height").as_deref(), Some("48px"));
        assert_eq!(node.style("--sx").as_deref(), Some("-1"));
    }

    #[test]
    fn test_facing_is_normalised() {
        let f = fixture();
        f.effects
            .trigger_slide(0.0, 0.0, 0.3, &CameraState::default(), DisplayScale::default())
            .unwrap();
        let node = f.game_wrap.children().remove(0);
        assert_eq!(node.style("--sx").as_deref(), Some("1"));
        assert_eq!(node.style("left").as_deref(), Some("-12px"));
    }

    #[test]
    fn test_start_and_clear_surfaces() {
        let f = fixture();
        f.effects.trigger_start().unwrap();
        f.effects.trigger_clear().unwrap();

        let start = f.game_wrap.children().remove(0);
        assert_eq!(start.tag(), "div");
        assert!(start.has_class("start-effect"));
        assert_eq!(start.text(), "Let's Go!");

        let star = f.stage_clear.children().remove(0);
        assert!(star.has_class("clear-effect"));
        assert_eq!(star.attribute("src").as_deref(), Some("assets/clear-star.svg"));
    }

    #[test]
    fn test_missing_parent_is_noop() {
        let document = MemoryDocument::new();
        let scheduler = Rc::new(ManualScheduler::new());
        let effects = EffectScheduler::new(
            document,
            EffectParents {
                stage_clear: None,
                game_wrap: None,
            },
            scheduler.clone(),
            scheduler.clone(),
            &UiConfig::default(),
        );

        assert!(effects.trigger_clear().is_none());
        assert!(effects.trigger_fail().is_none());
        assert_eq!(scheduler.pending(), 0);
    }

    #[test]
    fn test_cancel_removes_once() {
        let f = fixture();
        let handle = f.effects.trigger_clear().unwrap();

        assert!(f.effects.cancel(handle));
        assert_eq!(f.stage_clear.child_count(), 0);
        assert_eq!(f.scheduler.pending(), 0);
        assert!(!f.effects.cancel(handle));

        f.scheduler.advance(2000.0);
        assert_eq!(f.effects.removed_count(), 1);
    }

    #[test]
    fn test_removal_tolerates_detached_parent() {
        let f = fixture();
        f.effects.trigger_fail().unwrap();

        // ホストが先に要素を外してしまった場合
        let node = f.game_wrap.children().remove(0);
        node.detach();

        f.scheduler.advance(1000.0);
        assert_eq!(f.effects.live_count(), 0);
        assert_eq!(f.effects.removed_count(), 1);
    }

    #[test]
    fn test_teardown_cancels_everything() {
        let f = fixture();
        f.effects.trigger_fail();
        f.effects.trigger_start();
        f.effects.trigger_clear();

        assert_eq!(f.effects.teardown(), 3);
        assert_eq!(f.scheduler.pending(), 0);
        assert_eq!(f.game_wrap.child_count(), 0);
        assert_eq!(f.stage_clear.child_count(), 0);
    }

    #[test]
    fn test_born_at_uses_clock() {
        let f = fixture();
        f.scheduler.advance(250.0);
        let handle = f.effects.trigger_fail().unwrap();
        let born_at = f.effects.live.borrow().get(&handle.id).map(|i| i.born_at);
        assert_eq!(born_at, Some(250.0));
    }
}

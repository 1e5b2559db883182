use std::{cell::RefCell, rc::Rc};

use siege_core::{
    Color, FrameRate, Layer, Paint, QueryError, RegistryError, SimulationError, TypeTag, Vec2,
};
use siege_world::{Context, Drawable, Entity, EntityCore, EntityRef, Surface, World};

type Journal = Rc<RefCell<Vec<String>>>;

fn journal() -> Journal {
    let _ = env_logger::builder().is_test(true).try_init();
    Rc::new(RefCell::new(Vec::new()))
}

fn entries(journal: &Journal) -> Vec<String> {
    journal.borrow().clone()
}

#[derive(Debug)]
struct Tracer {
    core: EntityCore,
    name: &'static str,
    journal: Journal,
}

impl Tracer {
    fn new(tag: TypeTag, name: &'static str, journal: &Journal) -> Rc<Self> {
        Rc::new(Self {
            core: EntityCore::new(tag, Vec2::ZERO),
            name,
            journal: Rc::clone(journal),
        })
    }
}

impl Entity for Tracer {
    fn core(&self) -> &EntityCore {
        &self.core
    }

    fn init(&self, _ctx: &mut Context<'_>) -> Result<(), SimulationError> {
        self.journal.borrow_mut().push(format!("init {}", self.name));
        Ok(())
    }

    fn tick(&self, ctx: &mut Context<'_>) -> Result<(), SimulationError> {
        self.journal
            .borrow_mut()
            .push(format!("tick {} {}", self.name, ctx.clock().frame()));
        Ok(())
    }

    fn clean(&self, _ctx: &mut Context<'_>) -> Result<(), SimulationError> {
        self.journal.borrow_mut().push(format!("clean {}", self.name));
        Ok(())
    }
}

/// Enemy that leaves during its first tick and spawns a replacement.
#[derive(Debug)]
struct Leaver {
    core: EntityCore,
    journal: Journal,
}

impl Entity for Leaver {
    fn core(&self) -> &EntityCore {
        &self.core
    }

    fn tick(&self, ctx: &mut Context<'_>) -> Result<(), SimulationError> {
        ctx.remove(self);
        ctx.add(Tracer::new(TypeTag::Enemy, "replacement", &self.journal))?;
        Ok(())
    }
}

/// Tower that records how many enemies its queries observe.
#[derive(Debug)]
struct Observer {
    core: EntityCore,
    journal: Journal,
}

impl Entity for Observer {
    fn core(&self) -> &EntityCore {
        &self.core
    }

    fn tick(&self, ctx: &mut Context<'_>) -> Result<(), SimulationError> {
        let seen = ctx.get(TypeTag::Enemy).count();
        self.journal
            .borrow_mut()
            .push(format!("frame {} saw {seen}", ctx.clock().frame()));
        Ok(())
    }
}

/// Entity that queues a prepared child during its tick.
#[derive(Debug)]
struct Spawner {
    core: EntityCore,
    child: EntityRef,
    cancel: bool,
    journal: Journal,
}

impl Entity for Spawner {
    fn core(&self) -> &EntityCore {
        &self.core
    }

    fn tick(&self, ctx: &mut Context<'_>) -> Result<(), SimulationError> {
        if ctx.clock().frame() != 0 {
            return Ok(());
        }
        let first = ctx.add(Rc::clone(&self.child));
        let second = ctx.add(Rc::clone(&self.child));
        self.journal
            .borrow_mut()
            .push(format!("first {first:?} second {second:?}"));
        if self.cancel {
            ctx.remove(&*self.child);
        }
        Ok(())
    }
}

#[test]
fn init_precedes_ticks_and_clean_follows_last_tick() {
    let journal = journal();
    let mut world = World::new(FrameRate::new(30));
    let tracer = Tracer::new(TypeTag::Tile, "a", &journal);

    world.add(tracer.clone()).expect("admit tracer");
    assert!(tracer.core().in_simulation());
    let _ = world.step().expect("frame 0");
    let _ = world.step().expect("frame 1");
    world.remove(&*tracer).expect("remove tracer");
    assert!(!tracer.core().in_simulation());
    let _ = world.step().expect("frame 2");

    assert_eq!(
        entries(&journal),
        vec!["init a", "tick a 0", "tick a 1", "clean a"],
    );
}

#[test]
fn queries_observe_frame_start_snapshot() {
    let journal = journal();
    let mut world = World::default();

    for _ in 0..2 {
        world
            .add(Rc::new(Leaver {
                core: EntityCore::new(TypeTag::Enemy, Vec2::ZERO),
                journal: Rc::clone(&journal),
            }))
            .expect("admit leaver");
    }
    world
        .add(Rc::new(Observer {
            core: EntityCore::new(TypeTag::Tower, Vec2::ZERO),
            journal: Rc::clone(&journal),
        }))
        .expect("admit observer");

    let first = world.step().expect("frame 0");
    assert_eq!(first.ticked, 3);
    assert_eq!(
        world.get(TypeTag::Enemy).count(),
        2,
        "removals and admissions requested mid-pass stay buffered",
    );

    let second = world.step().expect("frame 1");
    assert_eq!(second.removed, 2);
    assert_eq!(second.admitted, 2);

    let observations: Vec<String> = entries(&journal)
        .into_iter()
        .filter(|entry| entry.starts_with("frame"))
        .collect();
    assert_eq!(observations, vec!["frame 0 saw 2", "frame 1 saw 2"]);

    let replacements = world
        .get(TypeTag::Enemy)
        .cast::<Tracer>()
        .filter(|tracer| tracer.name == "replacement")
        .count();
    assert_eq!(replacements, 2);
}

#[test]
fn adding_a_resident_entity_is_rejected() {
    let journal = journal();
    let mut world = World::default();
    let tracer = Tracer::new(TypeTag::Shot, "dup", &journal);

    world.add(tracer.clone()).expect("first admission");
    let error = world.add(tracer).expect_err("second admission must fail");

    assert_eq!(
        error,
        SimulationError::Registry(RegistryError::DuplicateRegistration {
            tag: TypeTag::Shot,
        }),
    );
    assert_eq!(entries(&journal), vec!["init dup"]);
}

#[test]
fn queuing_the_same_entity_twice_in_a_pass_is_rejected() {
    let journal = journal();
    let mut world = World::default();
    let child = Tracer::new(TypeTag::Shot, "child", &journal);
    world
        .add(Rc::new(Spawner {
            core: EntityCore::new(TypeTag::Tower, Vec2::ZERO),
            child: child.clone(),
            cancel: false,
            journal: Rc::clone(&journal),
        }))
        .expect("admit spawner");

    let _ = world.step().expect("frame 0");
    assert!(!child.core().in_simulation(), "admission waits for the flush");
    let _ = world.step().expect("frame 1");
    assert!(child.core().in_simulation());

    assert_eq!(
        entries(&journal),
        vec![
            "first Ok(()) second Err(DuplicateRegistration { tag: Shot })",
            "init child",
            "tick child 1",
        ],
    );
}

#[test]
fn removal_cancels_a_queued_admission() {
    let journal = journal();
    let mut world = World::default();
    let child = Tracer::new(TypeTag::Shot, "child", &journal);
    world
        .add(Rc::new(Spawner {
            core: EntityCore::new(TypeTag::Tower, Vec2::ZERO),
            child: child.clone(),
            cancel: true,
            journal: Rc::clone(&journal),
        }))
        .expect("admit spawner");

    let _ = world.step().expect("frame 0");
    let report = world.step().expect("frame 1");

    assert_eq!(report.admitted, 0);
    assert!(!child.core().in_simulation());
    assert_eq!(world.get(TypeTag::Shot).count(), 0);
    assert!(!entries(&journal).iter().any(|entry| entry == "init child"));
}

#[test]
fn removing_an_absent_entity_is_a_no_op() {
    let journal = journal();
    let mut world = World::default();
    let resident = Tracer::new(TypeTag::Enemy, "resident", &journal);
    let stranger = Tracer::new(TypeTag::Enemy, "stranger", &journal);
    world.add(resident).expect("admit resident");

    world.remove(&*stranger).expect("removing a stranger succeeds");

    assert_eq!(world.len(), 1);
    assert_eq!(entries(&journal), vec!["init resident"]);
}

#[test]
fn removed_entity_is_readmitted_with_a_fresh_identifier() {
    let journal = journal();
    let mut world = World::default();
    let tracer = Tracer::new(TypeTag::Tower, "again", &journal);

    world.add(tracer.clone()).expect("first admission");
    let first_id = tracer.core().id().expect("resident id");
    world.remove(&*tracer).expect("removal");
    assert!(world.lookup(first_id).is_none());

    world.add(tracer.clone()).expect("second admission");
    let second_id = tracer.core().id().expect("resident id");

    assert_ne!(first_id, second_id);
    assert_eq!(
        entries(&journal),
        vec!["init again", "clean again", "init again"],
    );
}

#[test]
fn unknown_raw_tags_yield_empty_queries() {
    let journal = journal();
    let mut world = World::default();
    world
        .add(Tracer::new(TypeTag::Enemy, "e", &journal))
        .expect("admit enemy");

    assert_eq!(world.get_raw(TypeTag::Enemy.raw()).count(), 1);
    assert_eq!(world.get_raw(0).count(), 0);
    assert_eq!(world.get_raw(42).count(), 0);
}

#[test]
fn failing_tick_aborts_the_frame() {
    #[derive(Debug)]
    struct Greedy {
        core: EntityCore,
    }

    impl Entity for Greedy {
        fn core(&self) -> &EntityCore {
            &self.core
        }

        fn tick(&self, ctx: &mut Context<'_>) -> Result<(), SimulationError> {
            let _ = ctx.get(TypeTag::Shot).pull()?;
            Ok(())
        }
    }

    let mut world = World::default();
    world
        .add(Rc::new(Greedy {
            core: EntityCore::new(TypeTag::Tower, Vec2::ZERO),
        }))
        .expect("admit");

    assert_eq!(
        world.step(),
        Err(SimulationError::Query(QueryError::Exhausted)),
    );
}

#[derive(Debug)]
struct Marker {
    layer: Layer,
    label: f32,
}

impl Drawable for Marker {
    fn layer(&self) -> Layer {
        self.layer
    }

    fn draw(&self, surface: &mut dyn Surface) {
        surface.draw_circle(Vec2::ZERO, self.label, &Paint::fill(Color::from_rgb_u8(0, 0, 0)));
    }
}

#[derive(Debug)]
struct Decorated {
    core: EntityCore,
    markers: Vec<Rc<dyn Drawable>>,
}

impl Entity for Decorated {
    fn core(&self) -> &EntityCore {
        &self.core
    }

    fn init(&self, ctx: &mut Context<'_>) -> Result<(), SimulationError> {
        for marker in &self.markers {
            ctx.add_drawable(Rc::clone(marker));
        }
        Ok(())
    }

    fn clean(&self, ctx: &mut Context<'_>) -> Result<(), SimulationError> {
        for marker in &self.markers {
            ctx.remove_drawable(marker);
        }
        Ok(())
    }
}

#[derive(Default)]
struct Labels(Vec<f32>);

impl Surface for Labels {
    fn draw_circle(&mut self, _center: Vec2, radius: f32, _paint: &Paint) {
        self.0.push(radius);
    }

    fn draw_rect(&mut self, _center: Vec2, _size: Vec2, _paint: &Paint) {}

    fn draw_line(&mut self, _from: Vec2, _to: Vec2, _paint: &Paint) {}
}

fn decorated(markers: &[(Layer, f32)]) -> Rc<Decorated> {
    Rc::new(Decorated {
        core: EntityCore::new(TypeTag::Tile, Vec2::ZERO),
        markers: markers
            .iter()
            .map(|&(layer, label)| Rc::new(Marker { layer, label }) as Rc<dyn Drawable>)
            .collect(),
    })
}

#[test]
fn drawables_are_presented_by_layer_then_registration_order() {
    let mut world = World::default();
    let first = decorated(&[(Layer::Ui, 1.0), (Layer::Tile, 2.0)]);
    let second = decorated(&[(Layer::Shot, 3.0), (Layer::Tile, 4.0), (Layer::Ui, 5.0)]);
    world.add(first.clone()).expect("admit first");
    world.add(second).expect("admit second");

    let mut labels = Labels::default();
    world.draw(&mut labels);
    assert_eq!(labels.0, vec![2.0, 4.0, 3.0, 1.0, 5.0]);

    world.remove(&*first).expect("remove first");
    let mut labels = Labels::default();
    world.draw(&mut labels);
    assert_eq!(labels.0, vec![4.0, 3.0, 5.0]);
    assert_eq!(world.drawable_count(Layer::Ui), 1);
}

/// Entity that queues a batch of prepared entities during frame 0.
#[derive(Debug)]
struct Queuer {
    core: EntityCore,
    batch: Vec<EntityRef>,
}

impl Entity for Queuer {
    fn core(&self) -> &EntityCore {
        &self.core
    }

    fn tick(&self, ctx: &mut Context<'_>) -> Result<(), SimulationError> {
        if ctx.clock().frame() == 0 {
            for entity in &self.batch {
                ctx.add(Rc::clone(entity))?;
            }
        }
        Ok(())
    }
}

#[derive(Clone, Copy, Debug)]
enum Request {
    Add,
    Remove,
}

/// Entity that sends a request about `other` from its `init` or `clean` hook.
#[derive(Debug)]
struct Hook {
    core: EntityCore,
    other: EntityRef,
    on_init: Option<Request>,
    on_clean: Option<Request>,
    journal: Journal,
}

impl Hook {
    fn new(
        other: &EntityRef,
        on_init: Option<Request>,
        on_clean: Option<Request>,
        journal: &Journal,
    ) -> Rc<Self> {
        Rc::new(Self {
            core: EntityCore::new(TypeTag::Effect, Vec2::ZERO),
            other: Rc::clone(other),
            on_init,
            on_clean,
            journal: Rc::clone(journal),
        })
    }

    fn send(&self, request: Option<Request>, ctx: &mut Context<'_>, hook: &str) {
        match request {
            Some(Request::Add) => {
                let outcome = ctx.add(Rc::clone(&self.other));
                self.journal
                    .borrow_mut()
                    .push(format!("{hook} add {outcome:?}"));
            }
            Some(Request::Remove) => ctx.remove(&*self.other),
            None => {}
        }
    }
}

impl Entity for Hook {
    fn core(&self) -> &EntityCore {
        &self.core
    }

    fn init(&self, ctx: &mut Context<'_>) -> Result<(), SimulationError> {
        self.send(self.on_init, ctx, "init");
        Ok(())
    }

    fn clean(&self, ctx: &mut Context<'_>) -> Result<(), SimulationError> {
        self.send(self.on_clean, ctx, "clean");
        Ok(())
    }
}

/// Tower that asks twice for the removal of each victim during frame 0.
#[derive(Debug)]
struct Reaper {
    core: EntityCore,
    victims: Vec<EntityRef>,
}

impl Entity for Reaper {
    fn core(&self) -> &EntityCore {
        &self.core
    }

    fn tick(&self, ctx: &mut Context<'_>) -> Result<(), SimulationError> {
        if ctx.clock().frame() == 0 {
            for victim in &self.victims {
                ctx.remove(&**victim);
                ctx.remove(&**victim);
            }
        }
        Ok(())
    }
}

/// Entity whose `clean` hook fails.
#[derive(Debug)]
struct Brittle {
    core: EntityCore,
}

impl Entity for Brittle {
    fn core(&self) -> &EntityCore {
        &self.core
    }

    fn clean(&self, _ctx: &mut Context<'_>) -> Result<(), SimulationError> {
        Err(QueryError::Exhausted.into())
    }
}

#[test]
fn init_cannot_readmit_an_entity_waiting_in_the_same_flush() {
    let journal = journal();
    let mut world = World::default();
    let leaf: EntityRef = Tracer::new(TypeTag::Shot, "leaf", &journal);
    let hook: EntityRef = Hook::new(&leaf, Some(Request::Add), None, &journal);
    world
        .add(Rc::new(Queuer {
            core: EntityCore::new(TypeTag::Tower, Vec2::ZERO),
            batch: vec![hook, Rc::clone(&leaf)],
        }))
        .expect("admit queuer");

    let _ = world.step().expect("frame 0");
    let report = world.step().expect("frame 1");

    assert_eq!(report.admitted, 2);
    assert_eq!(world.get(TypeTag::Shot).count(), 1);
    assert_eq!(
        entries(&journal),
        vec![
            "init add Err(DuplicateRegistration { tag: Shot })",
            "init leaf",
            "tick leaf 1",
        ],
    );

    let id = leaf.core().id().expect("resident leaf");
    world.remove(&*leaf).expect("remove leaf");
    assert!(world.lookup(id).is_none());
    assert_eq!(world.get(TypeTag::Shot).count(), 0);
    assert_eq!(world.len(), 2);
}

#[test]
fn init_can_cancel_an_admission_waiting_in_the_same_flush() {
    let journal = journal();
    let mut world = World::default();
    let leaf: EntityRef = Tracer::new(TypeTag::Shot, "leaf", &journal);
    let hook: EntityRef = Hook::new(&leaf, Some(Request::Remove), None, &journal);
    world
        .add(Rc::new(Queuer {
            core: EntityCore::new(TypeTag::Tower, Vec2::ZERO),
            batch: vec![hook, Rc::clone(&leaf)],
        }))
        .expect("admit queuer");

    let _ = world.step().expect("frame 0");
    let report = world.step().expect("frame 1");
    let _ = world.step().expect("frame 2");

    assert_eq!(report.admitted, 1);
    assert!(!leaf.core().in_simulation());
    assert_eq!(world.get(TypeTag::Shot).count(), 0);
    assert!(entries(&journal).is_empty());
}

#[test]
fn admissions_requested_by_init_join_the_same_flush() {
    let journal = journal();
    let mut world = World::default();
    let leaf: EntityRef = Tracer::new(TypeTag::Shot, "leaf", &journal);

    world
        .add(Hook::new(&leaf, Some(Request::Add), None, &journal))
        .expect("admit hook");
    assert!(leaf.core().in_simulation());

    let report = world.step().expect("frame 0");
    assert_eq!(report.ticked, 2);
    assert_eq!(
        entries(&journal),
        vec!["init add Ok(())", "init leaf", "tick leaf 0"],
    );
}

#[test]
fn removals_requested_by_clean_join_the_same_flush() {
    let journal = journal();
    let mut world = World::default();
    let partner: EntityRef = Tracer::new(TypeTag::Enemy, "partner", &journal);
    let hook = Hook::new(&partner, None, Some(Request::Remove), &journal);
    world.add(Rc::clone(&partner)).expect("admit partner");
    world.add(hook.clone()).expect("admit hook");

    world.remove(&*hook).expect("remove hook");

    assert!(!partner.core().in_simulation());
    assert!(world.is_empty());
    assert_eq!(entries(&journal), vec!["init partner", "clean partner"]);
}

#[test]
fn duplicate_removals_in_one_frame_clean_once() {
    let journal = journal();
    let mut world = World::default();
    let victim: EntityRef = Tracer::new(TypeTag::Enemy, "victim", &journal);
    world.add(Rc::clone(&victim)).expect("admit victim");
    for _ in 0..2 {
        world
            .add(Rc::new(Reaper {
                core: EntityCore::new(TypeTag::Tower, Vec2::ZERO),
                victims: vec![Rc::clone(&victim)],
            }))
            .expect("admit reaper");
    }

    let _ = world.step().expect("frame 0");
    let report = world.step().expect("frame 1");

    assert_eq!(report.removed, 1);
    let cleans = entries(&journal)
        .into_iter()
        .filter(|entry| entry == "clean victim")
        .count();
    assert_eq!(cleans, 1);
}

#[test]
fn failing_clean_keeps_later_requests_queued() {
    let journal = journal();
    let mut world = World::default();
    let brittle: EntityRef = Rc::new(Brittle {
        core: EntityCore::new(TypeTag::Shot, Vec2::ZERO),
    });
    let victim: EntityRef = Tracer::new(TypeTag::Enemy, "victim", &journal);
    world.add(Rc::clone(&brittle)).expect("admit brittle");
    world.add(Rc::clone(&victim)).expect("admit victim");
    world
        .add(Rc::new(Reaper {
            core: EntityCore::new(TypeTag::Tower, Vec2::ZERO),
            victims: vec![Rc::clone(&brittle), Rc::clone(&victim)],
        }))
        .expect("admit reaper");

    let _ = world.step().expect("frame 0");
    assert_eq!(
        world.step(),
        Err(SimulationError::Query(QueryError::Exhausted)),
    );
    assert!(!brittle.core().in_simulation());
    assert!(victim.core().in_simulation());

    let report = world.step().expect("retried frame");
    assert_eq!(report.removed, 1);
    assert!(!victim.core().in_simulation());
    assert_eq!(
        entries(&journal).last().map(String::as_str),
        Some("clean victim"),
    );
}

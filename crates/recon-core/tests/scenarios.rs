//! End-to-end scenarios for the Recon domain.
//!
//! Each scenario drives a [`Simulator`] over a small grid with a sampler
//! whose draw can be changed between steps, so Bernoulli outcomes are
//! forced rather than seeded.

#![allow(clippy::unwrap_used)]

use std::cell::Cell as Shared;
use std::rc::Rc;

use recon_core::eval::{Bindings, EvalContext};
use recon_core::recon::names::{
    DAMAGED, LIFE_CHECKED, LIFE_CHECKED2, LIFE_DETECTED, PICTURE_TAKEN, WATER_CHECKED,
    WATER_DETECTED,
};
use recon_core::recon::{
    AgentSpec, Cell, Direction, ObjectSpec, ReconInstance, ToolRole, ToolSpec, agent_at, damaged,
    move_agent, object_fluent, repair, use_tool_on,
};
use recon_core::sampling::SampleSource;
use recon_core::transition::{Outcome, resolve_outcome};
use recon_core::{Simulator, StepResult};
use recon_types::{ActionAssignment, GroundVariable, ObjectRef, VarName};

/// Returns whatever draw the test last set.
struct Scripted(Rc<Shared<f64>>);

impl SampleSource for Scripted {
    fn uniform(&mut self, _step: u64, _ground: &GroundVariable) -> f64 {
        self.0.get()
    }
}

/// Draw that makes every Bernoulli with positive probability succeed.
const HIT: f64 = 0.0;
/// Draw that makes every Bernoulli below certainty fail.
const MISS: f64 = 0.999_999;

/// A 2x1 grid without hazards: base at (0, 0), rover and rock at (1, 0).
fn site() -> ReconInstance {
    let tool = |name: &str, role| ToolSpec {
        name: name.to_owned(),
        role,
        damage_prob: 0.5,
    };
    ReconInstance {
        name: "site".to_owned(),
        width: 2,
        height: 1,
        base: Cell::new(0, 0),
        hazards: Vec::new(),
        agents: vec![AgentSpec {
            name: "a1".to_owned(),
            start: Cell::new(1, 0),
        }],
        tools: vec![
            tool("camera", ToolRole::Camera),
            tool("l1", ToolRole::Life),
            tool("w1", ToolRole::Water),
        ],
        objects: vec![ObjectSpec {
            name: "o1".to_owned(),
            at: Cell::new(1, 0),
        }],
        ..ReconInstance::default()
    }
}

fn simulator(instance: &ReconInstance) -> (Simulator, Rc<Shared<f64>>) {
    let draw = Rc::new(Shared::new(HIT));
    let (domain, store) = instance.load().unwrap();
    let sim = Simulator::new(domain, store, Box::new(Scripted(Rc::clone(&draw))));
    (sim, draw)
}

fn use_tool(sim: &mut Simulator, tool: &str) -> StepResult {
    sim.step(&ActionAssignment::with_true([use_tool_on("a1", tool, "o1")]))
        .unwrap()
}

fn is_true(result: &StepResult, fluent: &str) -> bool {
    result.next_state.is_true(&object_fluent(fluent, "o1"))
}

#[test]
fn water_then_life_then_photo_earns_the_good_weight_once() {
    let (mut sim, _draw) = simulator(&site());

    let water = use_tool(&mut sim, "w1");
    assert!(water.reward.abs() < 1e-12);
    assert!(is_true(&water, WATER_CHECKED));
    assert!(is_true(&water, WATER_DETECTED));

    let life = use_tool(&mut sim, "l1");
    assert!(life.reward.abs() < 1e-12);
    assert!(is_true(&life, LIFE_CHECKED));
    assert!(is_true(&life, LIFE_DETECTED));

    let photo = use_tool(&mut sim, "camera");
    assert!((photo.reward - 1.0).abs() < 1e-12);
    assert!(is_true(&photo, PICTURE_TAKEN));

    // A second picture of the same object earns nothing more.
    let again = use_tool(&mut sim, "camera");
    assert!(again.reward.abs() < 1e-12);
    assert!(is_true(&again, PICTURE_TAKEN));
}

#[test]
fn two_objects_with_life_pay_out_once_each() {
    let mut instance = site();
    instance.objects.push(ObjectSpec {
        name: "o2".to_owned(),
        at: Cell::new(1, 0),
    });
    let (mut sim, _draw) = simulator(&instance);

    let both = |tool: &str| {
        ActionAssignment::with_true([
            use_tool_on("a1", tool, "o1"),
            use_tool_on("a1", tool, "o2"),
        ])
    };
    let mut total = 0.0;
    for tool in ["w1", "l1", "camera", "camera"] {
        total += sim.step(&both(tool)).unwrap().reward;
    }
    assert!((total - 2.0).abs() < 1e-12);
}

#[test]
fn photos_without_life_are_penalized_every_time() {
    // The bad-picture penalty has no `~pictureTaken` guard in the reference
    // domain, so every repeat photo keeps paying it.
    let (mut sim, _draw) = simulator(&site());

    let first = use_tool(&mut sim, "camera");
    assert!((first.reward + 2.0).abs() < 1e-12);
    assert!(is_true(&first, PICTURE_TAKEN));

    let second = use_tool(&mut sim, "camera");
    assert!((second.reward + 2.0).abs() < 1e-12);
}

#[test]
fn a_missed_water_check_locks_detection_out() {
    let (mut sim, draw) = simulator(&site());

    draw.set(MISS);
    let missed = use_tool(&mut sim, "w1");
    assert!(is_true(&missed, WATER_CHECKED));
    assert!(!is_true(&missed, WATER_DETECTED));

    draw.set(HIT);
    let retry = use_tool(&mut sim, "w1");
    assert!(!is_true(&retry, WATER_DETECTED));
    assert_eq!(retry.stats.bernoulli_draws, 0);
}

#[test]
fn detected_water_stays_detected() {
    let (mut sim, draw) = simulator(&site());
    use_tool(&mut sim, "w1");

    draw.set(MISS);
    for _ in 0..3 {
        let result = sim.step(&ActionAssignment::new()).unwrap();
        assert!(is_true(&result, WATER_DETECTED));
    }
}

#[test]
fn life_is_never_detected_without_water() {
    let (mut sim, _draw) = simulator(&site());

    let result = use_tool(&mut sim, "l1");
    assert!(is_true(&result, LIFE_CHECKED));
    assert!(!is_true(&result, LIFE_DETECTED));
    assert_eq!(result.stats.bernoulli_draws, 0);
}

#[test]
fn life_gets_exactly_two_checks() {
    let (mut sim, draw) = simulator(&site());
    use_tool(&mut sim, "w1");

    draw.set(MISS);
    let first = use_tool(&mut sim, "l1");
    assert!(!is_true(&first, LIFE_DETECTED));
    assert!(!is_true(&first, LIFE_CHECKED2));

    let second = use_tool(&mut sim, "l1");
    assert!(!is_true(&second, LIFE_DETECTED));
    assert!(is_true(&second, LIFE_CHECKED2));

    draw.set(HIT);
    let third = use_tool(&mut sim, "l1");
    assert!(!is_true(&third, LIFE_DETECTED));
}

/// Resolve `damaged(camera)` with the rover standing at `at` on the default
/// grid, where the only hazard is (1, 1) and the camera's damage
/// probability is 0.3.
fn camera_damage_outcome(at: Cell, actions: &ActionAssignment) -> Outcome {
    let instance = ReconInstance {
        agents: vec![AgentSpec {
            name: "a1".to_owned(),
            start: at,
        }],
        ..ReconInstance::default()
    };
    let (domain, store) = instance.load().unwrap();
    let cpf = domain.cpf_for(&VarName::from(DAMAGED)).unwrap();
    let ctx = EvalContext::new(&store, actions);
    let mut bindings = Bindings::from_pairs(&cpf.params, &[ObjectRef::new("tool", "camera")]);
    resolve_outcome(&ctx, &cpf.body, &mut bindings).unwrap()
}

#[test]
fn damage_is_full_in_a_hazard_and_half_next_to_one() {
    let idle = ActionAssignment::new();

    let inside = camera_damage_outcome(Cell::new(1, 1), &idle);
    assert!(matches!(inside, Outcome::Bernoulli(p) if (p - 0.3).abs() < 1e-12));

    let beside = camera_damage_outcome(Cell::new(0, 1), &idle);
    assert!(matches!(beside, Outcome::Bernoulli(p) if (p - 0.15).abs() < 1e-12));

    let diagonal = camera_damage_outcome(Cell::new(2, 2), &idle);
    assert!(matches!(diagonal, Outcome::Deterministic(v) if !v.is_true()));
}

#[test]
fn repair_at_the_base_clears_damage_taken_elsewhere() {
    let mut instance = ReconInstance::default();
    instance.hazards.push(Cell::new(0, 0));
    let (mut sim, draw) = simulator(&ReconInstance {
        agents: vec![AgentSpec {
            name: "a1".to_owned(),
            start: Cell::new(0, 0),
        }],
        ..instance
    });

    // The base cell is itself a hazard but is exempt from in-hazard damage;
    // (0, 0) is not next to (1, 1), so nothing is drawn yet.
    draw.set(HIT);
    let idle = sim.step(&ActionAssignment::new()).unwrap();
    assert!(!idle.next_state.is_true(&damaged("camera")));

    // Walk up next to (1, 1) and take damage there.
    let up = sim
        .step(&ActionAssignment::with_true([move_agent("a1", Direction::Up)]))
        .unwrap();
    assert!(up.next_state.is_true(&agent_at("a1", Cell::new(0, 1))));
    let hurt = sim.step(&ActionAssignment::new()).unwrap();
    assert!(hurt.next_state.is_true(&damaged("camera")));

    // Damage sticks until repaired at the base.
    let down = sim
        .step(&ActionAssignment::with_true([move_agent("a1", Direction::Down)]))
        .unwrap();
    assert!(down.next_state.is_true(&damaged("camera")));
    let fixed = sim
        .step(&ActionAssignment::with_true([repair("a1", "camera")]))
        .unwrap();
    assert!(!fixed.next_state.is_true(&damaged("camera")));
}

#[test]
fn repair_at_the_base_wins_over_an_adjacent_hazard() {
    let mut instance = site();
    instance.hazards.push(Cell::new(1, 0));
    instance.agents = vec![AgentSpec {
        name: "a1".to_owned(),
        start: Cell::new(0, 0),
    }];
    let (mut sim, draw) = simulator(&instance);

    // Every exposure draw succeeds from here on.
    draw.set(HIT);
    let hurt = sim.step(&ActionAssignment::new()).unwrap();
    assert!(hurt.next_state.is_true(&damaged("camera")));

    let fixed = sim
        .step(&ActionAssignment::with_true([repair("a1", "camera")]))
        .unwrap();
    assert!(!fixed.next_state.is_true(&damaged("camera")));
    // Tools left alone stay exposed.
    assert!(fixed.next_state.is_true(&damaged("l1")));
}

#[test]
fn damaged_cameras_take_no_pictures() {
    let mut instance = site();
    instance.hazards.push(Cell::new(1, 0));
    let (mut sim, draw) = simulator(&instance);

    draw.set(HIT);
    let hurt = sim.step(&ActionAssignment::new()).unwrap();
    assert!(hurt.next_state.is_true(&damaged("camera")));

    let photo = use_tool(&mut sim, "camera");
    assert!(photo.reward.abs() < 1e-12);
    assert!(!is_true(&photo, PICTURE_TAKEN));
}

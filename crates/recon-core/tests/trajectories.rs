//! Invariants checked over seeded random trajectories of the default
//! Recon instance.

#![allow(clippy::unwrap_used)]

use recon_core::policy::{ActionScope, RandomBoolPolicy};
use recon_core::recon::names::{
    LIFE_CHECKED, LIFE_CHECKED2, LIFE_DETECTED, PICTURE_TAKEN, WATER_CHECKED, WATER_DETECTED,
};
use recon_core::recon::{Cell, ReconInstance, agent_at, damaged, object_fluent, repair};
use recon_core::runner::{EpisodeSettings, StepCallback, run_episode};
use recon_core::{Simulator, StepResult};
use recon_types::{ActionAssignment, StateSnapshot};

/// Records every step of an episode.
#[derive(Default)]
struct Recorder {
    steps: Vec<(ActionAssignment, StepResult)>,
}

impl StepCallback for Recorder {
    fn on_step(&mut self, actions: &ActionAssignment, result: &StepResult) {
        self.steps.push((actions.clone(), result.clone()));
    }
}

const SEEDS: [u64; 6] = [0, 1, 2, 3, 42, 1_000_003];

fn trajectory(seed: u64) -> (StateSnapshot, Vec<(ActionAssignment, StepResult)>, usize) {
    let (domain, store) = ReconInstance::default().load().unwrap();
    let instances = store.state_instance_count().unwrap();
    let mut sim = Simulator::with_seed(domain, store, seed);
    let initial = sim.state().unwrap();
    let mut policy = RandomBoolPolicy::from_seed(seed).with_scope(ActionScope::AllDeclared);
    let mut recorder = Recorder::default();
    let settings = EpisodeSettings {
        horizon: 60,
        discount: 1.0,
    };
    run_episode(&mut sim, &mut policy, &settings, &mut recorder).unwrap();
    (initial, recorder.steps, instances)
}

/// Pairs of (state before, actions, state after) for a trajectory.
fn transitions(
    initial: &StateSnapshot,
    steps: &[(ActionAssignment, StepResult)],
) -> Vec<(StateSnapshot, ActionAssignment, StateSnapshot)> {
    let mut before = initial.clone();
    let mut out = Vec::new();
    for (actions, result) in steps {
        out.push((before, actions.clone(), result.next_state.clone()));
        before = result.next_state.clone();
    }
    out
}

#[test]
fn every_step_assigns_every_state_instance() {
    for seed in SEEDS {
        let (_, steps, instances) = trajectory(seed);
        assert_eq!(steps.len(), 60);
        for (_, result) in &steps {
            assert_eq!(result.next_state.len(), instances);
            assert_eq!(result.stats.ground_instances, instances);
        }
    }
}

#[test]
fn the_rover_is_always_in_exactly_one_cell() {
    let cells: Vec<Cell> = (0..3)
        .flat_map(|x| (0..3).map(move |y| Cell::new(x, y)))
        .collect();
    for seed in SEEDS {
        let (_, steps, _) = trajectory(seed);
        for (_, result) in &steps {
            let occupied = cells
                .iter()
                .filter(|c| result.next_state.is_true(&agent_at("a1", **c)))
                .count();
            assert_eq!(occupied, 1);
        }
    }
}

#[test]
fn latches_never_reset() {
    let latches = [
        WATER_CHECKED,
        WATER_DETECTED,
        LIFE_CHECKED,
        LIFE_CHECKED2,
        LIFE_DETECTED,
        PICTURE_TAKEN,
    ];
    for seed in SEEDS {
        let (initial, steps, _) = trajectory(seed);
        for (before, _, after) in transitions(&initial, &steps) {
            for latch in latches {
                for object in ["o1", "o2"] {
                    let fluent = object_fluent(latch, object);
                    assert!(!before.is_true(&fluent) || after.is_true(&fluent));
                }
            }
        }
    }
}

#[test]
fn damage_only_clears_through_repair_at_the_base() {
    let base = agent_at("a1", Cell::new(0, 0));
    for seed in SEEDS {
        let (initial, steps, _) = trajectory(seed);
        for (before, actions, after) in transitions(&initial, &steps) {
            for tool in ["camera", "l1", "w1"] {
                if before.is_true(&damaged(tool)) && !after.is_true(&damaged(tool)) {
                    assert!(actions.get(&repair("a1", tool)));
                    assert!(before.is_true(&base));
                }
            }
        }
    }
}

#[test]
fn a_seed_reproduces_its_trajectory() {
    for seed in SEEDS {
        let (_, a, _) = trajectory(seed);
        let (_, b, _) = trajectory(seed);
        assert_eq!(a, b);
    }
}

#[test]
fn total_reward_is_the_sum_of_step_rewards() {
    let (domain, store) = ReconInstance::default().load().unwrap();
    let mut sim = Simulator::with_seed(domain, store, 9);
    let mut policy = RandomBoolPolicy::from_seed(9).with_scope(ActionScope::AllDeclared);
    let mut recorder = Recorder::default();
    let settings = EpisodeSettings {
        horizon: 25,
        discount: 0.5,
    };
    let episode = run_episode(&mut sim, &mut policy, &settings, &mut recorder).unwrap();

    let total: f64 = recorder.steps.iter().map(|(_, r)| r.reward).sum();
    let mut weight = 1.0;
    let mut discounted = 0.0;
    for (_, result) in &recorder.steps {
        discounted += weight * result.reward;
        weight *= 0.5;
    }
    assert!((episode.total_reward - total).abs() < 1e-9);
    assert!((episode.discounted_reward - discounted).abs() < 1e-9);
    assert_eq!(
        episode.final_state,
        recorder.steps.last().map(|(_, r)| r.next_state.clone()).unwrap()
    );
}

use super::events::AttackType;
use super::lugs_hc::hill_climb_with_pins;
use super::manager::AttackManager;
use super::pins_sa::{anneal_pins, climb_pins};
use super::state::LocalState;
use super::{check_key, log_cycle, phase1_trials};
use crate::error::AttackResult;
use crate::machine::Key;
use crate::scorer::EvalType;

/// Known-plaintext search for one worker. Scores only the crib span.
pub fn solve(manager: &AttackManager, key: &mut Key, state: &mut LocalState) -> AttackResult<()> {
    check_key(manager, key, AttackType::KnownPlaintext)?;

    let config = manager.config();
    let cycles = config.effective_cycles();
    let trials = phase1_trials(config.phase1_trials, key.eval_len());

    let mut cycle = 0;
    while cycle < cycles && !manager.should_stop() {
        state.start_cycle(cycle);

        for trial in 0..trials {
            if manager.should_stop() {
                break;
            }
            key.randomize(&mut state.rng);
            let score = climb_pins(manager, key, EvalType::Crib);
            if state.offer(key, score) {
                manager.push_result(score, key);
            }
            manager.progress(
                state.task_id,
                AttackType::KnownPlaintext,
                1,
                trial + 1,
                trials,
            );
        }
        if manager.should_stop() {
            break;
        }

        state.restore(key);
        let mut score = state.best_score;
        loop {
            let mut improved = hill_climb_with_pins(manager, key, state, EvalType::Crib, &mut score);
            if !improved && !manager.should_stop() {
                let saved_pins = key.pins().clone();
                let candidate = anneal_pins(manager, key, state, EvalType::Crib);
                if candidate > score {
                    score = candidate;
                    improved = true;
                    state.offer(key, candidate);
                    manager.push_result(candidate, key);
                } else {
                    key.set_pins(&saved_pins);
                }
            }
            manager.progress(
                state.task_id,
                AttackType::KnownPlaintext,
                2,
                cycle + 1,
                cycles,
            );
            if !improved || manager.should_stop() {
                break;
            }
        }

        log_cycle(manager, key, state);
        cycle += 1;
    }
    Ok(())
}

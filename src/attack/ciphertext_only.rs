use super::events::AttackType;
use super::lugs_hc::{hill_climb, hill_climb_with_pins, moves_2, moves_3, moves_4};
use super::manager::AttackManager;
use super::pins_sa::anneal_pins;
use super::state::LocalState;
use super::{check_key, log_cycle, phase1_trials};
use crate::error::AttackResult;
use crate::machine::Key;
use crate::scorer::EvalType;

/// Ciphertext-only search for one worker.
///
/// Every cycle starts from the best of a batch of random lug settings, each
/// with annealed pins, then hill-climbs the lugs until no move helps. With
/// `search_slide` set, cycle `n` tries slide `n % 26`.
pub fn solve(manager: &AttackManager, key: &mut Key, state: &mut LocalState) -> AttackResult<()> {
    check_key(manager, key, AttackType::CiphertextOnly)?;

    let config = manager.config();
    let eval_type = config.eval_type;
    let cycles = config.effective_cycles();
    let trials = phase1_trials(config.phase1_trials, key.eval_len());
    let version = key.version();
    let moves_3 = moves_3(version);
    let moves_4 = moves_4(version);

    let mut cycle = 0;
    while cycle < cycles && !manager.should_stop() {
        state.start_cycle(cycle);
        if config.search_slide {
            key.set_slide((cycle % 26) as u8);
        }

        random_trials(manager, key, state, eval_type, trials);
        if manager.should_stop() {
            break;
        }

        state.restore(key);
        let mut score = state.best_score;
        loop {
            let mut improved = hill_climb_with_pins(manager, key, state, eval_type, &mut score);
            let moves_2 = moves_2(version, &mut state.rng);
            improved |= hill_climb(manager, key, state, eval_type, &moves_2, &mut score);
            if !improved {
                improved |= hill_climb(manager, key, state, eval_type, &moves_4, &mut score);
                improved |= hill_climb(manager, key, state, eval_type, &moves_3, &mut score);
            }
            manager.progress(
                state.task_id,
                AttackType::CiphertextOnly,
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

fn random_trials(
    manager: &AttackManager,
    key: &mut Key,
    state: &mut LocalState,
    eval_type: EvalType,
    trials: usize,
) {
    for trial in 0..trials {
        if manager.should_stop() {
            return;
        }
        key.randomize(&mut state.rng);
        let score = anneal_pins(manager, key, state, eval_type);
        if state.offer(key, score) {
            manager.push_result(score, key);
        }
        manager.progress(
            state.task_id,
            AttackType::CiphertextOnly,
            1,
            trial + 1,
            trials,
        );
    }
}

use super::manager::AttackManager;
use super::state::LocalState;
use crate::consts::WHEEL_SIZES;
use crate::machine::{pin_positions, Key};
use crate::scorer::EvalType;
use fastrand::Rng;

#[inline(always)]
fn accept(candidate: f64, current: f64, temperature: f64, rng: &mut Rng) -> bool {
    if candidate >= current {
        return true;
    }
    temperature > 0.0 && rng.f64() < ((candidate - current) / temperature).exp()
}

/// Simulated annealing over the pins, lugs fixed.
///
/// Temperature falls geometrically from `temp_max` to `temp_min` over
/// `sa_sweeps` sweeps. A sweep proposes every single-pin toggle, each
/// followed by a pair toggle with a random pin of opposite value on the
/// same wheel. The best pins seen are restored and polished with a greedy
/// descent. Returns the score of the pins left in `key`.
pub fn anneal_pins(
    manager: &AttackManager,
    key: &mut Key,
    state: &mut LocalState,
    eval_type: EvalType,
) -> f64 {
    let sa = &manager.config().sa;
    let sweeps = sa.sa_sweeps.max(1);
    let ratio = if sweeps > 1 {
        (sa.temp_min / sa.temp_max).powf(1.0 / (sweeps - 1) as f64)
    } else {
        1.0
    };

    let mut current = manager.evaluate(eval_type, key);
    let mut best = current;
    let mut best_pins = key.pins().clone();
    let mut temperature = sa.temp_max;

    for _ in 0..sweeps {
        if manager.should_stop() {
            break;
        }
        for (w, p) in pin_positions() {
            key.toggle_pin(w, p);
            let score = manager.evaluate(eval_type, key);
            if accept(score, current, temperature, &mut state.rng) {
                current = score;
                if current > best {
                    best = current;
                    best_pins.copy_from(key.pins());
                }
            } else {
                key.toggle_pin(w, p);
            }

            let q = state.rng.usize(0..WHEEL_SIZES[w]);
            if q == p || key.pin(w, p) == key.pin(w, q) {
                continue;
            }
            key.toggle_pin_pair(w, p, q);
            let score = manager.evaluate(eval_type, key);
            if accept(score, current, temperature, &mut state.rng) {
                current = score;
                if current > best {
                    best = current;
                    best_pins.copy_from(key.pins());
                }
            } else {
                key.toggle_pin_pair(w, p, q);
            }
        }
        temperature *= ratio;
    }

    key.set_pins(&best_pins);
    climb_pins(manager, key, eval_type)
}

/// Greedy descent: keep any single toggle that strictly improves, until a
/// full pass finds none or a stop is requested.
pub fn climb_pins(manager: &AttackManager, key: &mut Key, eval_type: EvalType) -> f64 {
    let mut current = manager.evaluate(eval_type, key);
    loop {
        let mut improved = false;
        for (w, p) in pin_positions() {
            key.toggle_pin(w, p);
            let score = manager.evaluate(eval_type, key);
            if score > current {
                current = score;
                improved = true;
            } else {
                key.toggle_pin(w, p);
            }
        }
        if !improved || manager.should_stop() {
            return current;
        }
    }
}

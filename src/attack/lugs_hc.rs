use super::manager::AttackManager;
use super::pins_sa::climb_pins;
use super::state::LocalState;
use crate::consts::{LUG_TYPES, TYPE_COUNT_SIZE};
use crate::machine::{Key, MachineVersion, TypeCount};
use crate::scorer::EvalType;
use fastrand::Rng;

/// Move one bar from the first type to the second, or back.
pub const CHANGES_2: [[i8; 2]; 2] = [[-1, 1], [1, -1]];

/// Two bars of one type become one bar each of two others, and the reverse.
pub const CHANGES_3: [[i8; 3]; 6] = [
    [2, -1, -1],
    [-1, 2, -1],
    [-1, -1, 2],
    [-2, 1, 1],
    [1, -2, 1],
    [1, 1, -2],
];

pub const CHANGES_4: [[i8; 4]; 6] = [
    [1, 1, -1, -1],
    [1, -1, 1, -1],
    [1, -1, -1, 1],
    [-1, 1, 1, -1],
    [-1, 1, -1, 1],
    [-1, -1, 1, 1],
];

/// A bar-count preserving change to the lug type counts.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TypeMove<const N: usize> {
    pub types: [usize; N],
    pub deltas: [i8; N],
}

impl<const N: usize> TypeMove<N> {
    /// Applies the move if every count stays non-negative and the machine
    /// version accepts the result. Returns the previous counts for `undo`.
    pub fn apply(&self, key: &mut Key) -> Option<TypeCount> {
        let previous = *key.type_count();
        let mut next = previous;
        for (&t, &d) in self.types.iter().zip(self.deltas.iter()) {
            let value = next[t] as i16 + d as i16;
            if value < 0 {
                return None;
            }
            next[t] = value as u8;
        }
        if key.set_type_count(&next) {
            Some(previous)
        } else {
            None
        }
    }
}

pub fn undo(key: &mut Key, previous: &TypeCount) {
    key.set_type_count(previous);
}

/// Type slots a move may touch. Empty bars only exist where the version
/// allows them.
pub fn movable_types(version: MachineVersion) -> Vec<usize> {
    let mut types = Vec::with_capacity(TYPE_COUNT_SIZE);
    if version.rules().allow_empty_bars {
        types.push(0);
    }
    types.extend_from_slice(&LUG_TYPES);
    types
}

pub fn moves_2(version: MachineVersion, rng: &mut Rng) -> Vec<TypeMove<2>> {
    let types = movable_types(version);
    let mut moves = Vec::with_capacity(types.len() * types.len());
    for (i, &a) in types.iter().enumerate() {
        for &b in &types[i + 1..] {
            for deltas in CHANGES_2 {
                moves.push(TypeMove {
                    types: [a, b],
                    deltas,
                });
            }
        }
    }
    rng.shuffle(&mut moves);
    moves
}

pub fn moves_3(version: MachineVersion) -> Vec<TypeMove<3>> {
    let types = movable_types(version);
    let mut moves = Vec::new();
    for (i, &a) in types.iter().enumerate() {
        for (j, &b) in types.iter().enumerate().skip(i + 1) {
            for &c in &types[j + 1..] {
                for deltas in CHANGES_3 {
                    moves.push(TypeMove {
                        types: [a, b, c],
                        deltas,
                    });
                }
            }
        }
    }
    moves
}

pub fn moves_4(version: MachineVersion) -> Vec<TypeMove<4>> {
    let types = movable_types(version);
    let mut moves = Vec::new();
    for (i, &a) in types.iter().enumerate() {
        for (j, &b) in types.iter().enumerate().skip(i + 1) {
            for (k, &c) in types.iter().enumerate().skip(j + 1) {
                for &d in &types[k + 1..] {
                    for deltas in CHANGES_4 {
                        moves.push(TypeMove {
                            types: [a, b, c, d],
                            deltas,
                        });
                    }
                }
            }
        }
    }
    moves
}

/// One pass over `moves`, scoring each with the pins as they are. Keeps
/// strict improvements and reports them; everything else is undone.
pub fn hill_climb<const N: usize>(
    manager: &AttackManager,
    key: &mut Key,
    state: &mut LocalState,
    eval_type: EvalType,
    moves: &[TypeMove<N>],
    score: &mut f64,
) -> bool {
    let mut improved = false;
    for mv in moves {
        if manager.should_stop() {
            break;
        }
        let Some(previous) = mv.apply(key) else {
            continue;
        };
        let candidate = manager.evaluate(eval_type, key);
        if candidate > *score {
            *score = candidate;
            improved = true;
            state.offer(key, candidate);
            manager.push_result(candidate, key);
        } else {
            undo(key, &previous);
        }
    }
    improved
}

/// Like [`hill_climb`] over two-type moves, but re-fits the pins with a
/// greedy descent after every move before judging it.
pub fn hill_climb_with_pins(
    manager: &AttackManager,
    key: &mut Key,
    state: &mut LocalState,
    eval_type: EvalType,
    score: &mut f64,
) -> bool {
    let moves = moves_2(key.version(), &mut state.rng);
    let mut improved = false;
    for mv in &moves {
        if manager.should_stop() {
            break;
        }
        let saved_pins = key.pins().clone();
        let Some(previous) = mv.apply(key) else {
            continue;
        };
        let candidate = climb_pins(manager, key, eval_type);
        if candidate > *score {
            *score = candidate;
            improved = true;
            state.offer(key, candidate);
            manager.push_result(candidate, key);
        } else {
            undo(key, &previous);
            key.set_pins(&saved_pins);
        }
    }
    improved
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::machine::lugs::bar_total;

    #[test]
    fn moves_preserve_bar_count() {
        let mut rng = Rng::with_seed(3);
        let mut key = Key::new(MachineVersion::Swedish);
        key.randomize(&mut rng);
        let before = bar_total(key.type_count());

        let mut applied = 0;
        for mv in moves_2(MachineVersion::Swedish, &mut rng).iter().take(50) {
            if let Some(prev) = mv.apply(&mut key) {
                assert_eq!(bar_total(key.type_count()), before);
                undo(&mut key, &prev);
                assert_eq!(key.type_count(), &prev);
                applied += 1;
            }
        }
        assert!(applied > 0);
    }

    #[test]
    fn move_counts() {
        assert_eq!(moves_3(MachineVersion::Restricted).len(), 1330 * 6);
        assert_eq!(moves_4(MachineVersion::Restricted).len(), 5985 * 6);
    }
}

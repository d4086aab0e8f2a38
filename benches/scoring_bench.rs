use criterion::{criterion_group, criterion_main, Criterion};
use m209_analyzer::machine::{symbols_to_text, text_to_symbols, Key, MachineVersion};
use m209_analyzer::scorer::builtin::ENGLISH_SAMPLE;
use m209_analyzer::scorer::{EvalType, Language, Scorer};
use std::hint::black_box;

fn setup_key(len: usize) -> Key {
    let mut rng = fastrand::Rng::with_seed(1);
    let mut key = Key::new(MachineVersion::Restricted);
    key.randomize(&mut rng);
    let plain: Vec<u8> = text_to_symbols(ENGLISH_SAMPLE).into_iter().take(len).collect();
    let cipher = key.encrypt(&plain);
    key.set_ciphertext(&symbols_to_text(&cipher))
        .expect("Failed to set ciphertext");
    key.set_crib(&symbols_to_text(&plain[..len / 4]))
        .expect("Failed to set crib");
    key.randomize(&mut rng);
    key
}

fn criterion_benchmark(c: &mut Criterion) {
    let scorer = Scorer::load(Language::English, None).expect("Failed to load scorer");
    let mut key = setup_key(1500);
    let decryption = key.full_decryption();
    let crib: Vec<Option<u8>> = key.crib().map(|c| c.to_vec()).unwrap_or_default();

    for eval_type in [EvalType::Mono, EvalType::Bigram, EvalType::Ic] {
        c.bench_function(&format!("evaluate {} (1500 letters)", eval_type), |b| {
            b.iter(|| scorer.evaluate(eval_type, black_box(&decryption), None))
        });
    }

    c.bench_function("evaluate crib (375 letters)", |b| {
        b.iter(|| {
            scorer.evaluate(
                EvalType::Crib,
                black_box(&decryption[..crib.len()]),
                Some(crib.as_slice()),
            )
        })
    });

    c.bench_function("toggle_pin over crib span (375 letters)", |b| {
        b.iter(|| {
            key.toggle_pin(black_box(2), black_box(7));
            black_box(key.decryption().len())
        })
    });
}

criterion_group!(benches, criterion_benchmark);
criterion_main!(benches);

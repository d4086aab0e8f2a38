use super::loader::RawGrams;
use crate::consts::ALPHABET_SIZE;
use crate::machine::text_to_symbols;

/// Sample English prose bundled with the crate. Feeds the built-in bigram
/// table and simulation runs.
pub const ENGLISH_SAMPLE: &str = include_str!("../../data/sample_english.txt");

/// English letter frequencies in percent, A first.
const ENGLISH_MONOGRAMS: [f64; ALPHABET_SIZE] = [
    8.167, 1.492, 2.782, 4.253, 12.702, 2.228, 2.015, 6.094, 6.966, 0.153, 0.772, 4.025, 2.406,
    6.749, 7.507, 1.929, 0.095, 5.987, 6.327, 9.056, 2.758, 0.978, 2.360, 0.150, 1.974, 0.074,
];

pub fn english() -> RawGrams {
    let mut grams = RawGrams {
        mono: ENGLISH_MONOGRAMS,
        ..RawGrams::default()
    };
    let symbols = text_to_symbols(ENGLISH_SAMPLE);
    for pair in symbols.windows(2) {
        grams.bigram[pair[0] as usize * ALPHABET_SIZE + pair[1] as usize] += 1.0;
    }
    grams
}

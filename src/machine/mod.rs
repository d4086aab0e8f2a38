pub mod lugs;
pub mod pins;
pub mod version;

pub use lugs::{Lugs, TypeCount};
pub use pins::Pins;
pub use version::{MachineVersion, OverlapRules};

use crate::consts::{ALPHABET_SIZE, WHEELS, WHEEL_SIZES};
use crate::error::{AttackError, AttackResult};
use fastrand::Rng;
use std::fmt;
use std::sync::Arc;

/// Letters only, uppercased, as symbol indices 0..=25.
pub fn text_to_symbols(text: &str) -> Vec<u8> {
    text.chars()
        .filter(|c| c.is_ascii_alphabetic())
        .map(|c| c.to_ascii_uppercase() as u8 - b'A')
        .collect()
}

pub fn symbols_to_text(symbols: &[u8]) -> String {
    symbols.iter().map(|&s| (b'A' + s) as char).collect()
}

/// Parses a crib aligned with the ciphertext. Letters are known plaintext,
/// `?`, `_`, `.` and `*` mark unknown positions, whitespace is ignored.
pub fn parse_crib(text: &str) -> AttackResult<Vec<Option<u8>>> {
    let mut crib = Vec::with_capacity(text.len());
    for c in text.chars() {
        match c {
            c if c.is_ascii_alphabetic() => crib.push(Some(c.to_ascii_uppercase() as u8 - b'A')),
            '?' | '_' | '.' | '*' => crib.push(None),
            c if c.is_whitespace() => {}
            other => {
                return Err(AttackError::Input(format!(
                    "Unexpected character '{}' in crib",
                    other
                )))
            }
        }
    }
    Ok(crib)
}

/// Beaufort step shared by encryption and decryption.
#[inline(always)]
fn transform(symbol: u8, slide: u8, displacement: u8) -> u8 {
    ((25 + ALPHABET_SIZE + slide as usize + displacement as usize - symbol as usize)
        % ALPHABET_SIZE) as u8
}

/// Immutable copy of the machine settings, stored in the best list and
/// handed to listeners.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct KeySnapshot {
    pub version: MachineVersion,
    pub pins: Pins,
    pub lugs: Lugs,
    pub slide: u8,
}

impl KeySnapshot {
    pub fn decrypt(&self, cipher: &[u8]) -> Vec<u8> {
        cipher
            .iter()
            .enumerate()
            .map(|(pos, &c)| {
                let d = self.lugs.displacement(self.pins.engagement(pos));
                transform(c, self.slide, d)
            })
            .collect()
    }

    pub fn incorrect_pins(&self, other: &KeySnapshot) -> usize {
        self.pins.incorrect_pins(&other.pins)
    }

    pub fn incorrect_lugs(&self, other: &KeySnapshot) -> usize {
        self.lugs.incorrect_lugs(&other.lugs)
    }
}

impl fmt::Display for KeySnapshot {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "Lugs: {}", self.lugs.to_lug_string())?;
        for (w, pins) in self.pins.to_letter_strings().iter().enumerate() {
            writeln!(f, "Wheel {}: {}", w + 1, pins)?;
        }
        write!(f, "Slide: {}", self.slide)
    }
}

/// A candidate key bound to the ciphertext (and crib) it is scored against.
///
/// The decryption is cached. Pin toggles patch it in place, lug changes
/// invalidate it.
#[derive(Debug, Clone)]
pub struct Key {
    version: MachineVersion,
    pins: Pins,
    lugs: Lugs,
    slide: u8,
    cipher: Arc<[u8]>,
    crib: Option<Arc<[Option<u8>]>>,
    decryption: Vec<u8>,
    valid: bool,
    original: Option<Arc<KeySnapshot>>,
    original_score: Option<f64>,
}

impl Key {
    pub fn new(version: MachineVersion) -> Self {
        Self {
            version,
            pins: Pins::new(),
            lugs: Lugs::new(version),
            slide: 0,
            cipher: Arc::from(Vec::new()),
            crib: None,
            decryption: Vec::new(),
            valid: false,
            original: None,
            original_score: None,
        }
    }

    pub fn from_snapshot(snapshot: &KeySnapshot) -> Self {
        let mut key = Self::new(snapshot.version);
        key.pins = snapshot.pins.clone();
        key.lugs = snapshot.lugs.clone();
        key.slide = snapshot.slide;
        key
    }

    /// Builds a key from one lug string and six `0/1` pin strings.
    pub fn with_settings(
        version: MachineVersion,
        lugs: &str,
        pins: &[&str],
    ) -> AttackResult<Self> {
        let mut key = Self::new(version);
        key.lugs = Lugs::parse(version, lugs)?;
        key.pins = Pins::from_bit_strings(pins)?;
        Ok(key)
    }

    pub fn version(&self) -> MachineVersion {
        self.version
    }

    pub fn pins(&self) -> &Pins {
        &self.pins
    }

    pub fn lugs(&self) -> &Lugs {
        &self.lugs
    }

    pub fn slide(&self) -> u8 {
        self.slide
    }

    pub fn set_slide(&mut self, slide: u8) {
        self.slide = slide % ALPHABET_SIZE as u8;
        self.valid = false;
    }

    pub fn set_ciphertext(&mut self, text: &str) -> AttackResult<()> {
        let symbols = text_to_symbols(text);
        if symbols.is_empty() {
            return Err(AttackError::Setup(
                "Ciphertext contains no letters".to_string(),
            ));
        }
        self.set_cipher_symbols(Arc::from(symbols))
    }

    /// Shares an already parsed ciphertext. Workers use this so all keys
    /// point at one buffer.
    pub fn set_cipher_symbols(&mut self, cipher: Arc<[u8]>) -> AttackResult<()> {
        if cipher.is_empty() {
            return Err(AttackError::Setup("Ciphertext is empty".to_string()));
        }
        if let Some(crib) = &self.crib {
            if crib.len() > cipher.len() {
                return Err(AttackError::Setup(
                    "Crib is longer than the ciphertext".to_string(),
                ));
            }
        }
        self.cipher = cipher;
        self.valid = false;
        Ok(())
    }

    pub fn set_crib(&mut self, text: &str) -> AttackResult<()> {
        let crib = parse_crib(text)?;
        self.set_crib_symbols(Some(Arc::from(crib)))
    }

    pub fn set_crib_symbols(&mut self, crib: Option<Arc<[Option<u8>]>>) -> AttackResult<()> {
        if let Some(c) = &crib {
            if c.iter().all(|s| s.is_none()) {
                return Err(AttackError::Setup(
                    "Crib has no known letters".to_string(),
                ));
            }
            if !self.cipher.is_empty() && c.len() > self.cipher.len() {
                return Err(AttackError::Setup(format!(
                    "Crib length {} exceeds ciphertext length {}",
                    c.len(),
                    self.cipher.len()
                )));
            }
        }
        self.crib = crib;
        self.valid = false;
        Ok(())
    }

    pub fn ciphertext(&self) -> &[u8] {
        &self.cipher
    }

    pub fn crib(&self) -> Option<&[Option<u8>]> {
        self.crib.as_deref()
    }

    /// Number of positions the cached decryption covers: the crib span when
    /// a crib is set, the whole ciphertext otherwise.
    pub fn eval_len(&self) -> usize {
        match &self.crib {
            Some(c) => c.len(),
            None => self.cipher.len(),
        }
    }

    pub fn randomize(&mut self, rng: &mut Rng) {
        self.randomize_lugs(rng);
        self.randomize_pins(rng);
    }

    pub fn randomize_lugs(&mut self, rng: &mut Rng) {
        self.lugs.randomize(rng);
        self.valid = false;
    }

    pub fn randomize_pins(&mut self, rng: &mut Rng) {
        self.pins.randomize(rng);
        self.valid = false;
    }

    pub fn set_pins(&mut self, pins: &Pins) {
        self.pins.copy_from(pins);
        self.valid = false;
    }

    pub fn type_count(&self) -> &TypeCount {
        self.lugs.type_count()
    }

    pub fn set_type_count(&mut self, type_count: &TypeCount) -> bool {
        if self.lugs.set_type_count(type_count) {
            self.valid = false;
            true
        } else {
            false
        }
    }

    #[inline(always)]
    pub fn pin(&self, w: usize, p: usize) -> bool {
        self.pins.get(w, p)
    }

    /// Flips one pin and patches every cached position that pin drives.
    pub fn toggle_pin(&mut self, w: usize, p: usize) {
        self.pins.toggle(w, p);
        if !self.valid {
            return;
        }
        let len = self.decryption.len();
        let mut pos = p;
        while pos < len {
            let d = self.lugs.displacement(self.pins.engagement(pos));
            self.decryption[pos] = transform(self.cipher[pos], self.slide, d);
            pos += WHEEL_SIZES[w];
        }
    }

    pub fn toggle_pin_pair(&mut self, w: usize, p1: usize, p2: usize) {
        self.toggle_pin(w, p1);
        self.toggle_pin(w, p2);
    }

    /// Cached decryption over `eval_len` positions, with the crib if any.
    pub fn decryption_and_crib(&mut self) -> (&[u8], Option<&[Option<u8>]>) {
        if !self.valid {
            self.refresh();
        }
        (&self.decryption, self.crib.as_deref())
    }

    pub fn decryption(&mut self) -> &[u8] {
        self.decryption_and_crib().0
    }

    /// Decrypts the whole ciphertext, regardless of the crib span.
    pub fn full_decryption(&self) -> Vec<u8> {
        self.snapshot().decrypt(&self.cipher)
    }

    /// The machine is reciprocal, so encryption is the same walk.
    pub fn encrypt(&self, plain: &[u8]) -> Vec<u8> {
        self.snapshot().decrypt(plain)
    }

    pub fn snapshot(&self) -> KeySnapshot {
        KeySnapshot {
            version: self.version,
            pins: self.pins.clone(),
            lugs: self.lugs.clone(),
            slide: self.slide,
        }
    }

    pub fn set_original(&mut self, original: Arc<KeySnapshot>, score: f64) {
        self.original = Some(original);
        self.original_score = Some(score);
    }

    pub fn original(&self) -> Option<&KeySnapshot> {
        self.original.as_deref()
    }

    pub fn original_score(&self) -> Option<f64> {
        self.original_score
    }

    pub fn incorrect_pins(&self) -> Option<usize> {
        self.original
            .as_ref()
            .map(|o| self.pins.incorrect_pins(&o.pins))
    }

    pub fn incorrect_lugs(&self) -> Option<usize> {
        self.original
            .as_ref()
            .map(|o| self.lugs.incorrect_lugs(&o.lugs))
    }

    fn refresh(&mut self) {
        let len = self.eval_len().min(self.cipher.len());
        self.decryption.clear();
        self.decryption.reserve(len);
        for pos in 0..len {
            let d = self.lugs.displacement(self.pins.engagement(pos));
            self.decryption
                .push(transform(self.cipher[pos], self.slide, d));
        }
        self.valid = true;
    }
}

/// Every `(wheel, pin)` pair, wheel 1 first.
pub fn pin_positions() -> impl Iterator<Item = (usize, usize)> {
    (0..WHEELS).flat_map(|w| (0..WHEEL_SIZES[w]).map(move |p| (w, p)))
}

use m209_analyzer::consts::{BARS, WHEEL_SIZES};
use m209_analyzer::error::AttackError;
use m209_analyzer::machine::lugs::{bar_total, overlaps, type_index};
use m209_analyzer::machine::{
    parse_crib, symbols_to_text, text_to_symbols, Key, Lugs, MachineVersion, Pins,
};
use rstest::rstest;
use strum::IntoEnumIterator;

const LUGS: &str = "1-2 1-3 1-4 2-5 3-6 0-1 0-1 0-1 0-2 0-2 0-2 0-2 0-3 0-3 \
                    0-3 0-4 0-4 0-4 0-4 0-5 0-5 0-5 0-5 0-5 0-6 0-6 0-6";

fn pins_all(active: bool) -> Vec<String> {
    WHEEL_SIZES
        .iter()
        .map(|&n| if active { "1" } else { "0" }.repeat(n))
        .collect()
}

fn as_refs(v: &[String]) -> Vec<&str> {
    v.iter().map(String::as_str).collect()
}

#[test]
fn lug_string_round_trips_through_type_counts() {
    let lugs = Lugs::parse(MachineVersion::Restricted, LUGS).unwrap();
    assert_eq!(bar_total(lugs.type_count()), BARS);
    assert_eq!(overlaps(lugs.type_count()), 5);
    assert_eq!(lugs.type_count()[type_index(0, 5)], 5);

    let again = Lugs::parse(MachineVersion::Restricted, &lugs.to_lug_string()).unwrap();
    assert_eq!(again, lugs);
}

#[test]
fn displacement_counts_bars_against_active_wheels() {
    let lugs = Lugs::parse(MachineVersion::Restricted, LUGS).unwrap();
    assert_eq!(lugs.displacement(0), 0);
    // Every bar has a lug somewhere, so all wheels active moves all 27 bars.
    assert_eq!(lugs.displacement(0b111111), (BARS % 26) as u8);
    // Wheel 1 alone: three single lugs plus the 1-2, 1-3 and 1-4 overlaps.
    assert_eq!(lugs.displacement(0b000001), 6);
    // Wheels 1 and 2: the 1-2 bar counts once.
    assert_eq!(lugs.displacement(0b000011), 6 + 4 + 1);
}

#[rstest]
#[case("1-2 0-3", "bars")]
#[case(&format!("{} 7-1", LUGS.rsplit_once(' ').unwrap().0), "beyond")]
#[case(&format!("{} 2-2", LUGS.rsplit_once(' ').unwrap().0), "same wheel")]
#[case(&format!("{} 0-0", LUGS.rsplit_once(' ').unwrap().0), "Empty bar")]
#[case(&format!("{} x-1", LUGS.rsplit_once(' ').unwrap().0), "Malformed")]
fn bad_lug_strings_are_config_errors(#[case] lugs: &str, #[case] needle: &str) {
    match Lugs::parse(MachineVersion::Restricted, lugs) {
        Err(AttackError::Setup(msg)) => assert!(msg.contains(needle), "{}", msg),
        other => panic!("expected config error, got {:?}", other),
    }
}

#[test]
fn restricted_rejects_too_many_overlaps() {
    let lugs = Lugs::parse(MachineVersion::Restricted, LUGS).unwrap();
    let mut tc = *lugs.type_count();
    // Eight single-lug bars become overlaps, 13 in total.
    tc[type_index(0, 5)] -= 5;
    tc[type_index(0, 6)] -= 3;
    tc[type_index(5, 6)] += 4;
    tc[type_index(4, 6)] += 4;
    let mut target = lugs.clone();
    assert!(!target.set_type_count(&tc));
    assert_eq!(target, lugs);
}

#[rstest]
fn random_lugs_follow_version_rules(#[values(1u64, 2, 3, 4, 5)] seed: u64) {
    let mut rng = fastrand::Rng::with_seed(seed);
    for version in MachineVersion::iter() {
        let rules = version.rules();
        let lugs = Lugs::random(version, &mut rng);
        let tc = lugs.type_count();
        let ov = overlaps(tc);
        assert!(ov >= rules.min_overlap && ov <= rules.max_overlap, "{} {}", version, ov);
        if rules.allow_empty_bars {
            assert!(bar_total(tc) <= BARS);
        } else {
            assert_eq!(bar_total(tc), BARS);
            assert_eq!(tc[0], 0);
        }
    }
}

#[test]
fn incorrect_pins_ignores_wheel_inversion() {
    let ones = pins_all(true);
    let zeros = pins_all(false);
    let a = Pins::from_bit_strings(&as_refs(&ones)).unwrap();
    let b = Pins::from_bit_strings(&as_refs(&zeros)).unwrap();
    assert_eq!(a.incorrect_pins(&b), 0);

    let mut c = a.clone();
    c.toggle(0, 3);
    c.toggle(5, 0);
    assert_eq!(a.incorrect_pins(&c), 2);
}

#[test]
fn incorrect_lugs_counts_moved_bars() {
    let a = Lugs::parse(MachineVersion::Restricted, LUGS).unwrap();
    let moved = LUGS.replacen("0-6", "0-1", 1);
    let b = Lugs::parse(MachineVersion::Restricted, &moved).unwrap();
    assert_eq!(a.incorrect_lugs(&b), 1);
    assert_eq!(a.incorrect_lugs(&a), 0);
}

#[test]
fn encrypt_then_decrypt_recovers_plaintext() {
    let mut rng = fastrand::Rng::with_seed(11);
    let mut key = Key::new(MachineVersion::Restricted);
    key.randomize(&mut rng);

    let plain = text_to_symbols("attack at dawn along the northern ridge");
    let cipher = key.encrypt(&plain);
    key.set_ciphertext(&symbols_to_text(&cipher)).unwrap();
    assert_eq!(key.decryption(), plain.as_slice());
}

#[test]
fn crib_limits_the_cached_decryption() {
    let mut key = Key::with_settings(
        MachineVersion::Restricted,
        LUGS,
        &as_refs(&pins_all(true)),
    )
    .unwrap();
    key.set_ciphertext("ABCDEFGHIJKLMNOPQRST").unwrap();
    key.set_crib("THE??FOX").unwrap();
    assert_eq!(key.eval_len(), 8);

    let (dec, crib) = key.decryption_and_crib();
    assert_eq!(dec.len(), 8);
    assert_eq!(crib.unwrap()[3], None);
    assert_eq!(key.full_decryption().len(), 20);
}

#[test]
fn ciphertext_without_letters_is_rejected() {
    let mut key = Key::new(MachineVersion::Restricted);
    assert!(matches!(
        key.set_ciphertext("1234 -- !!"),
        Err(AttackError::Setup(_))
    ));
}

#[test]
fn crib_longer_than_ciphertext_is_rejected() {
    let mut key = Key::new(MachineVersion::Restricted);
    key.set_ciphertext("ABCDE").unwrap();
    assert!(matches!(key.set_crib("ABCDEFG"), Err(AttackError::Setup(_))));
}

#[test]
fn crib_parsing_marks_unknowns() {
    let crib = parse_crib("ab ?c_").unwrap();
    assert_eq!(crib, vec![Some(0), Some(1), None, Some(2), None]);
    match parse_crib("ab#") {
        Err(e @ AttackError::Input(_)) => {
            let message = e.to_string();
            assert!(message.starts_with("Invalid ciphertext or crib:"), "{}", message);
            assert!(message.contains('#'), "{}", message);
        }
        other => panic!("expected an input error, got {:?}", other),
    }
}

#[test]
fn snapshot_decrypts_like_the_key() {
    let mut rng = fastrand::Rng::with_seed(5);
    let mut key = Key::new(MachineVersion::Swedish);
    key.randomize(&mut rng);
    key.set_ciphertext("THEQUICKBROWNFOXJUMPSOVERTHELAZYDOG").unwrap();

    let snapshot = key.snapshot();
    assert_eq!(snapshot.decrypt(key.ciphertext()), key.decryption());
    let shown = snapshot.to_string();
    assert!(shown.starts_with("Lugs: "));
    assert!(shown.contains("Wheel 6: "));
}

#[test]
fn slide_shifts_every_letter() {
    let mut rng = fastrand::Rng::with_seed(9);
    let mut key = Key::new(MachineVersion::Restricted);
    key.randomize(&mut rng);
    key.set_ciphertext("MEETMEATTHEOLDMILL").unwrap();
    let base = key.decryption().to_vec();

    key.set_slide(29);
    assert_eq!(key.slide(), 3);
    let shifted = key.decryption().to_vec();
    for (a, b) in base.iter().zip(&shifted) {
        assert_eq!((a + 3) % 26, *b);
    }
}

#[test]
fn original_key_measures_recovery() {
    let mut rng = fastrand::Rng::with_seed(13);
    let mut key = Key::new(MachineVersion::Restricted);
    key.randomize(&mut rng);
    assert_eq!(key.incorrect_pins(), None);

    let original = std::sync::Arc::new(key.snapshot());
    key.set_original(original.clone(), 812.5);
    assert_eq!(key.original(), Some(original.as_ref()));
    assert_eq!(key.original_score(), Some(812.5));
    assert_eq!(key.incorrect_pins(), Some(0));
    assert_eq!(key.incorrect_lugs(), Some(0));

    key.toggle_pin(1, 4);
    assert_eq!(key.incorrect_pins(), Some(1));
}

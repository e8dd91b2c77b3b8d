//! Frequency table
//!
//! Binds 24 computer keys to two octaves of equal-tempered pitches.
//!
//! Physical keyboard layout (QWERTY) - two octave range:
//! ```text
//!  Second octave slot (number + QWERTY rows):
//!     2   3       5   6   7        (black keys on number row)
//!     C#  D#      F#  G#  A#
//!    Q   W   E   R   T   Y   U     (white keys on QWERTY row)
//!    C   D   E   F   G   A   B
//!
//!  First octave slot (home + bottom rows):
//!     S   D       G   H   J        (black keys on home row)
//!     C#  D#      F#  G#  A#
//!    Z   X   C   V   B   N   M     (white keys on bottom row)
//!    C   D   E   F   G   A   B
//! ```

/// Octave that the base frequency belongs to (A4 = base)
pub const REFERENCE_OCTAVE: u8 = 4;

/// Number of keys bound by a table
pub const TABLE_SIZE: usize = 24;

/// One of the 12 semitone classes within an octave
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PitchClass {
    C,
    CSharp,
    D,
    DSharp,
    E,
    F,
    FSharp,
    G,
    GSharp,
    A,
    ASharp,
    B,
}

impl PitchClass {
    /// All pitch classes in ascending order from C
    pub const ALL: [PitchClass; 12] = [
        PitchClass::C,
        PitchClass::CSharp,
        PitchClass::D,
        PitchClass::DSharp,
        PitchClass::E,
        PitchClass::F,
        PitchClass::FSharp,
        PitchClass::G,
        PitchClass::GSharp,
        PitchClass::A,
        PitchClass::ASharp,
        PitchClass::B,
    ];

    /// Semitones above C (C = 0, B = 11)
    pub fn semitone(self) -> u8 {
        self as u8
    }

    /// Note letter, sharped where needed
    pub fn name(self) -> &'static str {
        match self {
            PitchClass::C => "C",
            PitchClass::CSharp => "C#",
            PitchClass::D => "D",
            PitchClass::DSharp => "D#",
            PitchClass::E => "E",
            PitchClass::F => "F",
            PitchClass::FSharp => "F#",
            PitchClass::G => "G",
            PitchClass::GSharp => "G#",
            PitchClass::A => "A",
            PitchClass::ASharp => "A#",
            PitchClass::B => "B",
        }
    }

    /// Whether this is a black key (sharp)
    pub fn is_sharp(self) -> bool {
        self.name().ends_with('#')
    }

    /// Equal-tempered ratio relative to A in the same octave
    ///
    /// A = 1.0, A# ~ 1.0595, B ~ 1.1225, C ~ 1.1892 / 2.
    pub fn ratio(self) -> f64 {
        let steps_from_a = self.semitone() as f64 - PitchClass::A.semitone() as f64;
        2f64.powf(steps_from_a / 12.0)
    }
}

/// Which of the two configured octaves a key plays in
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum OctaveSlot {
    /// Bottom and home rows
    First,
    /// QWERTY and number rows
    Second,
}

/// A key binding: computer key -> pitch class in one octave slot
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct KeyBinding {
    /// The character representing this key (lowercase)
    pub label: char,
    /// Octave role of this key
    pub octave_slot: OctaveSlot,
    /// Pitch class played by this key
    pub pitch_class: PitchClass,
}

impl KeyBinding {
    const fn new(label: char, octave_slot: OctaveSlot, pitch_class: PitchClass) -> Self {
        Self {
            label,
            octave_slot,
            pitch_class,
        }
    }

    pub fn note_name(&self) -> &'static str {
        self.pitch_class.name()
    }

    pub fn pitch_class_ratio(&self) -> f64 {
        self.pitch_class.ratio()
    }
}

/// The fixed key layout, ordered by pitch then octave slot
pub const KEY_BINDINGS: [KeyBinding; TABLE_SIZE] = [
    KeyBinding::new('z', OctaveSlot::First, PitchClass::C),
    KeyBinding::new('q', OctaveSlot::Second, PitchClass::C),
    KeyBinding::new('s', OctaveSlot::First, PitchClass::CSharp),
    KeyBinding::new('2', OctaveSlot::Second, PitchClass::CSharp),
    KeyBinding::new('x', OctaveSlot::First, PitchClass::D),
    KeyBinding::new('w', OctaveSlot::Second, PitchClass::D),
    KeyBinding::new('d', OctaveSlot::First, PitchClass::DSharp),
    KeyBinding::new('3', OctaveSlot::Second, PitchClass::DSharp),
    KeyBinding::new('c', OctaveSlot::First, PitchClass::E),
    KeyBinding::new('e', OctaveSlot::Second, PitchClass::E),
    KeyBinding::new('v', OctaveSlot::First, PitchClass::F),
    KeyBinding::new('r', OctaveSlot::Second, PitchClass::F),
    KeyBinding::new('g', OctaveSlot::First, PitchClass::FSharp),
    KeyBinding::new('5', OctaveSlot::Second, PitchClass::FSharp),
    KeyBinding::new('b', OctaveSlot::First, PitchClass::G),
    KeyBinding::new('t', OctaveSlot::Second, PitchClass::G),
    KeyBinding::new('h', OctaveSlot::First, PitchClass::GSharp),
    KeyBinding::new('6', OctaveSlot::Second, PitchClass::GSharp),
    KeyBinding::new('n', OctaveSlot::First, PitchClass::A),
    KeyBinding::new('y', OctaveSlot::Second, PitchClass::A),
    KeyBinding::new('j', OctaveSlot::First, PitchClass::ASharp),
    KeyBinding::new('7', OctaveSlot::Second, PitchClass::ASharp),
    KeyBinding::new('m', OctaveSlot::First, PitchClass::B),
    KeyBinding::new('u', OctaveSlot::Second, PitchClass::B),
];

/// A key binding resolved against a base frequency and octave pair
#[derive(Debug, Clone, PartialEq)]
pub struct ResolvedKey {
    pub binding: KeyBinding,
    /// Octave number the slot was assigned to
    pub octave: u8,
    /// Unrounded frequency in Hz
    pub frequency: f64,
    /// Note name with octave, e.g. "C4"
    pub note: String,
}

impl ResolvedKey {
    /// Frequency rounded to 3 decimal places, as reported in pitch events
    pub fn reported_frequency(&self) -> f64 {
        round_frequency(self.frequency)
    }
}

/// Immutable mapping from key label to resolved pitch
#[derive(Debug, Clone, PartialEq)]
pub struct FrequencyTable {
    base_frequency: f64,
    first_octave: u8,
    second_octave: u8,
    entries: Vec<ResolvedKey>,
}

impl FrequencyTable {
    /// Base frequency the table was built from
    pub fn base_frequency(&self) -> f64 {
        self.base_frequency
    }

    /// Octave numbers the table was built from
    pub fn octaves(&self) -> (u8, u8) {
        (self.first_octave, self.second_octave)
    }

    /// Get the resolved entry for a key label
    pub fn get(&self, label: char) -> Option<&ResolvedKey> {
        let label = label.to_ascii_lowercase();
        self.entries.iter().find(|e| e.binding.label == label)
    }

    /// Look up a raw key name as delivered by an event source
    ///
    /// Names that are not a single character ("Shift", "") never match.
    pub fn lookup(&self, key: &str) -> Option<&ResolvedKey> {
        let mut lowered = key.chars().flat_map(char::to_lowercase);
        match (lowered.next(), lowered.next()) {
            (Some(label), None) => self.get(label),
            _ => None,
        }
    }

    /// Check if a key label is bound
    pub fn is_bound(&self, label: char) -> bool {
        self.get(label).is_some()
    }

    /// Iterate entries in layout order
    pub fn iter(&self) -> impl Iterator<Item = &ResolvedKey> {
        self.entries.iter()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

/// Frequency multiplier for an octave relative to the reference octave
pub fn octave_scale(octave: u8) -> f64 {
    2f64.powi(octave as i32 - REFERENCE_OCTAVE as i32)
}

/// Round a frequency to 3 decimal places
pub fn round_frequency(frequency: f64) -> f64 {
    (frequency * 1000.0).round() / 1000.0
}

/// Build the frequency table
///
/// Inputs are expected to be validated already (see
/// [`Configuration`](crate::configuration::Configuration)).
pub fn build(base_frequency: f64, first_octave: u8, second_octave: u8) -> FrequencyTable {
    let entries = KEY_BINDINGS
        .iter()
        .map(|binding| {
            let octave = match binding.octave_slot {
                OctaveSlot::First => first_octave,
                OctaveSlot::Second => second_octave,
            };
            ResolvedKey {
                binding: *binding,
                octave,
                frequency: base_frequency * binding.pitch_class_ratio() * octave_scale(octave),
                note: format!("{}{}", binding.note_name(), octave),
            }
        })
        .collect();

    FrequencyTable {
        base_frequency,
        first_octave,
        second_octave,
        entries,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    #[test]
    fn test_table_has_24_unique_labels() {
        let inputs = [(440.0, 4, 5), (1.0, 1, 1), (20000.0, 7, 7), (261.5, 3, 6)];
        for (base, first, second) in inputs {
            let table = build(base, first, second);
            assert_eq!(table.len(), TABLE_SIZE);
            let labels: HashSet<char> = table.iter().map(|e| e.binding.label).collect();
            assert_eq!(labels.len(), TABLE_SIZE);
            assert!(table.iter().all(|e| e.frequency > 0.0 && e.frequency.is_finite()));
        }
    }

    #[test]
    fn test_labels_are_lowercase_or_digits() {
        for binding in KEY_BINDINGS {
            assert!(binding.label.is_ascii_lowercase() || binding.label.is_ascii_digit());
        }
    }

    #[test]
    fn test_each_slot_covers_all_pitch_classes() {
        for slot in [OctaveSlot::First, OctaveSlot::Second] {
            let classes: HashSet<PitchClass> = KEY_BINDINGS
                .iter()
                .filter(|b| b.octave_slot == slot)
                .map(|b| b.pitch_class)
                .collect();
            assert_eq!(classes.len(), 12);
        }
    }

    #[test]
    fn test_build_is_deterministic() {
        assert_eq!(build(432.0, 2, 6), build(432.0, 2, 6));
    }

    #[test]
    fn test_a440_reference_keys() {
        let table = build(440.0, 4, 5);

        let n = table.get('n').unwrap();
        assert_eq!(n.reported_frequency(), 440.0);
        assert_eq!(n.note, "A4");

        let y = table.get('y').unwrap();
        assert_eq!(y.reported_frequency(), 880.0);
        assert_eq!(y.note, "A5");
    }

    #[test]
    fn test_equal_tempered_frequencies() {
        let table = build(440.0, 4, 5);
        let expected = [
            ('z', 261.63, "C4"),
            ('s', 277.18, "C#4"),
            ('x', 293.66, "D4"),
            ('d', 311.13, "D#4"),
            ('c', 329.63, "E4"),
            ('v', 349.23, "F4"),
            ('g', 369.99, "F#4"),
            ('b', 392.00, "G4"),
            ('h', 415.30, "G#4"),
            ('j', 466.16, "A#4"),
            ('m', 493.88, "B4"),
            ('q', 523.25, "C5"),
            ('2', 554.37, "C#5"),
            ('w', 587.33, "D5"),
            ('3', 622.25, "D#5"),
            ('e', 659.26, "E5"),
            ('r', 698.46, "F5"),
            ('5', 739.99, "F#5"),
            ('t', 783.99, "G5"),
            ('6', 830.61, "G#5"),
            ('7', 932.33, "A#5"),
            ('u', 987.77, "B5"),
        ];

        for (label, frequency, note) in expected {
            let entry = table.get(label).unwrap();
            assert!(
                (entry.frequency - frequency).abs() < 0.01,
                "{label}: {} != {frequency}",
                entry.frequency
            );
            assert_eq!(entry.note, note);
        }
    }

    #[test]
    fn test_octaves_double_frequency() {
        let low = build(440.0, 2, 3);
        let high = build(440.0, 3, 4);
        for (a, b) in low.iter().zip(high.iter()) {
            assert!((b.frequency / a.frequency - 2.0).abs() < 1e-12);
        }
    }

    #[test]
    fn test_slots_follow_configured_octaves() {
        let table = build(440.0, 5, 4);
        assert_eq!(table.get('n').unwrap().note, "A5");
        assert_eq!(table.get('y').unwrap().note, "A4");
        assert_eq!(table.octaves(), (5, 4));
    }

    #[test]
    fn test_lookup_normalizes_case() {
        let table = build(440.0, 4, 5);
        assert_eq!(table.lookup("Z"), table.lookup("z"));
        assert!(table.lookup("z").is_some());
        assert!(table.lookup("k").is_none());
        assert!(table.lookup("Shift").is_none());
        assert!(table.lookup("").is_none());
    }

    #[test]
    fn test_pitch_class_ratios() {
        assert_eq!(PitchClass::A.ratio(), 1.0);
        assert!((PitchClass::ASharp.ratio() - 1.0595).abs() < 1e-4);
        assert!((PitchClass::B.ratio() - 1.1225).abs() < 1e-4);
        assert!((PitchClass::C.ratio() - 1.1892 / 2.0).abs() < 1e-4);
        assert!(PitchClass::FSharp.is_sharp());
        assert!(!PitchClass::E.is_sharp());
    }

    #[test]
    fn test_round_frequency() {
        assert_eq!(round_frequency(261.625565), 261.626);
        assert_eq!(round_frequency(440.0), 440.0);
    }
}

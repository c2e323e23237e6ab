//! Rotation-aware matching of observed codes against a dictionary.

use crate::dictionary::{Dictionary, DictionaryError};

/// A dictionary match for an observed marker code.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct TagMatch {
    /// Marker id in the dictionary.
    pub id: u32,
    /// Quarter turns such that `observed == rotate_code(dict_code, n, rotation)`.
    pub rotation: u8,
    /// Hamming distance after rotation.
    pub hamming: u8,
}

/// Matcher for a fixed dictionary.
///
/// Brute-force over ids and the four rotations; for survey-sized sets
/// (≤ 1000 symbols) this is fast enough and keeps memory small.
#[derive(Clone, Debug)]
pub struct Matcher {
    dict: Dictionary,
    max_hamming: u8,
    rotated: Vec<[u64; 4]>,
}

impl Matcher {
    /// Build a matcher for `dict`, accepting matches within `max_hamming`.
    pub fn new(dict: Dictionary, max_hamming: u8) -> Result<Self, DictionaryError> {
        dict.validate()?;

        let n = dict.marker_size;
        let rotated = dict
            .codes
            .iter()
            .map(|&code| {
                [
                    code,
                    rotate_code(code, n, 1),
                    rotate_code(code, n, 2),
                    rotate_code(code, n, 3),
                ]
            })
            .collect();

        Ok(Self {
            dict,
            max_hamming,
            rotated,
        })
    }

    #[inline]
    pub fn dictionary(&self) -> &Dictionary {
        &self.dict
    }

    #[inline]
    pub fn max_hamming(&self) -> u8 {
        self.max_hamming
    }

    /// Best match for `observed` within the Hamming budget, if any.
    pub fn best_match(&self, observed: u64) -> Option<TagMatch> {
        let mut best: Option<TagMatch> = None;

        for (id, rotations) in self.rotated.iter().enumerate() {
            for (rotation, &candidate) in rotations.iter().enumerate() {
                let hamming = (observed ^ candidate).count_ones() as u8;
                if hamming > self.max_hamming {
                    continue;
                }
                if best.map_or(true, |b| hamming < b.hamming) {
                    let m = TagMatch {
                        id: id as u32,
                        rotation: rotation as u8,
                        hamming,
                    };
                    if hamming == 0 {
                        return Some(m);
                    }
                    best = Some(m);
                }
            }
        }

        best
    }
}

/// Rotate a code stored in row-major bits (`idx = y * n + x`) by quarter turns.
pub fn rotate_code(code: u64, n: usize, quarter_turns: u8) -> u64 {
    let quarter_turns = quarter_turns & 3;
    if quarter_turns == 0 {
        return code;
    }

    let mut out = 0u64;
    for y in 0..n {
        for x in 0..n {
            let (sx, sy) = match quarter_turns {
                1 => (y, n - 1 - x),
                2 => (n - 1 - x, n - 1 - y),
                _ => (n - 1 - y, x),
            };
            let bit = (code >> (sy * n + sx)) & 1;
            out |= bit << (y * n + x);
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    fn small_dict() -> Dictionary {
        Dictionary {
            name: "test_3x3".into(),
            marker_size: 3,
            max_correction_bits: 1,
            // 3x3 inner grids, row-major, black = 1.
            codes: vec![0b000_010_111, 0b101_000_101],
        }
    }

    #[test]
    fn four_quarter_turns_are_identity() {
        let code = 0b110_001_010u64;
        let mut r = code;
        for _ in 0..4 {
            r = rotate_code(r, 3, 1);
        }
        assert_eq!(r, code);
    }

    #[test]
    fn matcher_recovers_id_and_rotation() {
        let dict = small_dict();
        // codes[0] is a T shape with no rotational symmetry.
        let observed = rotate_code(dict.codes[0], 3, 1);
        let matcher = Matcher::new(dict, 0).expect("valid dictionary");

        let m = matcher.best_match(observed).expect("match");
        assert_eq!(m.id, 0);
        assert_eq!(m.rotation, 1);
        assert_eq!(m.hamming, 0);
    }

    #[test]
    fn hamming_budget_bounds_matches() {
        let dict = small_dict();
        let near_miss = dict.codes[0] ^ 0b1; // one flipped bit
        let strict = Matcher::new(dict.clone(), 0).expect("valid dictionary");
        assert!(strict.best_match(near_miss).is_none());

        let tolerant = Matcher::new(dict, 1).expect("valid dictionary");
        let m = tolerant.best_match(near_miss).expect("match within budget");
        assert_eq!(m.id, 0);
        assert_eq!(m.hamming, 1);
    }
}

// SPDX-License-Identifier: Apache-2.0

//! Exhaustive input pattern enumeration.
//!
//! Pattern number `p` over `n` inputs assigns bit `n - 1 - i` of `p` to
//! primary input `i`, i.e. the first declared input is the most significant
//! bit, matching the bit-string rendering.

/// Largest input count whose pattern space still fits a `u64` index.
pub const MAX_PATTERN_INPUTS: usize = 63;

/// Number of patterns over `input_count` inputs, or `None` if it does not fit.
pub fn pattern_count(input_count: usize) -> Option<u64> {
    if input_count > MAX_PATTERN_INPUTS {
        None
    } else {
        Some(1u64 << input_count)
    }
}

/// Fills `bits` with the input assignment for pattern number `pattern`.
pub fn fill_pattern_bits(pattern: u64, bits: &mut [bool]) {
    let n = bits.len();
    for (i, bit) in bits.iter_mut().enumerate() {
        *bit = (pattern >> (n - 1 - i)) & 1 == 1;
    }
}

pub fn pattern_bits(pattern: u64, input_count: usize) -> Vec<bool> {
    let mut bits = vec![false; input_count];
    fill_pattern_bits(pattern, &mut bits);
    bits
}

/// Bit-string rendering, e.g. `0101` for pattern 5 over four inputs.
pub fn pattern_to_string(pattern: u64, input_count: usize) -> String {
    pattern_bits(pattern, input_count)
        .into_iter()
        .map(|b| if b { '1' } else { '0' })
        .collect()
}

/// All patterns in numeric order.
pub fn all_patterns(input_count: usize) -> impl Iterator<Item = Vec<bool>> {
    let count = pattern_count(input_count).unwrap_or(0);
    (0..count).map(move |p| pattern_bits(p, input_count))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_msb_first() {
        assert_eq!(pattern_bits(0b110, 3), vec![true, true, false]);
        assert_eq!(pattern_to_string(5, 4), "0101");
        assert_eq!(pattern_to_string(0, 0), "");
    }

    #[test]
    fn test_all_patterns_in_numeric_order() {
        let rendered: Vec<String> = all_patterns(2)
            .map(|bits| bits.iter().map(|b| if *b { '1' } else { '0' }).collect())
            .collect();
        assert_eq!(rendered, vec!["00", "01", "10", "11"]);
        assert_eq!(all_patterns(0).count(), 1);
    }

    #[test]
    fn test_pattern_count_bounds() {
        assert_eq!(pattern_count(5), Some(32));
        assert_eq!(pattern_count(63), Some(1u64 << 63));
        assert_eq!(pattern_count(64), None);
    }
}

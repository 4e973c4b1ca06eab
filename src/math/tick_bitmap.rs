use crate::error::{Error, PoolError};
use crate::journal::{Journaled, JournaledMap};
use crate::math::bit_math::{least_significant_bit, most_significant_bit};
use alloy_primitives::U256;

/// Word index and bit index of a compressed tick (`tick / tick_spacing`).
#[inline]
pub fn position(compressed: i32) -> (i16, u8) {
    ((compressed >> 8) as i16, compressed.rem_euclid(256) as u8)
}

/// Sparse bitmap of initialized ticks, one bit per usable tick,
/// 256 ticks per word. Zero words are never stored.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TickBitmap {
    words: JournaledMap<i16, U256>,
}

impl TickBitmap {
    pub fn new() -> Self {
        Self::default()
    }

    /// Raw word at `word_pos`, zero if no tick in it is initialized.
    #[inline]
    pub fn word(&self, word_pos: i16) -> U256 {
        self.words.get(&word_pos).copied().unwrap_or(U256::ZERO)
    }

    /// `true` when no tick is initialized.
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.words.is_empty()
    }

    /// Toggles the initialized bit of `tick`.
    ///
    /// # Errors
    ///
    /// - [`PoolError::InvalidRange`] if `tick` is not a multiple of `tick_spacing`.
    pub fn flip_tick(&mut self, tick: i32, tick_spacing: i32) -> Result<(), Error> {
        if tick % tick_spacing != 0 {
            return Err(PoolError::InvalidRange {
                tick_lower: tick,
                tick_upper: tick,
            }
            .into());
        }

        let (word_pos, bit_pos) = position(tick / tick_spacing);
        let word = self.word(word_pos) ^ (U256::ONE << bit_pos);
        if word.is_zero() {
            self.words.remove(&word_pos);
        } else {
            self.words.insert(word_pos, word);
        }
        Ok(())
    }

    /// Number of non‑zero words.
    #[inline]
    pub fn word_count(&self) -> usize {
        self.words.len()
    }

    /// Next initialized tick in the same word as `tick`, searching to the
    /// left (`lte`, inclusive) or to the right (exclusive).
    ///
    /// When no bit is set the word boundary is returned with `false`, so
    /// the swap loop advances at most one word per step.
    pub fn next_initialized_tick_within_one_word(
        &self,
        tick: i32,
        tick_spacing: i32,
        lte: bool,
    ) -> Result<(i32, bool), Error> {
        let compressed = tick.div_euclid(tick_spacing);

        if lte {
            let (word_pos, bit_pos) = position(compressed);
            // all bits at or right of bit_pos
            let mask = (U256::ONE << bit_pos) - U256::ONE + (U256::ONE << bit_pos);
            let masked = self.word(word_pos) & mask;

            let initialized = !masked.is_zero();
            let next = if initialized {
                let msb = most_significant_bit(masked)?;
                (compressed - (bit_pos - msb) as i32) * tick_spacing
            } else {
                (compressed - bit_pos as i32) * tick_spacing
            };
            Ok((next, initialized))
        } else {
            let (word_pos, bit_pos) = position(compressed + 1);
            // all bits at or left of bit_pos
            let mask = !((U256::ONE << bit_pos) - U256::ONE);
            let masked = self.word(word_pos) & mask;

            let initialized = !masked.is_zero();
            let next = if initialized {
                let lsb = least_significant_bit(masked)?;
                (compressed + 1 + (lsb - bit_pos) as i32) * tick_spacing
            } else {
                (compressed + 1 + (u8::MAX - bit_pos) as i32) * tick_spacing
            };
            Ok((next, initialized))
        }
    }
}

impl Journaled for TickBitmap {
    fn begin(&mut self) {
        self.words.begin();
    }

    fn commit(&mut self) {
        self.words.commit();
    }

    fn rollback(&mut self) {
        self.words.rollback();
    }
}

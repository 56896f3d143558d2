//! Resistance (load) setting of the bike, in tenths of a level.
//!
//! The physical knob goes from level 1.0 to 8.0, so the stored value is
//! always within `MIN_RESISTANCE_LEVEL10..=MAX_RESISTANCE_LEVEL10`.
//! Out-of-range inputs are clamped, never rejected.

pub const MIN_RESISTANCE_LEVEL10: u8 = 10;
pub const MAX_RESISTANCE_LEVEL10: u8 = 80;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ResistanceLevel(u8);

impl ResistanceLevel {
    /// Build a level, clamping into [10, 80].
    pub fn new(level10: u8) -> Self {
        Self(level10.clamp(MIN_RESISTANCE_LEVEL10, MAX_RESISTANCE_LEVEL10))
    }

    pub fn get(self) -> u8 {
        self.0
    }

    pub fn set(&mut self, level10: u8) {
        *self = Self::new(level10);
    }

    /// Move by whole levels (1 level = 10 tenths), e.g. from a +/- button.
    pub fn step(&mut self, levels: i8) {
        let next = self.0 as i16 + levels as i16 * 10;
        self.0 = next.clamp(MIN_RESISTANCE_LEVEL10 as i16, MAX_RESISTANCE_LEVEL10 as i16) as u8;
    }
}

impl Default for ResistanceLevel {
    fn default() -> Self {
        Self(MIN_RESISTANCE_LEVEL10)
    }
}

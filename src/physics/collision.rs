//! Contact directions and the 12-bit collision bitfield

use serde::{Deserialize, Serialize};

bitflags::bitflags! {
    /// Set of contact directions, stored as `left | right | up | down` in
    /// the low four bits.
    #[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
    #[serde(transparent)]
    pub struct Collision: u8 {
        const NONE = 0;
        const LEFT = 1 << 0;
        const RIGHT = 1 << 1;
        const UP = 1 << 2;
        const DOWN = 1 << 3;
        const HORIZONTAL = Self::LEFT.bits() | Self::RIGHT.bits();
        const VERTICAL = Self::UP.bits() | Self::DOWN.bits();
        const ALL = Self::HORIZONTAL.bits() | Self::VERTICAL.bits();
    }
}

impl Collision {
    /// Swap left with right and up with down
    #[must_use]
    pub const fn mirrored(self) -> Self {
        let bits = self.bits();
        let horizontal = ((bits & 0x1) << 1) | ((bits & 0x2) >> 1);
        let vertical = ((bits & 0x4) << 1) | ((bits & 0x8) >> 1);
        Self::from_bits_retain(horizontal | vertical)
    }
}

/// Three 4-bit collision groups packed as `instant << 8 | last << 4 | current`
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct HitFlags(u16);

impl HitFlags {
    const CURRENT_SHIFT: u16 = 0;
    const LAST_SHIFT: u16 = 4;
    const INSTANT_SHIFT: u16 = 8;

    #[must_use]
    pub const fn bits(self) -> u16 {
        self.0
    }

    const fn group(self, shift: u16) -> Collision {
        Collision::from_bits_truncate(((self.0 >> shift) & 0xf) as u8)
    }

    fn set_group(&mut self, shift: u16, value: Collision) {
        self.0 = (self.0 & !(0xf << shift)) | (u16::from(value.bits()) << shift);
    }

    /// Contacts registered during this frame
    #[must_use]
    pub const fn current(self) -> Collision {
        self.group(Self::CURRENT_SHIFT)
    }

    /// Contacts registered during the previous frame
    #[must_use]
    pub const fn last(self) -> Collision {
        self.group(Self::LAST_SHIFT)
    }

    /// Contacts set by the latest overlap check only
    #[must_use]
    pub const fn instant(self) -> Collision {
        self.group(Self::INSTANT_SHIFT)
    }

    pub(crate) fn set_instant(&mut self, value: Collision) {
        self.set_group(Self::INSTANT_SHIFT, value);
    }

    pub(crate) fn clear_instant(&mut self) {
        self.set_instant(Collision::NONE);
    }

    /// Merge the instant group into the current one
    pub(crate) fn commit_instant(&mut self) {
        let merged = self.current() | self.instant();
        self.set_group(Self::CURRENT_SHIFT, merged);
    }

    /// Start a new frame: current moves into last and is cleared
    pub(crate) fn advance(&mut self) {
        let current = self.current();
        self.set_group(Self::LAST_SHIFT, current);
        self.set_group(Self::CURRENT_SHIFT, Collision::NONE);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_mirrored() {
        assert_eq!(Collision::LEFT.mirrored(), Collision::RIGHT);
        assert_eq!(Collision::DOWN.mirrored(), Collision::UP);
        assert_eq!(
            (Collision::LEFT | Collision::UP).mirrored(),
            Collision::RIGHT | Collision::DOWN
        );
        assert_eq!(Collision::ALL.mirrored(), Collision::ALL);
    }

    #[test]
    fn test_groups_layout() {
        let mut flags = HitFlags::default();
        flags.set_instant(Collision::DOWN);
        flags.commit_instant();
        assert_eq!(flags.bits(), 0x808);

        flags.advance();
        assert_eq!(flags.current(), Collision::NONE);
        assert_eq!(flags.last(), Collision::DOWN);
        assert_eq!(flags.instant(), Collision::DOWN);
        assert_eq!(flags.bits(), 0x880);
    }

    #[test]
    fn test_debug_lists_directions() {
        assert_eq!(format!("{:?}", Collision::LEFT | Collision::DOWN), "Collision(LEFT | DOWN)");
    }

    #[test]
    fn test_serde_round_trip() {
        let json = serde_json::to_string(&(Collision::UP | Collision::RIGHT)).unwrap();
        assert_eq!(json, "\"RIGHT | UP\"");
        let back: Collision = serde_json::from_str(&json).unwrap();
        assert_eq!(back, Collision::UP | Collision::RIGHT);
    }
}

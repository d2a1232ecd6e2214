//! Display modes. Cycling them changes the label on screen and nothing else
//! for now.

/// One of the instrument's named modes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Mode {
    /// Hinge angle drives loudness.
    #[default]
    Bellows,
    #[allow(missing_docs)]
    PitchBend,
    #[allow(missing_docs)]
    Filter,
    #[allow(missing_docs)]
    Chaos,
}

impl Mode {
    /// All modes in cycling order.
    pub const ALL: [Mode; 4] = [Mode::Bellows, Mode::PitchBend, Mode::Filter, Mode::Chaos];

    /// The mode after this one, wrapping around.
    pub fn next(self) -> Self {
        let i = Self::ALL.iter().position(|&m| m == self).unwrap_or(0);
        Self::ALL[(i + 1) % Self::ALL.len()]
    }

    #[allow(missing_docs)]
    pub fn name(self) -> &'static str {
        match self {
            Mode::Bellows => "Bellows",
            Mode::PitchBend => "Pitch Bend",
            Mode::Filter => "Filter",
            Mode::Chaos => "Chaos",
        }
    }
}

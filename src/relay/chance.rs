//! Probability-gated narrative branches.
//!
//! Every roll takes the RNG as a parameter so callers (and tests) decide
//! where randomness comes from.

use rand::Rng;

/// Sinner grade for the Path to Nowhere theme.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SinnerRank {
    /// 狂, 10%
    Mania,
    /// 危, 30%
    Hazard,
    /// 普, 60%
    Ordinary,
}

impl SinnerRank {
    pub fn label(self) -> &'static str {
        match self {
            SinnerRank::Mania => "狂",
            SinnerRank::Hazard => "危",
            SinnerRank::Ordinary => "普",
        }
    }
}

pub fn roll_sinner_rank<R: Rng + ?Sized>(rng: &mut R) -> SinnerRank {
    let roll: f64 = rng.gen();
    if roll < 0.1 {
        SinnerRank::Mania
    } else if roll < 0.4 {
        SinnerRank::Hazard
    } else {
        SinnerRank::Ordinary
    }
}

/// Per-turn trigger probabilities for a theme.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct EncounterOdds {
    pub npc: f64,
    pub item: f64,
}

impl EncounterOdds {
    pub const NONE: EncounterOdds = EncounterOdds { npc: 0.0, item: 0.0 };

    pub fn roll<R: Rng + ?Sized>(&self, rng: &mut R) -> Encounters {
        Encounters {
            npc: rng.gen_bool(self.npc.clamp(0.0, 1.0)),
            item: rng.gen_bool(self.item.clamp(0.0, 1.0)),
        }
    }
}

/// Which optional beats the next turn should include.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Encounters {
    pub npc: bool,
    pub item: bool,
}

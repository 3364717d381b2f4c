use std::fmt;

use crate::error::{Error, Result};

// ---------------------------------------------------------------------------
// Stack configuration
// ---------------------------------------------------------------------------

/// Physical configuration of the launch stack. Only ever advances.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default)]
pub enum Stage {
    /// On the pad, main engines spooling up.
    #[default]
    Assembled,
    BoostersBurning,
    BoostersSeparated,
    TankSeparated,
}

impl Stage {
    /// Integer persisted as `CONFIGURATION` in scenario files.
    pub fn index(self) -> i64 {
        match self {
            Stage::Assembled => 0,
            Stage::BoostersBurning => 1,
            Stage::BoostersSeparated => 2,
            Stage::TankSeparated => 3,
        }
    }

    pub fn from_index(idx: i64) -> Result<Self> {
        match idx {
            0 => Ok(Stage::Assembled),
            1 => Ok(Stage::BoostersBurning),
            2 => Ok(Stage::BoostersSeparated),
            3 => Ok(Stage::TankSeparated),
            other => Err(Error::UnknownConfiguration(other)),
        }
    }

    /// Boosters still attached.
    pub fn has_boosters(self) -> bool {
        self <= Stage::BoostersBurning
    }

    /// External tank still attached.
    pub fn has_tank(self) -> bool {
        self <= Stage::BoostersSeparated
    }
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Stage::Assembled => "assembled",
            Stage::BoostersBurning => "boosters burning",
            Stage::BoostersSeparated => "boosters separated",
            Stage::TankSeparated => "tank separated",
        };
        f.write_str(s)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn index_round_trip() {
        for i in 0..4 {
            assert_eq!(Stage::from_index(i).unwrap().index(), i);
        }
        assert!(matches!(Stage::from_index(4), Err(Error::UnknownConfiguration(4))));
        assert!(Stage::from_index(-1).is_err());
    }

    #[test]
    fn attached_hardware_by_stage() {
        assert!(Stage::BoostersBurning.has_boosters());
        assert!(!Stage::BoostersSeparated.has_boosters());
        assert!(Stage::BoostersSeparated.has_tank());
        assert!(!Stage::TankSeparated.has_tank());
    }
}

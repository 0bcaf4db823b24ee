// Copyright 2021 Johannes Köster.
// Licensed under the GNU GPLv3 license (https://opensource.org/licenses/GPL-3.0)
// This file may not be copied, modified, or distributed
// except according to those terms.

//! Structural variants and their breakends.
//!
//! Every SV of a cluster, whether original or a ploidy replicate, lives in the
//! cluster arena and is addressed by its [`SvId`]. Breakends are addressed by
//! [`BreakendId`], i.e. the SV id plus the [`Ends`] side.

use std::convert::TryFrom;
use std::fmt;

use strum_macros::{Display, EnumString, IntoStaticStr};

use crate::errors::Error;

pub mod breakend;
pub mod sv;

pub use breakend::{AllelePloidy, Breakend};
pub use sv::StructuralVariant;

/// Index of an SV in the cluster arena.
#[derive(
    Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize, new,
)]
pub struct SvId(pub usize);

impl fmt::Display for SvId {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// The two ends of an SV, a linked pair or a chain.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum Ends {
    Start,
    End,
}

impl Ends {
    pub const BOTH: [Ends; 2] = [Ends::Start, Ends::End];

    pub fn other(self) -> Self {
        match self {
            Ends::Start => Ends::End,
            Ends::End => Ends::Start,
        }
    }

    pub fn index(self) -> usize {
        match self {
            Ends::Start => 0,
            Ends::End => 1,
        }
    }
}

/// A breakend, identified by its SV and side.
#[derive(
    Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize, new,
)]
pub struct BreakendId {
    pub sv: SvId,
    pub end: Ends,
}

impl BreakendId {
    /// The breakend at the opposite end of the same SV.
    pub fn other(&self) -> Self {
        BreakendId::new(self.sv, self.end.other())
    }
}

impl fmt::Display for BreakendId {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self.end {
            Ends::Start => write!(f, "{}s", self.sv),
            Ends::End => write!(f, "{}e", self.sv),
        }
    }
}

/// Orientation of a breakend.
///
/// `Forward` (+1) means the retained sequence lies left of the position, i.e. the
/// breakend faces upstream towards lower positions when linked. `Reverse` (-1)
/// retains the sequence to the right.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "i8", into = "i8")]
pub enum Orientation {
    Forward,
    Reverse,
}

impl Orientation {
    pub fn sign(self) -> i8 {
        match self {
            Orientation::Forward => 1,
            Orientation::Reverse => -1,
        }
    }
}

impl TryFrom<i8> for Orientation {
    type Error = Error;

    fn try_from(value: i8) -> Result<Self, Error> {
        match value {
            1 => Ok(Orientation::Forward),
            -1 => Ok(Orientation::Reverse),
            _ => Err(Error::InvalidOrientation { value }),
        }
    }
}

impl From<Orientation> for i8 {
    fn from(orientation: Orientation) -> i8 {
        orientation.sign()
    }
}

/// Chromosome arm.
#[derive(
    Clone,
    Copy,
    Debug,
    PartialEq,
    Eq,
    PartialOrd,
    Ord,
    Hash,
    Serialize,
    Deserialize,
    Display,
    EnumString,
)]
pub enum Arm {
    P,
    Q,
}

impl Default for Arm {
    fn default() -> Self {
        Arm::P
    }
}

#[derive(
    Clone,
    Copy,
    Debug,
    PartialEq,
    Eq,
    Hash,
    Serialize,
    Deserialize,
    Display,
    EnumString,
    IntoStaticStr,
)]
pub enum SvType {
    #[strum(serialize = "DEL")]
    DEL,
    #[strum(serialize = "DUP")]
    DUP,
    #[strum(serialize = "INV")]
    INV,
    #[strum(serialize = "BND")]
    BND,
    #[strum(serialize = "INS")]
    INS,
    #[strum(serialize = "SGL")]
    SGL,
}

impl SvType {
    /// Single-ended types only carry a start breakend.
    pub fn is_single_ended(self) -> bool {
        self == SvType::SGL
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::str::FromStr;

    #[test]
    fn test_orientation_from_sign() {
        assert_eq!(Orientation::try_from(1).unwrap(), Orientation::Forward);
        assert_eq!(Orientation::try_from(-1).unwrap(), Orientation::Reverse);
        assert_eq!(
            Orientation::try_from(0),
            Err(Error::InvalidOrientation { value: 0 })
        );
    }

    #[test]
    fn test_breakend_other() {
        let breakend = BreakendId::new(SvId(3), Ends::Start);
        assert_eq!(breakend.other(), BreakendId::new(SvId(3), Ends::End));
        assert_eq!(breakend.other().other(), breakend);
        assert_eq!(breakend.to_string(), "3s");
    }

    #[test]
    fn test_sv_type_strings() {
        assert_eq!(SvType::from_str("DUP").unwrap(), SvType::DUP);
        assert_eq!(SvType::SGL.to_string(), "SGL");
        assert!(SvType::SGL.is_single_ended());
        assert!(!SvType::BND.is_single_ended());
    }
}

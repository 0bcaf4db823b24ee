// Copyright 2021 Johannes Köster.
// Licensed under the GNU GPLv3 license (https://opensource.org/licenses/GPL-3.0)
// This file may not be copied, modified, or distributed
// except according to those terms.

use std::fmt;

use strum_macros::{Display, EnumIter, EnumString, IntoStaticStr};

use crate::variants::{Breakend, BreakendId, Ends};

/// Which rule produced a link.
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
    EnumIter,
    IntoStaticStr,
)]
pub enum LinkReason {
    #[strum(serialize = "ASMB")]
    #[serde(rename = "ASMB")]
    Assembly,
    #[strum(serialize = "ONLY")]
    #[serde(rename = "ONLY")]
    SingleOption,
    #[strum(serialize = "FOLDBACK")]
    #[serde(rename = "FOLDBACK")]
    Foldback,
    #[strum(serialize = "COMP_DUP")]
    #[serde(rename = "COMP_DUP")]
    ComplexDuplication,
    #[strum(serialize = "ADJAC")]
    #[serde(rename = "ADJAC")]
    AdjacentMatch,
    #[strum(serialize = "PL_MATCH")]
    #[serde(rename = "PL_MATCH")]
    PloidyMatch,
    #[strum(serialize = "PL_MAX")]
    #[serde(rename = "PL_MAX")]
    PloidyMax,
    #[strum(serialize = "SHORTEST")]
    #[serde(rename = "SHORTEST")]
    Shortest,
}

impl LinkReason {
    /// Rules that deliberately select pairs of links from both breakends of one SV.
    pub fn is_duplication(self) -> bool {
        matches!(self, LinkReason::Foldback | LinkReason::ComplexDuplication)
    }
}

/// Minimum permissible length of a templated insertion between two facing breakends.
pub trait MinTiLength {
    fn min_length(&self, lower: &Breakend, upper: &Breakend) -> u64;
}

impl<F> MinTiLength for F
where
    F: Fn(&Breakend, &Breakend) -> u64,
{
    fn min_length(&self, lower: &Breakend, upper: &Breakend) -> u64 {
        self(lower, upper)
    }
}

/// Base length, raised to the combined junction homology of both breakends.
#[derive(Debug, Clone, Copy, new)]
pub struct HomologyTiLength {
    base: u64,
}

impl MinTiLength for HomologyTiLength {
    fn min_length(&self, lower: &Breakend, upper: &Breakend) -> u64 {
        self.base.max(lower.homology_len() + upper.homology_len())
    }
}

/// A templated insertion joining two breakends.
///
/// Candidate pairs refer to original breakends and keep the lower breakend first.
/// Committed links refer to breakend instances and are oriented along their chain.
#[derive(Clone, Debug, PartialEq, Eq, CopyGetters)]
#[getset(get_copy = "pub")]
pub struct LinkedPair {
    first: BreakendId,
    second: BreakendId,
    length: u64,
    is_assembled: bool,
    link_reason: Option<LinkReason>,
    link_index: Option<usize>,
}

impl LinkedPair {
    pub fn candidate(lower: BreakendId, upper: BreakendId, length: u64) -> Self {
        LinkedPair {
            first: lower,
            second: upper,
            length,
            is_assembled: false,
            link_reason: None,
            link_index: None,
        }
    }

    pub fn assembled(lower: BreakendId, upper: BreakendId, length: u64) -> Self {
        LinkedPair {
            is_assembled: true,
            link_reason: Some(LinkReason::Assembly),
            ..LinkedPair::candidate(lower, upper, length)
        }
    }

    pub(crate) fn with_reason(mut self, reason: LinkReason) -> Self {
        if !self.is_assembled {
            self.link_reason = Some(reason);
        }
        self
    }

    /// Same link properties between other breakends, e.g. resolved instances.
    pub(crate) fn with_breakends(&self, first: BreakendId, second: BreakendId) -> Self {
        LinkedPair {
            first,
            second,
            ..self.clone()
        }
    }

    pub(crate) fn set_link_index(&mut self, index: usize) {
        self.link_index = Some(index);
    }

    pub fn breakend(&self, end: Ends) -> BreakendId {
        match end {
            Ends::Start => self.first,
            Ends::End => self.second,
        }
    }

    pub fn breakends(&self) -> [BreakendId; 2] {
        [self.first, self.second]
    }

    pub fn has_breakend(&self, breakend: BreakendId) -> bool {
        self.first == breakend || self.second == breakend
    }

    pub fn other_breakend(&self, breakend: BreakendId) -> Option<BreakendId> {
        if self.first == breakend {
            Some(self.second)
        } else if self.second == breakend {
            Some(self.first)
        } else {
            None
        }
    }

    /// Same two breakends, in any order.
    pub fn same_link(&self, other: &LinkedPair) -> bool {
        (self.first == other.first && self.second == other.second)
            || (self.first == other.second && self.second == other.first)
    }

    pub fn has_shared_breakend(&self, other: &LinkedPair) -> bool {
        self.has_breakend(other.first) || self.has_breakend(other.second)
    }

    /// The mirror image link: same SVs, joined through their other breakends.
    pub fn opposite_match(&self, other: &LinkedPair) -> bool {
        let mirrored = LinkedPair::candidate(self.first.other(), self.second.other(), 0);
        mirrored.same_link(other)
    }

    pub fn reversed(&self) -> Self {
        LinkedPair {
            first: self.second,
            second: self.first,
            ..self.clone()
        }
    }

    pub(crate) fn sort_key(&self) -> (u64, BreakendId, BreakendId) {
        (self.length, self.first, self.second)
    }
}

impl fmt::Display for LinkedPair {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{}-{}", self.first, self.second)?;
        if let Some(reason) = self.link_reason {
            write!(f, "({})", reason)?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::variants::{Orientation, SvId};

    fn bnd(sv: usize, end: Ends) -> BreakendId {
        BreakendId::new(SvId(sv), end)
    }

    #[test]
    fn test_opposite_match() {
        let pair = LinkedPair::candidate(bnd(0, Ends::End), bnd(1, Ends::Start), 100);
        let mirror = LinkedPair::candidate(bnd(1, Ends::End), bnd(0, Ends::Start), 300);
        let unrelated = LinkedPair::candidate(bnd(0, Ends::Start), bnd(1, Ends::Start), 300);

        assert!(pair.opposite_match(&mirror));
        assert!(mirror.opposite_match(&pair));
        assert!(!pair.opposite_match(&unrelated));
        assert!(pair.has_shared_breakend(&unrelated));
        assert!(!pair.has_shared_breakend(&mirror));
    }

    #[test]
    fn test_reason_and_orientation() {
        let pair = LinkedPair::candidate(bnd(0, Ends::End), bnd(1, Ends::Start), 100)
            .with_reason(LinkReason::SingleOption);
        assert_eq!(pair.to_string(), "0e-1s(ONLY)");

        let reversed = pair.reversed();
        assert!(reversed.same_link(&pair));
        assert_eq!(reversed.first(), bnd(1, Ends::Start));

        let assembled = LinkedPair::assembled(bnd(2, Ends::End), bnd(3, Ends::Start), 50)
            .with_reason(LinkReason::Shortest);
        assert_eq!(assembled.link_reason(), Some(LinkReason::Assembly));
    }

    #[test]
    fn test_homology_ti_length() {
        let lower = Breakend::new("1", 100, Orientation::Reverse).with_homology_len(20);
        let upper = Breakend::new("1", 200, Orientation::Forward).with_homology_len(25);
        assert_eq!(HomologyTiLength::new(30).min_length(&lower, &upper), 45);
        assert_eq!(HomologyTiLength::new(60).min_length(&lower, &upper), 60);

        let fixed = |_: &Breakend, _: &Breakend| 10u64;
        assert_eq!(fixed.min_length(&lower, &upper), 10);
    }
}

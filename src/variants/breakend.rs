// Copyright 2021 Johannes Köster.
// Licensed under the GNU GPLv3 license (https://opensource.org/licenses/GPL-3.0)
// This file may not be copied, modified, or distributed
// except according to those terms.

use bio_types::genome::{self, AbstractLocus};

use crate::variants::{Arm, Orientation};

/// Allele ploidies of the copy number segment that follows a breakend.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize, new)]
pub struct AllelePloidy {
    pub major: f64,
    pub minor: f64,
}

impl AllelePloidy {
    pub fn copy_number(&self) -> f64 {
        self.major + self.minor
    }
}

/// One end of a structural variant.
#[derive(Clone, Debug, PartialEq, Getters, CopyGetters)]
pub struct Breakend {
    #[getset(get = "pub")]
    locus: genome::Locus,
    #[getset(get_copy = "pub")]
    orientation: Orientation,
    #[getset(get_copy = "pub")]
    arm: Arm,
    /// Length of (inexact) homology at the junction.
    #[getset(get_copy = "pub")]
    homology_len: u64,
    #[getset(get_copy = "pub")]
    is_foldback: bool,
    #[getset(get_copy = "pub")]
    is_assembled_link: bool,
    #[getset(get_copy = "pub")]
    following_segment: Option<AllelePloidy>,
}

impl Breakend {
    pub fn new(chrom: &str, pos: u64, orientation: Orientation) -> Self {
        Breakend {
            locus: genome::Locus::new(chrom.to_owned(), pos),
            orientation,
            arm: Arm::default(),
            homology_len: 0,
            is_foldback: false,
            is_assembled_link: false,
            following_segment: None,
        }
    }

    pub fn with_arm(mut self, arm: Arm) -> Self {
        self.arm = arm;
        self
    }

    pub fn with_homology_len(mut self, homology_len: u64) -> Self {
        self.homology_len = homology_len;
        self
    }

    pub fn with_foldback(mut self, is_foldback: bool) -> Self {
        self.is_foldback = is_foldback;
        self
    }

    pub fn with_following_segment(mut self, segment: Option<AllelePloidy>) -> Self {
        self.following_segment = segment;
        self
    }

    pub(crate) fn set_assembled_link(&mut self) {
        self.is_assembled_link = true;
    }

    pub fn chrom(&self) -> &str {
        self.locus.contig()
    }

    pub fn pos(&self) -> u64 {
        self.locus.pos()
    }

    /// Distance to another breakend on the same chromosome.
    pub fn distance(&self, other: &Breakend) -> u64 {
        if self.pos() > other.pos() {
            self.pos() - other.pos()
        } else {
            other.pos() - self.pos()
        }
    }

    /// Whether this breakend and `upper` face each other, i.e. could enclose a templated insertion.
    pub fn faces(&self, upper: &Breakend) -> bool {
        self.chrom() == upper.chrom()
            && self.pos() <= upper.pos()
            && self.orientation == Orientation::Reverse
            && upper.orientation == Orientation::Forward
    }
}

// Copyright 2021 Johannes Köster.
// Licensed under the GNU GPLv3 license (https://opensource.org/licenses/GPL-3.0)
// This file may not be copied, modified, or distributed
// except according to those terms.

//! Allele ploidy context of the segments between the breakends of a cluster.
//!
//! For every indexed breakend the segment following it is described by its allele
//! ploidies (from the copy number stage) and by the ploidy the cluster itself
//! contributes to it. The latter is obtained by walking along each chromosome arm:
//! a reverse facing breakend opens a segment copy, a forward facing one closes it.
//! The walk is shifted such that the lowest segment of an arm (including the one
//! before its first breakend) has cluster ploidy zero.

use std::collections::BTreeMap;

use itertools::Itertools;
use ordered_float::NotNan;

use crate::chaining::BreakendIndex;
use crate::cluster::Cluster;
use crate::variants::{AllelePloidy, Arm};

#[derive(Debug, Clone, Copy, PartialEq, CopyGetters)]
#[getset(get_copy = "pub")]
pub struct SegmentLimits {
    allele_ploidy: Option<AllelePloidy>,
    cluster_ploidy: f64,
    is_valid: bool,
}

impl SegmentLimits {
    /// Allele ploidy available to a templated insertion crossing this segment.
    pub fn cluster_allele_ploidy(&self) -> Option<f64> {
        self.allele_ploidy.map(|ploidy| ploidy.major.max(0.0))
    }
}

#[derive(Debug, Clone, Default)]
pub struct PloidyLimits {
    chr_segments: BTreeMap<String, Vec<SegmentLimits>>,
    arm_bounds: BTreeMap<(String, Arm), (f64, f64)>,
    valid_segment_perc: f64,
}

impl PloidyLimits {
    pub fn new(cluster: &Cluster, index: &BreakendIndex, tolerance: f64) -> Self {
        let mut chr_segments = BTreeMap::new();
        let mut arm_bounds = BTreeMap::new();
        let mut segment_count = 0;
        let mut valid_count = 0;

        for (chrom, breakends) in index.chromosomes() {
            let mut segments = Vec::with_capacity(breakends.len());

            for (arm, group) in &breakends
                .iter()
                .filter_map(|id| cluster.breakend(*id).map(|breakend| (*id, breakend)))
                .group_by(|(_, breakend)| breakend.arm())
            {
                let mut walk = Vec::new();
                let mut cluster_ploidy = 0.0;
                for (id, breakend) in group {
                    let ploidy = cluster.sv(id.sv).ploidy();
                    cluster_ploidy -= f64::from(breakend.orientation().sign()) * ploidy;
                    walk.push((cluster_ploidy, breakend.following_segment()));
                }
                let lowest = walk
                    .iter()
                    .map(|(ploidy, _)| *ploidy)
                    .fold(0.0_f64, f64::min);

                let arm_segments = walk
                    .into_iter()
                    .map(|(ploidy, allele_ploidy)| {
                        let cluster_ploidy = ploidy - lowest;
                        SegmentLimits {
                            allele_ploidy,
                            cluster_ploidy,
                            is_valid: is_valid_segment(allele_ploidy, cluster_ploidy, tolerance),
                        }
                    })
                    .collect_vec();

                let bounds = arm_segments
                    .iter()
                    .filter_map(|segment| NotNan::new(segment.cluster_ploidy).ok())
                    .minmax()
                    .into_option()
                    .map_or((0.0, 0.0), |(min, max)| (min.into_inner(), max.into_inner()));
                arm_bounds.insert((chrom.to_owned(), arm), bounds);

                segment_count += arm_segments.len();
                valid_count += arm_segments.iter().filter(|s| s.is_valid).count();
                segments.extend(arm_segments);
            }

            chr_segments.insert(chrom.to_owned(), segments);
        }

        let valid_segment_perc = if segment_count > 0 {
            valid_count as f64 / segment_count as f64 * 100.0
        } else {
            0.0
        };

        PloidyLimits {
            chr_segments,
            arm_bounds,
            valid_segment_perc,
        }
    }

    /// Segment following the breakend at the given index of the chromosome.
    pub fn segment(&self, chrom: &str, index: usize) -> Option<&SegmentLimits> {
        self.chr_segments
            .get(chrom)
            .and_then(|segments| segments.get(index))
    }

    /// Whether a templated insertion may extend across the segment following the given
    /// breakend. Segments without valid data never block.
    pub fn allows_link_across(&self, chrom: &str, index: usize, min_allele_ploidy: f64) -> bool {
        match self.segment(chrom, index) {
            Some(segment) if segment.is_valid => segment
                .cluster_allele_ploidy()
                .map_or(true, |ploidy| ploidy >= min_allele_ploidy),
            _ => true,
        }
    }

    /// Lowest and highest cluster ploidy along the given arm.
    pub fn arm_bounds(&self, chrom: &str, arm: Arm) -> Option<(f64, f64)> {
        self.arm_bounds.get(&(chrom.to_owned(), arm)).copied()
    }

    /// Highest ploidy the cluster contributes to any segment.
    pub fn max_cluster_ploidy(&self) -> f64 {
        self.arm_bounds
            .values()
            .map(|(_, max)| *max)
            .fold(0.0, f64::max)
    }

    /// Percentage of segments with usable allele ploidy data.
    pub fn valid_segment_perc(&self) -> f64 {
        self.valid_segment_perc
    }
}

fn is_valid_segment(
    allele_ploidy: Option<AllelePloidy>,
    cluster_ploidy: f64,
    tolerance: f64,
) -> bool {
    match allele_ploidy {
        Some(ploidy) => {
            ploidy.major.is_finite()
                && ploidy.minor.is_finite()
                && ploidy.minor >= -tolerance
                && ploidy.major >= ploidy.minor - tolerance
                && cluster_ploidy <= ploidy.copy_number() + tolerance
        }
        None => false,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::variants::{Breakend, Orientation, StructuralVariant, SvType};

    fn cluster() -> Cluster {
        let svs = vec![
            // templated insertion from 1000 to 2000 via two translocations
            StructuralVariant::new(
                "bnd1",
                SvType::BND,
                Breakend::new("1", 1000, Orientation::Reverse)
                    .with_following_segment(Some(AllelePloidy::new(2.0, 1.0))),
                Some(Breakend::new("2", 100, Orientation::Forward)),
                1.0,
            ),
            StructuralVariant::new(
                "bnd2",
                SvType::BND,
                Breakend::new("1", 2000, Orientation::Forward)
                    .with_following_segment(Some(AllelePloidy::new(1.0, 1.0))),
                Some(Breakend::new("2", 5000, Orientation::Reverse)),
                1.0,
            ),
            StructuralVariant::new(
                "del",
                SvType::DEL,
                Breakend::new("1", 3000, Orientation::Forward)
                    .with_following_segment(Some(AllelePloidy::new(0.1, 0.0))),
                Some(Breakend::new("1", 4000, Orientation::Reverse)),
                1.0,
            ),
        ];
        Cluster::new(1, svs, &[]).unwrap()
    }

    #[test]
    fn test_cluster_ploidy_walk() {
        let cluster = cluster();
        let index = BreakendIndex::new(&cluster);
        let limits = PloidyLimits::new(&cluster, &index, 0.5);

        // chr1: +1 after 1000, 0 after 2000, -1 after 3000 (deleted), 0 after 4000
        let ploidies = (0..4)
            .map(|i| limits.segment("1", i).unwrap().cluster_ploidy())
            .collect_vec();
        assert_eq!(ploidies, vec![2.0, 1.0, 0.0, 1.0]);
        assert_eq!(limits.arm_bounds("1", Arm::P), Some((0.0, 2.0)));
        assert_eq!(limits.max_cluster_ploidy(), 2.0);

        // three of six segments carry allele ploidy data
        approx::assert_relative_eq!(limits.valid_segment_perc(), 50.0);
    }

    #[test]
    fn test_allows_link_across() {
        let cluster = cluster();
        let index = BreakendIndex::new(&cluster);
        let limits = PloidyLimits::new(&cluster, &index, 0.5);

        assert!(limits.allows_link_across("1", 0, 0.5));
        // lost segment after the deletion start
        assert!(!limits.allows_link_across("1", 2, 0.5));
        // no data
        assert!(limits.allows_link_across("1", 3, 0.5));
        assert!(limits.allows_link_across("2", 0, 0.5));
    }
}

// Copyright 2021 Johannes Köster.
// Licensed under the GNU GPLv3 license (https://opensource.org/licenses/GPL-3.0)
// This file may not be copied, modified, or distributed
// except according to those terms.

use std::collections::BTreeMap;

use itertools::Itertools;
use vec_map::VecMap;

use crate::cluster::Cluster;
use crate::variants::{BreakendId, Ends};

/// Breakends of the original SVs of a cluster, ordered by position per chromosome.
#[derive(Debug, Clone, Default)]
pub struct BreakendIndex {
    chr_breakends: BTreeMap<String, Vec<BreakendId>>,
    // SV id -> position of its start and end breakend in the chromosome list
    positions: VecMap<[Option<usize>; 2]>,
}

impl BreakendIndex {
    pub fn new(cluster: &Cluster) -> Self {
        let mut chr_breakends: BTreeMap<String, Vec<BreakendId>> = BTreeMap::new();
        for sv in cluster.originals() {
            for &end in Ends::BOTH.iter() {
                if let Some(breakend) = sv.breakend(end) {
                    chr_breakends
                        .entry(breakend.chrom().to_owned())
                        .or_default()
                        .push(BreakendId::new(sv.id(), end));
                }
            }
        }

        let mut positions: VecMap<[Option<usize>; 2]> = VecMap::new();
        for breakends in chr_breakends.values_mut() {
            breakends.sort_by_key(|id| {
                let breakend = cluster.breakend(*id);
                (
                    breakend.map(|b| b.pos()),
                    breakend.map(|b| b.orientation()),
                    *id,
                )
            });
            for (i, id) in breakends.iter().enumerate() {
                positions.entry(id.sv.0).or_insert([None, None])[id.end.index()] = Some(i);
            }
        }

        BreakendIndex {
            chr_breakends,
            positions,
        }
    }

    pub fn chromosomes(&self) -> impl Iterator<Item = (&str, &[BreakendId])> {
        self.chr_breakends
            .iter()
            .map(|(chrom, breakends)| (chrom.as_str(), breakends.as_slice()))
    }

    pub fn breakends(&self, chrom: &str) -> &[BreakendId] {
        self.chr_breakends
            .get(chrom)
            .map_or(&[], |breakends| breakends.as_slice())
    }

    /// Position of the given original breakend in its chromosome list.
    pub fn index_of(&self, id: BreakendId) -> Option<usize> {
        self.positions
            .get(id.sv.0)
            .and_then(|positions| positions[id.end.index()])
    }

    pub fn len(&self) -> usize {
        self.chr_breakends.values().map(|breakends| breakends.len()).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub(crate) fn describe(&self, cluster: &Cluster) -> String {
        self.chr_breakends
            .iter()
            .map(|(chrom, breakends)| {
                format!(
                    "{}: {}",
                    chrom,
                    breakends
                        .iter()
                        .map(|id| cluster.breakend_name(*id))
                        .join(" ")
                )
            })
            .join("; ")
    }
}

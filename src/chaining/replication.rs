// Copyright 2021 Johannes Köster.
// Licensed under the GNU GPLv3 license (https://opensource.org/licenses/GPL-3.0)
// This file may not be copied, modified, or distributed
// except according to those terms.

use std::collections::{BTreeMap, VecDeque};

use crate::cluster::Cluster;
use crate::variants::{BreakendId, Ends, SvId};

/// Remaining replication of original SVs.
///
/// Only SVs with more than one outstanding replication are kept. Each consumed
/// breakend instance decrements its SV once.
#[derive(Debug, Clone, Default)]
pub struct ReplicationLedger {
    counts: BTreeMap<SvId, u32>,
}

impl ReplicationLedger {
    pub fn new(cluster: &Cluster) -> Self {
        ReplicationLedger {
            counts: cluster
                .originals()
                .filter(|sv| sv.replication_count() > 1)
                .map(|sv| (sv.id(), sv.replication_count()))
                .collect(),
        }
    }

    pub fn count(&self, sv: SvId) -> Option<u32> {
        self.counts.get(&sv).copied()
    }

    pub fn decrement(&mut self, sv: SvId) {
        if let Some(count) = self.counts.get_mut(&sv) {
            if *count <= 2 {
                self.counts.remove(&sv);
            } else {
                *count -= 1;
            }
        }
    }

    pub fn max_count(&self) -> Option<u32> {
        self.counts.values().max().copied()
    }

    /// SVs with exactly the given remaining count, in id order.
    pub fn svs_with_count(&self, count: u32) -> Vec<SvId> {
        self.counts
            .iter()
            .filter(|(_, c)| **c == count)
            .map(|(sv, _)| *sv)
            .collect()
    }

    pub fn evict(&mut self, svs: &[SvId]) {
        for sv in svs {
            self.counts.remove(sv);
        }
    }

    pub fn is_empty(&self) -> bool {
        self.counts.is_empty()
    }

    pub fn len(&self) -> usize {
        self.counts.len()
    }
}

/// Live (not yet linked) instances of each original breakend, in FIFO order.
#[derive(Debug, Clone, Default)]
pub struct UnlinkedBreakends {
    instances: BTreeMap<BreakendId, VecDeque<BreakendId>>,
}

impl UnlinkedBreakends {
    pub fn new(cluster: &Cluster) -> Self {
        let mut instances = BTreeMap::new();
        for sv in cluster.originals() {
            for &end in Ends::BOTH.iter() {
                if sv.is_null_breakend(end) {
                    continue;
                }
                let queue: VecDeque<_> = cluster
                    .instances(sv.id())
                    .iter()
                    .filter(|instance| !cluster.is_retired(**instance))
                    .map(|instance| BreakendId::new(*instance, end))
                    .collect();
                if !queue.is_empty() {
                    instances.insert(BreakendId::new(sv.id(), end), queue);
                }
            }
        }
        UnlinkedBreakends { instances }
    }

    pub fn live_count(&self, original: BreakendId) -> usize {
        self.instances.get(&original).map_or(0, |queue| queue.len())
    }

    pub fn is_live(&self, original: BreakendId) -> bool {
        self.live_count(original) > 0
    }

    pub fn is_live_instance(&self, original: BreakendId, instance: BreakendId) -> bool {
        self.instances
            .get(&original)
            .map_or(false, |queue| queue.contains(&instance))
    }

    /// Live instances of the given original breakend, oldest first.
    pub fn instances(&self, original: BreakendId) -> impl Iterator<Item = BreakendId> + '_ {
        self.instances
            .get(&original)
            .into_iter()
            .flat_map(|queue| queue.iter().copied())
    }

    pub fn first(&self, original: BreakendId) -> Option<BreakendId> {
        self.instances(original).next()
    }

    /// Remove a linked instance. Returns true if the original breakend is exhausted.
    pub fn consume(&mut self, original: BreakendId, instance: BreakendId) -> bool {
        if let Some(queue) = self.instances.get_mut(&original) {
            queue.retain(|live| *live != instance);
            if queue.is_empty() {
                self.instances.remove(&original);
                return true;
            }
            false
        } else {
            true
        }
    }

    /// Original breakends that still have live instances.
    pub fn originals(&self) -> impl Iterator<Item = BreakendId> + '_ {
        self.instances.keys().copied()
    }

    pub fn total(&self) -> usize {
        self.instances.values().map(|queue| queue.len()).sum()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::variants::{Breakend, Orientation, StructuralVariant, SvType};

    fn cluster() -> Cluster {
        let svs = vec![
            StructuralVariant::new(
                "dup",
                SvType::DUP,
                Breakend::new("1", 100, Orientation::Reverse),
                Some(Breakend::new("1", 900, Orientation::Forward)),
                3.0,
            ),
            StructuralVariant::new(
                "sgl",
                SvType::SGL,
                Breakend::new("1", 500, Orientation::Forward),
                None,
                1.0,
            ),
        ];
        Cluster::new(1, svs, &[]).unwrap()
    }

    #[test]
    fn test_ledger() {
        let cluster = cluster();
        let mut ledger = ReplicationLedger::new(&cluster);
        assert_eq!(ledger.count(SvId(0)), Some(3));
        assert_eq!(ledger.count(SvId(1)), None);
        assert_eq!(ledger.max_count(), Some(3));

        ledger.decrement(SvId(0));
        assert_eq!(ledger.count(SvId(0)), Some(2));
        ledger.decrement(SvId(0));
        assert!(ledger.is_empty());
        assert_eq!(ledger.max_count(), None);
    }

    #[test]
    fn test_unlinked_breakends() {
        let cluster = cluster();
        let mut unlinked = UnlinkedBreakends::new(&cluster);
        let dup_start = BreakendId::new(SvId(0), Ends::Start);
        let sgl_start = BreakendId::new(SvId(1), Ends::Start);

        assert_eq!(unlinked.live_count(dup_start), 3);
        assert_eq!(unlinked.live_count(sgl_start), 1);
        assert!(!unlinked.is_live(BreakendId::new(SvId(1), Ends::End)));
        assert_eq!(unlinked.total(), 7);

        // FIFO order: original first, then replicates
        assert_eq!(unlinked.first(dup_start), Some(dup_start));
        assert!(!unlinked.consume(dup_start, dup_start));
        assert_eq!(
            unlinked.first(dup_start),
            Some(BreakendId::new(SvId(2), Ends::Start))
        );
        assert!(unlinked.consume(sgl_start, sgl_start));
        assert!(!unlinked.is_live(sgl_start));
        assert_eq!(unlinked.total(), 5);
    }
}

// Copyright 2021 Johannes Köster.
// Licensed under the GNU GPLv3 license (https://opensource.org/licenses/GPL-3.0)
// This file may not be copied, modified, or distributed
// except according to those terms.

use crate::variants::{Breakend, BreakendId, Ends, SvId, SvType};

/// A structural variant of a cluster.
///
/// Replicated instances are full copies of their original, pointing back to it via
/// `replicated_from`.
#[derive(Clone, Debug, Getters, CopyGetters)]
pub struct StructuralVariant {
    #[getset(get_copy = "pub")]
    id: SvId,
    #[getset(get = "pub")]
    name: String,
    #[getset(get_copy = "pub")]
    sv_type: SvType,
    breakends: [Option<Breakend>; 2],
    #[getset(get_copy = "pub")]
    ploidy: f64,
    #[getset(get_copy = "pub")]
    ploidy_min: f64,
    #[getset(get_copy = "pub")]
    ploidy_max: f64,
    #[getset(get_copy = "pub")]
    replication_count: u32,
    #[getset(get_copy = "pub")]
    replicated_from: Option<SvId>,
}

impl StructuralVariant {
    pub fn new(
        name: &str,
        sv_type: SvType,
        start: Breakend,
        end: Option<Breakend>,
        ploidy: f64,
    ) -> Self {
        StructuralVariant {
            id: SvId(0),
            name: name.to_owned(),
            sv_type,
            breakends: [Some(start), end],
            ploidy,
            ploidy_min: ploidy,
            ploidy_max: ploidy,
            replication_count: (ploidy.round() as u32).max(1),
            replicated_from: None,
        }
    }

    pub fn with_ploidy_bounds(mut self, ploidy_min: f64, ploidy_max: f64) -> Self {
        self.ploidy_min = ploidy_min;
        self.ploidy_max = ploidy_max;
        self
    }

    pub fn with_replication_count(mut self, replication_count: u32) -> Self {
        self.replication_count = replication_count.max(1);
        self
    }

    pub fn breakend(&self, end: Ends) -> Option<&Breakend> {
        self.breakends[end.index()].as_ref()
    }

    pub(crate) fn breakend_mut(&mut self, end: Ends) -> Option<&mut Breakend> {
        self.breakends[end.index()].as_mut()
    }

    /// Ids of the existing breakends, start first.
    pub fn breakend_ids(&self) -> Vec<BreakendId> {
        Ends::BOTH
            .iter()
            .filter(|end| !self.is_null_breakend(**end))
            .map(|end| BreakendId::new(self.id, *end))
            .collect()
    }

    pub fn is_null_breakend(&self, end: Ends) -> bool {
        self.breakends[end.index()].is_none()
    }

    pub fn is_replicated(&self) -> bool {
        self.replicated_from.is_some()
    }

    /// The original SV this one was replicated from, or its own id.
    pub fn original(&self) -> SvId {
        self.replicated_from.unwrap_or(self.id)
    }

    /// Both breakends face the same way and at least one is flagged as foldback.
    pub fn is_foldback(&self) -> bool {
        match (self.breakend(Ends::Start), self.breakend(Ends::End)) {
            (Some(start), Some(end)) => {
                start.orientation() == end.orientation()
                    && (start.is_foldback() || end.is_foldback())
            }
            _ => false,
        }
    }

    pub(crate) fn set_id(&mut self, id: SvId) {
        self.id = id;
    }

    pub(crate) fn replicate(&self, id: SvId) -> Self {
        let mut replicate = self.clone();
        replicate.id = id;
        replicate.replicated_from = Some(self.original());
        replicate
    }
}

// Copyright 2021 Johannes Köster.
// Licensed under the GNU GPLv3 license (https://opensource.org/licenses/GPL-3.0)
// This file may not be copied, modified, or distributed
// except according to those terms.

//! Serializable description of a cluster, e.g. for handing over clusters between
//! processes or for writing testcases.
//!
//! ```yaml
//! id: 1
//! svs:
//!   - name: dup1
//!     type: DUP
//!     ploidy: 2.0
//!     start: { chrom: "1", pos: 1000, orientation: -1 }
//!     end: { chrom: "1", pos: 5000, orientation: 1 }
//! assembled_links:
//!   - [dup1:end, del1:start]
//! ```

use std::collections::HashMap;
use std::convert::TryFrom;

use anyhow::Result;

use crate::cluster::Cluster;
use crate::errors::Error;
use crate::variants::{
    AllelePloidy, Arm, Breakend, BreakendId, Ends, Orientation, StructuralVariant, SvId, SvType,
};

#[derive(Debug, Clone, Serialize, Deserialize, Getters)]
#[getset(get = "pub")]
pub struct ClusterDescription {
    id: usize,
    svs: Vec<SvDescription>,
    #[serde(default)]
    assembled_links: Vec<[String; 2]>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SvDescription {
    name: String,
    #[serde(rename = "type")]
    sv_type: SvType,
    ploidy: f64,
    #[serde(default)]
    ploidy_min: Option<f64>,
    #[serde(default)]
    ploidy_max: Option<f64>,
    // overrides the replication count derived from the ploidy
    #[serde(default)]
    replication: Option<u32>,
    start: BreakendDescription,
    #[serde(default)]
    end: Option<BreakendDescription>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BreakendDescription {
    chrom: String,
    pos: u64,
    orientation: Orientation,
    #[serde(default)]
    arm: Arm,
    #[serde(default)]
    homology: u64,
    #[serde(default)]
    foldback: bool,
    /// Allele ploidies of the segment following the breakend.
    #[serde(default)]
    segment: Option<AllelePloidy>,
}

impl BreakendDescription {
    fn to_breakend(&self) -> Breakend {
        Breakend::new(&self.chrom, self.pos, self.orientation)
            .with_arm(self.arm)
            .with_homology_len(self.homology)
            .with_foldback(self.foldback)
            .with_following_segment(self.segment)
    }
}

impl SvDescription {
    fn to_sv(&self) -> StructuralVariant {
        let mut sv = StructuralVariant::new(
            &self.name,
            self.sv_type,
            self.start.to_breakend(),
            self.end.as_ref().map(|end| end.to_breakend()),
            self.ploidy,
        )
        .with_ploidy_bounds(
            self.ploidy_min.unwrap_or(self.ploidy),
            self.ploidy_max.unwrap_or(self.ploidy),
        );
        if let Some(replication) = self.replication {
            sv = sv.with_replication_count(replication);
        }
        sv
    }
}

impl ClusterDescription {
    /// Build the cluster, resolving assembled links given as `NAME:start`/`NAME:end`.
    pub fn to_cluster(&self) -> Result<Cluster> {
        let mut names = HashMap::new();
        for (i, sv) in self.svs.iter().enumerate() {
            if names.insert(sv.name.as_str(), SvId(i)).is_some() {
                return Err(Error::DuplicateSvName {
                    name: sv.name.clone(),
                }
                .into());
            }
        }

        let assembled_links = self
            .assembled_links
            .iter()
            .map(|[first, second]| {
                Ok((
                    parse_breakend_ref(first, &names)?,
                    parse_breakend_ref(second, &names)?,
                ))
            })
            .collect::<Result<Vec<_>>>()?;

        Cluster::new(
            self.id,
            self.svs.iter().map(|sv| sv.to_sv()).collect(),
            &assembled_links,
        )
    }
}

impl<'a> TryFrom<&'a str> for ClusterDescription {
    type Error = serde_yaml::Error;

    fn try_from(yaml: &str) -> Result<Self, Self::Error> {
        serde_yaml::from_str(yaml)
    }
}

fn parse_breakend_ref(reference: &str, names: &HashMap<&str, SvId>) -> Result<BreakendId> {
    let invalid = || Error::InvalidBreakendRef {
        reference: reference.to_owned(),
    };
    let mut fields = reference.rsplitn(2, ':');
    let end = match fields.next() {
        Some("start") => Ends::Start,
        Some("end") => Ends::End,
        _ => return Err(invalid().into()),
    };
    let name = fields.next().ok_or_else(invalid)?;
    let sv = names.get(name).ok_or_else(|| Error::UnknownSv {
        name: name.to_owned(),
    })?;

    Ok(BreakendId::new(*sv, end))
}

#[cfg(test)]
mod tests {
    use super::*;

    const CLUSTER: &str = r#"
id: 7
svs:
  - name: del1
    type: DEL
    ploidy: 1.1
    start: { chrom: "1", pos: 1000, orientation: 1 }
    end: { chrom: "1", pos: 3000, orientation: -1, homology: 4 }
  - name: dup1
    type: DUP
    ploidy: 2.2
    ploidy_min: 1.8
    start: { chrom: "1", pos: 5000, orientation: -1, arm: Q }
    end: { chrom: "1", pos: 9000, orientation: 1, segment: { major: 2.0, minor: 1.0 } }
  - name: sgl1
    type: SGL
    ploidy: 1.0
    start: { chrom: "2", pos: 400, orientation: 1 }
assembled_links:
  - [del1:end, dup1:end]
"#;

    #[test]
    fn test_parse_cluster() {
        let description = ClusterDescription::try_from(CLUSTER).unwrap();
        let cluster = description.to_cluster().unwrap();

        assert_eq!(cluster.id(), 7);
        assert_eq!(cluster.unique_sv_count(), 3);
        // dup1 is replicated once
        assert_eq!(cluster.sv_count(), 4);

        let dup = cluster.sv(SvId(1));
        assert_eq!(dup.ploidy_min(), 1.8);
        assert_eq!(dup.ploidy_max(), 2.2);
        assert_eq!(dup.breakend(Ends::Start).unwrap().arm(), Arm::Q);
        assert_eq!(
            dup.breakend(Ends::End).unwrap().following_segment(),
            Some(AllelePloidy::new(2.0, 1.0))
        );
        assert!(cluster.sv(SvId(2)).is_null_breakend(Ends::End));

        let link = &cluster.assembled_links()[0];
        assert_eq!(link.first(), BreakendId::new(SvId(0), Ends::End));
        assert_eq!(link.second(), BreakendId::new(SvId(1), Ends::End));
        assert_eq!(link.length(), 6000);
    }

    #[test]
    fn test_unknown_sv_in_link() {
        let yaml = CLUSTER.replace("[del1:end, dup1:end]", "[del2:end, dup1:end]");
        let description = ClusterDescription::try_from(yaml.as_str()).unwrap();
        let err = description.to_cluster().unwrap_err();
        assert_eq!(
            err.downcast_ref::<Error>(),
            Some(&Error::UnknownSv {
                name: "del2".to_owned()
            })
        );
    }

    #[test]
    fn test_invalid_breakend_ref() {
        let yaml = CLUSTER.replace("[del1:end, dup1:end]", "[del1:middle, dup1:end]");
        let description = ClusterDescription::try_from(yaml.as_str()).unwrap();
        assert!(description.to_cluster().is_err());
    }
}

//! Keeps or drops whole top-level trees by seqid, strand and gene
//! predicates.

use hashbrown::HashSet;
use log::debug;
use serde::{
    Deserialize,
    Serialize,
};

use crate::data_structs::annotation::{
    Document,
    FeatureRecord,
    NodeId,
};
use crate::data_structs::Strand;
use crate::with_field_fn;

const GENE_TYPE: &str = "gene";

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct FilterOptions {
    /// Allowed seqids. Empty allows every seqid.
    pub seqids:          Vec<String>,
    pub max_gene_length: Option<u64>,
    pub min_gene_score:  Option<f64>,
    /// Number of genes kept, in input order.
    pub max_gene_num:    Option<usize>,
    pub strand:          Option<Strand>,
}

impl FilterOptions {
    pub fn new() -> Self { Self::default() }

    with_field_fn!(seqids, Vec<String>);

    with_field_fn!(max_gene_length, Option<u64>);

    with_field_fn!(min_gene_score, Option<f64>);

    with_field_fn!(max_gene_num, Option<usize>);

    with_field_fn!(strand, Option<Strand>);

    /// Reads options from JSON. An invalid strand symbol fails here, before
    /// any document is touched.
    pub fn from_json(text: &str) -> anyhow::Result<Self> {
        Ok(serde_json::from_str(text)?)
    }

    fn seqid_passes(
        &self,
        seqid: &str,
    ) -> bool {
        self.seqids.is_empty() || self.seqids.iter().any(|s| s == seqid)
    }

    fn gene_passes(
        &self,
        gene: &FeatureRecord,
    ) -> bool {
        if let Some(max) = self.max_gene_length {
            if gene.range().length() > max {
                return false;
            }
        }
        if let Some(min) = self.min_gene_score {
            match gene.score {
                Some(score) if score >= min => {},
                _ => return false,
            }
        }
        true
    }
}

/// Keeps every top-level tree accepted by the options. Trees are never
/// split: a tree is either kept with all descendants or dropped.
pub fn filter(
    doc: Document,
    options: &FilterOptions,
) -> Document {
    let used_before: HashSet<String> = doc
        .roots()
        .iter()
        .filter_map(|r| doc.node_seqid(*r))
        .map(|s| s.to_string())
        .collect();
    let total = doc.roots().len();

    let mut genes_kept = 0usize;
    let keep_root = |doc: &Document, root: NodeId| {
        let Some(record) = doc.root_record(root)
        else {
            return false;
        };
        if !options.seqid_passes(record.seqid()) {
            return false;
        }
        if options.strand.is_some_and(|strand| record.strand() != strand) {
            return false;
        }
        if record.feature_type.as_str() != GENE_TYPE {
            return true;
        }
        if !options.gene_passes(record) {
            return false;
        }
        if options.max_gene_num.is_some_and(|max| genes_kept >= max) {
            return false;
        }
        genes_kept += 1;
        true
    };
    let mut doc = doc.retain_roots(keep_root);

    let used_after: HashSet<String> = doc
        .roots()
        .iter()
        .filter_map(|r| doc.node_seqid(*r))
        .map(|s| s.to_string())
        .collect();
    doc.retain_regions(|region| {
        options.seqid_passes(region.seqid())
            && (used_after.contains(region.seqid().as_str())
                || !used_before.contains(region.seqid().as_str()))
    });
    doc.retain_sequences(|entry| options.seqid_passes(entry.seqid()));

    debug!(
        "Filter kept {} of {} top-level features",
        doc.roots().len(),
        total
    );
    doc
}

#[cfg(test)]
mod tests {
    use assert_approx_eq::assert_approx_eq;

    use super::*;
    use crate::io::gff::parse;

    const GENES: &str = "\
##sequence-region ctg1 1 20000
##sequence-region ctg2 1 20000
ctg1\t.\tgene\t1000\t9000\t0.5\t+\t.\tID=g1
ctg1\t.\tmRNA\t1000\t9000\t.\t+\t.\tID=m1;Parent=g1
ctg1\t.\tgene\t10000\t11000\t0.9\t-\t.\tID=g2
ctg2\t.\tgene\t100\t200\t.\t+\t.\tID=g3
ctg2\t.\tmatch\t300\t400\t.\t+\t.\tID=x1
";

    fn root_ids(doc: &Document) -> Vec<&str> {
        doc.roots()
            .iter()
            .filter_map(|r| doc.node(*r).id())
            .collect()
    }

    #[test]
    fn test_no_predicates_keep_everything() {
        let doc = filter(parse(GENES).unwrap(), &FilterOptions::new());
        assert_eq!(root_ids(&doc), vec!["g1", "g2", "g3", "x1"]);
        assert_eq!(doc.node_count(), 5);
    }

    #[test]
    fn test_seqid_drops_region_and_trees() {
        let options = FilterOptions::new().with_seqids(vec!["ctg2".into()]);
        let doc = filter(parse(GENES).unwrap(), &options);
        assert_eq!(root_ids(&doc), vec!["g3", "x1"]);
        assert!(doc.region("ctg1").is_none());
        assert!(doc.region("ctg2").is_some());
    }

    #[test]
    fn test_gene_predicates_only_touch_genes() {
        let options = FilterOptions::new().with_min_gene_score(Some(0.6));
        let doc = filter(parse(GENES).unwrap(), &options);
        // g1 scores below, g3 has no score
        assert_eq!(root_ids(&doc), vec!["g2", "x1"]);
        assert_eq!(doc.node_count(), 2);
    }

    #[test]
    fn test_gene_count_follows_input_order() {
        let options = FilterOptions::new()
            .with_strand(Some(Strand::Forward))
            .with_max_gene_num(Some(1));
        let doc = filter(parse(GENES).unwrap(), &options);
        assert_eq!(root_ids(&doc), vec!["g1", "x1"]);
    }

    #[test]
    fn test_from_json() {
        let options =
            FilterOptions::from_json(r#"{"seqids": ["ctg1"], "strand": "-", "min_gene_score": 0.6}"#)
                .unwrap();
        assert_eq!(options.strand, Some(Strand::Reverse));
        assert_approx_eq!(options.min_gene_score.unwrap(), 0.6);
        assert_eq!(options.max_gene_num, None);
        assert!(FilterOptions::from_json(r#"{"strand": "x"}"#).is_err());
    }
}

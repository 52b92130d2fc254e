use log::debug;

use crate::data_structs::annotation::{
    Document,
    FeatureRecord,
    NodeId,
};
use crate::data_structs::coords::Contig;

const EXON_TYPE: &str = "exon";
const INTRON_TYPE: &str = "intron";

/// Adds an `intron` child between every two consecutive `exon` children of
/// a node that are separated by a gap and lie on the same seqid and strand.
/// Each intron is placed right after the exon it follows; an identical
/// intron already present is not duplicated.
pub fn add_introns(mut doc: Document) -> Document {
    // (parent, exon the intron follows, intron record)
    let mut pending: Vec<(NodeId, NodeId, FeatureRecord)> = Vec::new();

    for (parent, node) in doc.nodes() {
        let mut previous: Option<(NodeId, &FeatureRecord)> = None;
        for child in node.children() {
            let current = doc.node(*child);
            let Some(exon) = current.record()
            else {
                continue;
            };
            if exon.feature_type.as_str() != EXON_TYPE || current.is_multi() {
                continue;
            }
            if let Some((prev_id, prev)) = previous {
                if prev.seqid() == exon.seqid()
                    && prev.strand() == exon.strand()
                    && prev.end() + 1 < exon.start()
                {
                    let contig = Contig::new(
                        exon.seqid().clone(),
                        prev.end() + 1,
                        exon.start() - 1,
                        exon.strand(),
                    );
                    let intron = FeatureRecord::new(contig, INTRON_TYPE)
                        .with_source(prev.source.clone());
                    let exists = node.children().iter().any(|c| {
                        doc.node(*c).record().is_some_and(|r| {
                            r.feature_type.as_str() == INTRON_TYPE
                                && r.range() == intron.range()
                                && r.strand() == intron.strand()
                        })
                    });
                    if !exists {
                        pending.push((parent, prev_id, intron));
                    }
                }
            }
            previous = Some((*child, exon));
        }
    }

    debug!("Adding {} introns", pending.len());
    for (parent, after, intron) in pending {
        let id = doc.add_record(intron);
        doc.insert_child_after(parent, after, id);
    }
    doc.compact()
}

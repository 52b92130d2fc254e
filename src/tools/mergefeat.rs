//! Coalesces abutting or overlapping siblings of the same type.

use hashbrown::HashMap;
use log::debug;

use crate::data_structs::annotation::{
    Document,
    NodeId,
};
use crate::data_structs::coords::Range;

/// For every parent, walks the children in order and folds a leaf child
/// into the previous sibling of the same type when their ranges touch or
/// overlap. The surviving sibling is extended to the joined range and loses
/// its score. Children are expected in ascending start order; a child that
/// starts before its predecessor is left alone.
pub fn merge_features(mut doc: Document) -> Document {
    let mut merges: Vec<(NodeId, NodeId, NodeId)> = Vec::new();

    for (parent, node) in doc.nodes() {
        // type -> (last sibling kept, its end after earlier merges)
        let mut previous: HashMap<&str, (NodeId, u64)> = HashMap::new();
        for child in node.children() {
            let current = doc.node(*child);
            let Some(record) = current.record()
            else {
                continue;
            };
            if current.is_multi() {
                continue;
            }
            let feature_type = record.feature_type.as_str();
            let mergeable = current.children().is_empty() && current.parents().len() == 1;

            if let Some((prev, prev_end)) = previous.get_mut(feature_type) {
                let prev_node = doc.node(*prev);
                let touches = prev_node.record().is_some_and(|p| {
                    let covered = Range::new(p.start(), *prev_end);
                    p.seqid() == record.seqid()
                        && p.start() <= record.start()
                        && (covered.overlaps(&record.range()) || covered.abuts(&record.range()))
                });
                if mergeable && !prev_node.is_multi() && touches {
                    merges.push((parent, *prev, *child));
                    *prev_end = (*prev_end).max(record.end());
                    continue;
                }
            }
            previous.insert(feature_type, (*child, record.end()));
        }
    }

    for (parent, survivor, absorbed) in merges.iter().copied() {
        let end = doc.node(absorbed).range().map(|r| r.end()).unwrap_or(0);
        for record in doc.node_mut(survivor).records_mut() {
            let joined = record.end().max(end);
            record.contig.set_end(joined);
            record.score = None;
        }
        doc.detach(parent, absorbed);
    }
    debug!("Merged {} features into their siblings", merges.len());
    doc.compact()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::io::gff::parse;

    fn children(doc: &Document) -> Vec<(String, u64, u64)> {
        let root = doc.roots()[0];
        doc.node(root)
            .children()
            .iter()
            .filter_map(|c| doc.node(*c).record())
            .map(|r| (r.feature_type.to_string(), r.start(), r.end()))
            .collect()
    }

    #[test]
    fn test_merges_abutting_and_overlapping() {
        let doc = parse(
            "ctg\t.\tmRNA\t1\t1000\t.\t+\t.\tID=m1\n\
             ctg\t.\tCDS\t1\t100\t0.5\t+\t0\tParent=m1\n\
             ctg\t.\tCDS\t101\t200\t.\t+\t0\tParent=m1\n\
             ctg\t.\texon\t150\t300\t.\t+\t.\tParent=m1\n\
             ctg\t.\tCDS\t180\t250\t.\t+\t0\tParent=m1\n\
             ctg\t.\tCDS\t400\t500\t.\t+\t0\tParent=m1\n",
        )
        .unwrap();
        let doc = merge_features(doc);
        assert_eq!(
            children(&doc),
            vec![
                ("CDS".to_string(), 1, 250),
                ("exon".to_string(), 150, 300),
                ("CDS".to_string(), 400, 500),
            ]
        );
        let first = doc.node(doc.node(doc.roots()[0]).children()[0]);
        assert_eq!(first.record().unwrap().score, None);
        assert_eq!(doc.node_count(), 4);
    }

    #[test]
    fn test_contained_sibling_is_absorbed() {
        let doc = parse(
            "ctg\t.\tmRNA\t1\t1000\t.\t+\t.\tID=m1\n\
             ctg\t.\texon\t1\t300\t.\t+\t.\tParent=m1\n\
             ctg\t.\texon\t50\t100\t.\t+\t.\tParent=m1\n\
             ctg\t.\texon\t301\t310\t.\t+\t.\tParent=m1\n",
        )
        .unwrap();
        let doc = merge_features(doc);
        assert_eq!(children(&doc), vec![("exon".to_string(), 1, 310)]);
    }

    #[test]
    fn test_keeps_gaps_and_nodes_with_children() {
        let text = "ctg\t.\tgene\t1\t1000\t.\t+\t.\tID=g1\n\
                    ctg\t.\tmRNA\t1\t100\t.\t+\t.\tID=m1;Parent=g1\n\
                    ctg\t.\tmRNA\t101\t200\t.\t+\t.\tID=m2;Parent=g1\n\
                    ctg\t.\texon\t101\t200\t.\t+\t.\tParent=m2\n\
                    ctg\t.\tmRNA\t300\t400\t.\t+\t.\tID=m3;Parent=g1\n";
        let doc = merge_features(parse(text).unwrap());
        assert_eq!(children(&doc).len(), 3);
        assert!(doc.structurally_eq(&parse(text).unwrap()));
    }
}

//! Merges sorted documents into one sorted document.

use std::cmp::Ordering;

use itertools::Itertools;
use log::{
    debug,
    warn,
};

use super::sort::{
    compare_keys,
    root_key,
};
use crate::data_structs::annotation::{
    Document,
    SequenceRegion,
};

/// Combines documents that are each sorted.
///
/// Regions sharing a seqid are consolidated to the union of their ranges.
/// Top-level features are merged by seqid and start, ties go to the earlier
/// document. Comments are collected in front of the first feature and for
/// duplicate FASTA entries the first one wins.
pub fn merge(docs: Vec<Document>) -> Document {
    let mut merged = Document::new();
    let mut per_document = Vec::with_capacity(docs.len());

    for doc in docs {
        for region in doc.regions() {
            let joined = match merged.region(region.seqid()) {
                Some(existing) => {
                    let range = existing.range().join(&region.range());
                    SequenceRegion::new(existing.seqid().clone(), range.start(), range.end())
                        .with_line(existing.line())
                },
                None => region.clone(),
            };
            merged.insert_region(joined);
        }
        for comment in doc.comments() {
            let mut comment = comment.clone();
            comment.set_anchor(0);
            merged.push_comment(comment);
        }
        for entry in doc.sequences() {
            if merged.sequence(entry.seqid()).is_some() {
                warn!(
                    "Sequence \"{}\" is defined in more than one document, keeping the first",
                    entry.seqid()
                );
                continue;
            }
            merged.insert_sequence(entry.clone());
        }
        for warning in doc.warnings() {
            merged.push_warning(warning.clone());
        }
        per_document.push(merged.append_nodes(doc));
    }

    let roots = per_document
        .into_iter()
        .enumerate()
        .map(|(k, roots)| {
            roots
                .into_iter()
                .map(|root| (root_key(&merged, root), k, root))
                .collect_vec()
        })
        .kmerge_by(|a, b| {
            match compare_keys(&a.0, &b.0) {
                Ordering::Equal => a.1 < b.1,
                ordering => ordering == Ordering::Less,
            }
        })
        .map(|(_, _, root)| root)
        .collect_vec();
    debug!("Merged {} top-level features", roots.len());
    merged.set_roots(roots);
    merged
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::io::gff::parse;

    #[test]
    fn test_merge_interleaves_roots() {
        let a = parse(
            "##sequence-region ctg1 1 500\n\
             ctg1\t.\tgene\t10\t20\t.\t+\t.\tID=a1\n\
             ctg1\t.\tgene\t300\t400\t.\t+\t.\tID=a2\n",
        )
        .unwrap();
        let b = parse(
            "##sequence-region ctg1 100 900\n\
             # from b\n\
             ctg1\t.\tgene\t10\t30\t.\t+\t.\tID=b1\n\
             ctg2\t.\tgene\t1\t5\t.\t+\t.\tID=b2\n",
        )
        .unwrap();

        let doc = merge(vec![a, b]);
        let ids: Vec<&str> = doc
            .roots()
            .iter()
            .filter_map(|r| doc.node(*r).id())
            .collect();
        assert_eq!(ids, vec!["a1", "b1", "a2", "b2"]);
        let region = doc.region("ctg1").unwrap();
        assert_eq!((region.start(), region.end()), (1, 900));
        assert_eq!(doc.comments()[0].anchor(), 0);
    }

    #[test]
    fn test_merge_keeps_graph_edges() {
        let a = parse(
            "ctg1\t.\tgene\t1\t100\t.\t+\t.\tID=g\n\
             ctg1\t.\tmRNA\t1\t100\t.\t+\t.\tID=m;Parent=g\n",
        )
        .unwrap();
        let b = parse("ctg1\t.\tgene\t50\t60\t.\t+\t.\tID=h\n").unwrap();
        let doc = merge(vec![a.clone(), b]);
        assert_eq!(doc.node_count(), 3);
        let first = doc.roots()[0];
        let child = doc.node(first).children()[0];
        assert_eq!(doc.node(child).id(), Some("m"));
        assert_eq!(doc.node(child).parents(), &[first]);
    }
}

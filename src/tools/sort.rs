use std::cmp::Ordering;

use arcstr::ArcStr;
use itertools::Itertools;
use log::debug;

use crate::data_structs::annotation::{
    Document,
    NodeId,
};
use crate::error::{
    Diagnostic,
    DiagnosticKind,
};

/// Sort key of a top-level node: seqid (byte order), then start.
pub(crate) fn root_key(
    doc: &Document,
    root: NodeId,
) -> (ArcStr, u64) {
    (
        doc.node_seqid(root).cloned().unwrap_or_default(),
        doc.node_range(root).map(|r| r.start()).unwrap_or_default(),
    )
}

pub(crate) fn compare_keys(
    a: &(ArcStr, u64),
    b: &(ArcStr, u64),
) -> Ordering {
    a.0.as_bytes()
        .cmp(b.0.as_bytes())
        .then(a.1.cmp(&b.1))
}

/// Orders top-level nodes by seqid and start. Ties keep their input order;
/// nodes below the top level are not reordered. Regions and sequences are
/// sorted by seqid and comments are moved in front of the first feature.
pub fn sort(mut doc: Document) -> Document {
    let roots = doc
        .roots()
        .iter()
        .map(|root| (root_key(&doc, *root), *root))
        .sorted_by(|a, b| compare_keys(&a.0, &b.0))
        .map(|(_, root)| root)
        .collect_vec();
    debug!("Sorted {} top-level features", roots.len());
    doc.set_roots(roots);
    doc.sort_regions();
    doc.sort_sequences();
    for comment in doc.comments_mut() {
        comment.set_anchor(0);
    }
    doc
}

/// Reports the first pair of top-level nodes that is out of order.
pub fn check_sorted(doc: &Document) -> Result<(), Diagnostic> {
    for (a, b) in doc.roots().iter().tuple_windows() {
        let (key_a, key_b) = (root_key(doc, *a), root_key(doc, *b));
        if compare_keys(&key_a, &key_b) == Ordering::Greater {
            let (line_a, line_b) = (
                doc.node_line(*a).unwrap_or_default(),
                doc.node_line(*b).unwrap_or_default(),
            );
            return Err(Diagnostic::new(
                DiagnosticKind::Range,
                Some(line_b),
                format!(
                    "the file is not sorted (example: line {} and {})",
                    line_a, line_b
                ),
            ));
        }
    }
    Ok(())
}

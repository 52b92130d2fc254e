use std::collections::VecDeque;

use arcstr::ArcStr;
use hashbrown::{
    HashMap,
    HashSet,
};
use indexmap::IndexMap;
use itertools::Itertools;
use serde::Serialize;

use super::FeatureRecord;
use crate::data_structs::coords::Range;
use crate::error::{
    on_line,
    Diagnostic,
    DiagnosticKind,
};

/// Index of a node in a [`Document`] arena.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
pub struct NodeId(usize);

impl NodeId {
    pub fn index(&self) -> usize { self.0 }
}

/// A feature made of one or more records sharing an ID.
///
/// A node without records is a pseudo-feature: it only groups top-level
/// nodes and is never written out itself.
#[derive(Debug, Clone, Default)]
pub struct FeatureNode {
    records:  Vec<FeatureRecord>,
    parents:  Vec<NodeId>,
    children: Vec<NodeId>,
}

impl FeatureNode {
    pub fn new(record: FeatureRecord) -> Self {
        Self {
            records:  vec![record],
            parents:  Vec::new(),
            children: Vec::new(),
        }
    }

    pub fn is_pseudo(&self) -> bool { self.records.is_empty() }

    /// True for a multi-feature, i.e. more than one location.
    pub fn is_multi(&self) -> bool { self.records.len() > 1 }

    pub fn records(&self) -> &[FeatureRecord] { &self.records }

    pub fn records_mut(&mut self) -> &mut [FeatureRecord] { &mut self.records }

    /// Appends another location to a multi-feature.
    pub fn push_record(
        &mut self,
        record: FeatureRecord,
    ) {
        self.records.push(record);
    }

    pub fn record(&self) -> Option<&FeatureRecord> { self.records.first() }

    pub fn parents(&self) -> &[NodeId] { &self.parents }

    pub fn children(&self) -> &[NodeId] { &self.children }

    pub fn id(&self) -> Option<&str> { self.record().and_then(FeatureRecord::id) }

    pub fn feature_type(&self) -> Option<&ArcStr> {
        self.record().map(|r| &r.feature_type)
    }

    pub fn seqid(&self) -> Option<&ArcStr> { self.record().map(FeatureRecord::seqid) }

    /// Union of the locations.
    pub fn range(&self) -> Option<Range> {
        self.records
            .iter()
            .map(FeatureRecord::range)
            .reduce(|a, b| a.join(&b))
    }

    pub fn first_line(&self) -> Option<usize> { self.record().and_then(|r| r.line) }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SequenceRegion {
    seqid: ArcStr,
    range: Range,
    line:  Option<usize>,
}

impl SequenceRegion {
    pub fn new<S: Into<ArcStr>>(
        seqid: S,
        start: u64,
        end: u64,
    ) -> Self {
        Self {
            seqid: seqid.into(),
            range: Range::new(start, end),
            line:  None,
        }
    }

    pub fn with_line(
        mut self,
        line: Option<usize>,
    ) -> Self {
        self.line = line;
        self
    }

    pub fn seqid(&self) -> &ArcStr { &self.seqid }

    pub fn range(&self) -> Range { self.range }

    pub fn start(&self) -> u64 { self.range.start() }

    pub fn end(&self) -> u64 { self.range.end() }

    pub fn line(&self) -> Option<usize> { self.line }

    pub fn set_range(
        &mut self,
        range: Range,
    ) {
        self.range = range;
    }

    pub fn check(&self) -> Option<Diagnostic> {
        if self.range.is_valid() {
            return None;
        }
        Some(Diagnostic::new(
            DiagnosticKind::Range,
            self.line,
            format!(
                "illegal region start {} for sequence region \"{}\"{} (larger than \
                 end {})",
                self.start(),
                self.seqid,
                on_line(self.line),
                self.end()
            ),
        ))
    }
}

/// A `#` line. `anchor` is the number of top-level nodes written before it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Comment {
    text:   String,
    anchor: usize,
    line:   Option<usize>,
}

impl Comment {
    pub fn new<S: Into<String>>(
        text: S,
        anchor: usize,
    ) -> Self {
        Self {
            text: text.into(),
            anchor,
            line: None,
        }
    }

    pub fn with_line(
        mut self,
        line: Option<usize>,
    ) -> Self {
        self.line = line;
        self
    }

    /// Text after the leading `#`.
    pub fn text(&self) -> &str { &self.text }

    pub fn anchor(&self) -> usize { self.anchor }

    pub fn line(&self) -> Option<usize> { self.line }

    pub(crate) fn set_anchor(
        &mut self,
        anchor: usize,
    ) {
        self.anchor = anchor;
    }
}

/// A sequence from the `##FASTA` section.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SequenceEntry {
    seqid:       ArcStr,
    description: String,
    sequence:    String,
    line:        Option<usize>,
}

impl SequenceEntry {
    /// `description` is the header line without `>`; the seqid is its first
    /// word.
    pub fn new<S: Into<String>>(description: S) -> Self {
        let description = description.into();
        let seqid = ArcStr::from(description.split_whitespace().next().unwrap_or(""));
        Self {
            seqid,
            description,
            sequence: String::new(),
            line: None,
        }
    }

    pub fn with_line(
        mut self,
        line: Option<usize>,
    ) -> Self {
        self.line = line;
        self
    }

    pub fn with_sequence<S: Into<String>>(
        mut self,
        sequence: S,
    ) -> Self {
        self.sequence = sequence.into();
        self
    }

    pub fn seqid(&self) -> &ArcStr { &self.seqid }

    pub fn description(&self) -> &str { &self.description }

    pub fn sequence(&self) -> &str { &self.sequence }

    pub fn line(&self) -> Option<usize> { self.line }

    pub fn push_residues(
        &mut self,
        residues: &str,
    ) {
        self.sequence.push_str(residues);
    }
}

/// A parsed GFF3 document: an arena of feature nodes plus the directives,
/// comments and sequences around them.
#[derive(Debug, Clone, Default)]
pub struct Document {
    nodes:     Vec<FeatureNode>,
    roots:     Vec<NodeId>,
    regions:   IndexMap<ArcStr, SequenceRegion>,
    comments:  Vec<Comment>,
    sequences: IndexMap<ArcStr, SequenceEntry>,
    warnings:  Vec<Diagnostic>,
}

impl Document {
    pub fn new() -> Self { Self::default() }

    /// True when there is nothing to write.
    pub fn is_empty(&self) -> bool {
        self.roots.is_empty()
            && self.regions.is_empty()
            && self.comments.is_empty()
            && self.sequences.is_empty()
    }

    pub fn node(
        &self,
        id: NodeId,
    ) -> &FeatureNode {
        &self.nodes[id.0]
    }

    pub fn node_mut(
        &mut self,
        id: NodeId,
    ) -> &mut FeatureNode {
        &mut self.nodes[id.0]
    }

    pub fn nodes(&self) -> impl Iterator<Item = (NodeId, &FeatureNode)> {
        self.nodes
            .iter()
            .enumerate()
            .map(|(i, node)| (NodeId(i), node))
    }

    pub fn node_count(&self) -> usize { self.nodes.len() }

    pub fn add_node(
        &mut self,
        node: FeatureNode,
    ) -> NodeId {
        self.nodes.push(node);
        NodeId(self.nodes.len() - 1)
    }

    pub fn add_record(
        &mut self,
        record: FeatureRecord,
    ) -> NodeId {
        self.add_node(FeatureNode::new(record))
    }

    /// Creates a pseudo-feature grouping `children`. The children keep an
    /// empty parent list.
    pub fn add_pseudo(
        &mut self,
        children: Vec<NodeId>,
    ) -> NodeId {
        self.add_node(FeatureNode {
            records: Vec::new(),
            parents: Vec::new(),
            children,
        })
    }

    /// Links `parent` and `child`. Returns false if the edge already exists.
    pub fn add_edge(
        &mut self,
        parent: NodeId,
        child: NodeId,
    ) -> bool {
        if self.nodes[parent.0].children.contains(&child) {
            return false;
        }
        self.nodes[parent.0].children.push(child);
        self.nodes[child.0].parents.push(parent);
        true
    }

    /// Unlinks `child` from `parent`. The child is dropped on the next
    /// [`Document::compact`] if nothing else reaches it.
    pub fn detach(
        &mut self,
        parent: NodeId,
        child: NodeId,
    ) {
        self.nodes[parent.0].children.retain(|c| *c != child);
        self.nodes[child.0].parents.retain(|p| *p != parent);
    }

    /// Inserts `child` into the child list of `parent` right after `after`.
    pub fn insert_child_after(
        &mut self,
        parent: NodeId,
        after: NodeId,
        child: NodeId,
    ) {
        let children = &mut self.nodes[parent.0].children;
        let position = children
            .iter()
            .position(|c| *c == after)
            .map(|p| p + 1)
            .unwrap_or(children.len());
        children.insert(position, child);
        self.nodes[child.0].parents.push(parent);
    }

    pub fn roots(&self) -> &[NodeId] { &self.roots }

    pub fn push_root(
        &mut self,
        id: NodeId,
    ) {
        self.roots.push(id);
    }

    pub(crate) fn set_roots(
        &mut self,
        roots: Vec<NodeId>,
    ) {
        self.roots = roots;
    }

    pub fn regions(&self) -> impl Iterator<Item = &SequenceRegion> { self.regions.values() }

    pub(crate) fn regions_mut(&mut self) -> impl Iterator<Item = &mut SequenceRegion> {
        self.regions.values_mut()
    }

    pub fn region(
        &self,
        seqid: &str,
    ) -> Option<&SequenceRegion> {
        self.regions.get(seqid)
    }

    /// Adds a region, replacing a previous one with the same seqid.
    pub fn insert_region(
        &mut self,
        region: SequenceRegion,
    ) -> Option<SequenceRegion> {
        self.regions.insert(region.seqid.clone(), region)
    }

    pub(crate) fn retain_regions<F>(
        &mut self,
        mut keep: F,
    ) where
        F: FnMut(&SequenceRegion) -> bool, {
        self.regions.retain(|_, region| keep(region));
    }

    pub(crate) fn sort_regions(&mut self) {
        self.regions
            .sort_by(|a, _, b, _| a.as_bytes().cmp(b.as_bytes()));
    }

    pub fn comments(&self) -> &[Comment] { &self.comments }

    pub(crate) fn comments_mut(&mut self) -> &mut Vec<Comment> { &mut self.comments }

    pub fn push_comment(
        &mut self,
        comment: Comment,
    ) {
        self.comments.push(comment);
    }

    pub fn sequences(&self) -> impl Iterator<Item = &SequenceEntry> { self.sequences.values() }

    pub fn sequence(
        &self,
        seqid: &str,
    ) -> Option<&SequenceEntry> {
        self.sequences.get(seqid)
    }

    pub fn insert_sequence(
        &mut self,
        entry: SequenceEntry,
    ) -> Option<SequenceEntry> {
        self.sequences.insert(entry.seqid.clone(), entry)
    }

    pub(crate) fn sequence_mut(
        &mut self,
        seqid: &str,
    ) -> Option<&mut SequenceEntry> {
        self.sequences.get_mut(seqid)
    }

    pub(crate) fn retain_sequences<F>(
        &mut self,
        mut keep: F,
    ) where
        F: FnMut(&SequenceEntry) -> bool, {
        self.sequences.retain(|_, entry| keep(entry));
    }

    pub(crate) fn sort_sequences(&mut self) {
        self.sequences
            .sort_by(|a, _, b, _| a.as_bytes().cmp(b.as_bytes()));
    }

    /// Relaxations applied in tidy mode.
    pub fn warnings(&self) -> &[Diagnostic] { &self.warnings }

    pub fn push_warning(
        &mut self,
        warning: Diagnostic,
    ) {
        self.warnings.push(warning);
    }

    /// All records, in arena order.
    pub fn records(&self) -> impl Iterator<Item = &FeatureRecord> {
        self.nodes.iter().flat_map(|n| n.records.iter())
    }

    /// Sequence id of a node. A pseudo-feature takes the one of its first
    /// child.
    pub fn node_seqid(
        &self,
        id: NodeId,
    ) -> Option<&ArcStr> {
        let node = self.node(id);
        match node.seqid() {
            Some(seqid) => Some(seqid),
            None => {
                node.children
                    .first()
                    .and_then(|child| self.node_seqid(*child))
            },
        }
    }

    /// Range of a node. A pseudo-feature covers all of its children.
    pub fn node_range(
        &self,
        id: NodeId,
    ) -> Option<Range> {
        let node = self.node(id);
        if node.is_pseudo() {
            node.children
                .iter()
                .filter_map(|child| self.node_range(*child))
                .reduce(|a, b| a.join(&b))
        }
        else {
            node.range()
        }
    }

    /// Smallest source line of a node or, for a pseudo-feature, of its
    /// children.
    pub fn node_line(
        &self,
        id: NodeId,
    ) -> Option<usize> {
        let node = self.node(id);
        if node.is_pseudo() {
            node.children
                .iter()
                .filter_map(|child| self.node_line(*child))
                .min()
        }
        else {
            node.first_line()
        }
    }

    /// The first record of a top-level node; for a pseudo-feature the one of
    /// its first child.
    pub fn root_record(
        &self,
        id: NodeId,
    ) -> Option<&FeatureRecord> {
        let node = self.node(id);
        match node.record() {
            Some(record) => Some(record),
            None => {
                node.children
                    .first()
                    .and_then(|child| self.root_record(*child))
            },
        }
    }

    /// Breadth-first list of `id` and everything below it, each node once.
    pub fn descendants(
        &self,
        id: NodeId,
    ) -> Vec<NodeId> {
        let mut seen = HashSet::new();
        let mut queue = VecDeque::from([id]);
        let mut result = Vec::new();
        while let Some(current) = queue.pop_front() {
            if !seen.insert(current) {
                continue;
            }
            result.push(current);
            queue.extend(self.node(current).children.iter().copied());
        }
        result
    }

    /// True when no node below `root` has more than one parent.
    pub fn is_tree(
        &self,
        root: NodeId,
    ) -> bool {
        self.descendants(root)
            .iter()
            .all(|id| self.node(*id).parents.len() <= 1)
    }

    /// Keeps the top-level nodes accepted by `keep` and drops everything
    /// that is no longer reachable. Comment anchors follow the kept nodes.
    pub fn retain_roots<F>(
        mut self,
        mut keep: F,
    ) -> Document
    where
        F: FnMut(&Document, NodeId) -> bool, {
        let kept: Vec<bool> = self
            .roots
            .iter()
            .map(|root| keep(&self, *root))
            .collect();
        for comment in self.comments.iter_mut() {
            let anchor = kept
                .iter()
                .take(comment.anchor)
                .filter(|k| **k)
                .count();
            comment.anchor = anchor;
        }
        self.roots = self
            .roots
            .iter()
            .zip(kept)
            .filter_map(|(root, k)| k.then_some(*root))
            .collect();
        self.compact()
    }

    /// Drops nodes that cannot be reached from a top-level node and
    /// renumbers the rest in breadth-first order.
    pub fn compact(mut self) -> Document {
        let mut order = Vec::with_capacity(self.nodes.len());
        let mut mapping: HashMap<NodeId, NodeId> = HashMap::new();
        let mut queue: VecDeque<NodeId> = self.roots.iter().copied().collect();
        while let Some(current) = queue.pop_front() {
            if mapping.contains_key(&current) {
                continue;
            }
            mapping.insert(current, NodeId(order.len()));
            order.push(current);
            queue.extend(self.nodes[current.0].children.iter().copied());
        }

        let mut old_nodes: Vec<Option<FeatureNode>> =
            std::mem::take(&mut self.nodes).into_iter().map(Some).collect();
        self.nodes = order
            .iter()
            .filter_map(|old| old_nodes[old.0].take())
            .map(|mut node| {
                node.parents = node
                    .parents
                    .iter()
                    .filter_map(|p| mapping.get(p).copied())
                    .collect();
                node.children = node
                    .children
                    .iter()
                    .filter_map(|c| mapping.get(c).copied())
                    .collect();
                node
            })
            .collect();
        self.roots = self
            .roots
            .iter()
            .filter_map(|r| mapping.get(r).copied())
            .unique()
            .collect();
        self
    }

    /// Moves the nodes of `other` into this arena. Returns the renumbered
    /// top-level nodes of `other`, which are not added to this document's
    /// roots.
    pub(crate) fn append_nodes(
        &mut self,
        other: Document,
    ) -> Vec<NodeId> {
        let base = self.nodes.len();
        let shift = |id: &NodeId| NodeId(id.0 + base);
        self.nodes
            .extend(other.nodes.into_iter().map(|mut node| {
                node.parents = node.parents.iter().map(shift).collect();
                node.children = node.children.iter().map(shift).collect();
                node
            }));
        other.roots.iter().map(shift).collect()
    }

    /// Compares two documents ignoring source lines and warnings.
    pub fn structurally_eq(
        &self,
        other: &Document,
    ) -> bool {
        let regions_eq = self.regions.len() == other.regions.len()
            && self
                .regions
                .values()
                .zip(other.regions.values())
                .all(|(a, b)| a.seqid == b.seqid && a.range == b.range);
        let comments_eq = self.comments.len() == other.comments.len()
            && self
                .comments
                .iter()
                .zip(other.comments.iter())
                .all(|(a, b)| a.text == b.text && a.anchor == b.anchor);
        let sequences_eq = self.sequences.len() == other.sequences.len()
            && self
                .sequences
                .values()
                .zip(other.sequences.values())
                .all(|(a, b)| a.description == b.description && a.sequence == b.sequence);
        let roots_eq = self.roots.len() == other.roots.len()
            && self
                .roots
                .iter()
                .zip(other.roots.iter())
                .all(|(a, b)| self.subtree_eq(*a, other, *b));

        regions_eq && comments_eq && sequences_eq && roots_eq
    }

    fn subtree_eq(
        &self,
        a: NodeId,
        other: &Document,
        b: NodeId,
    ) -> bool {
        let (left, right) = (self.node(a), other.node(b));
        left.records.len() == right.records.len()
            && left
                .records
                .iter()
                .zip(right.records.iter())
                .all(|(x, y)| x.same_content(y))
            && left.parents.len() == right.parents.len()
            && left.children.len() == right.children.len()
            && left
                .children
                .iter()
                .zip(right.children.iter())
                .all(|(x, y)| self.subtree_eq(*x, other, *y))
    }
}

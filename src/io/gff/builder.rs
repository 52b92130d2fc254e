//! Builds the feature graph of a [`Document`] from a token stream.
//!
//! IDs are scoped by the `###` terminator: `Parent` references are queued
//! and resolved against the IDs defined since the last terminator, either
//! when the next terminator is reached or at the end of input. Records with
//! an ID that is already known in the current scope become further
//! locations of the same multi-feature.

use std::cmp::{
    max,
    min,
};
use std::io::BufRead;

use arcstr::ArcStr;
use hashbrown::HashMap;
use indexmap::IndexMap;
use log::{
    debug,
    warn,
};
use serde::{
    Deserialize,
    Serialize,
};

use super::tokenizer::{
    Directive,
    GffLine,
    Token,
    Tokenizer,
};
use crate::data_structs::annotation::{
    Comment,
    Document,
    FeatureRecord,
    NodeId,
    SequenceEntry,
    SequenceRegion,
};
use crate::error::Diagnostic;
use crate::with_field_fn;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ParseOptions {
    /// Drop offending `Parent` relations instead of failing, and record a
    /// warning on the document.
    pub tidy: bool,
}

impl ParseOptions {
    pub fn new() -> Self { Self::default() }

    with_field_fn!(tidy, bool);
}

struct PendingEdge {
    child:     NodeId,
    parent_id: String,
    line:      usize,
}

/// Consumes [`Token`]s and assembles a [`Document`].
pub struct GraphBuilder {
    options:          ParseOptions,
    doc:              Document,
    /// IDs defined since the last terminator.
    ids:              HashMap<String, NodeId>,
    /// IDs of earlier scopes and the line they were defined on.
    closed_ids:       HashMap<String, usize>,
    pending:          Vec<PendingEdge>,
    scope_nodes:      Vec<NodeId>,
    scope_comments:   Vec<(String, usize)>,
    seqid_lines:      HashMap<ArcStr, usize>,
    current_sequence: Option<ArcStr>,
}

impl GraphBuilder {
    pub fn new(options: ParseOptions) -> Self {
        Self {
            options,
            doc: Document::new(),
            ids: HashMap::new(),
            closed_ids: HashMap::new(),
            pending: Vec::new(),
            scope_nodes: Vec::new(),
            scope_comments: Vec::new(),
            seqid_lines: HashMap::new(),
            current_sequence: None,
        }
    }

    /// Downgrades a reference error to a warning in tidy mode.
    fn relax(
        &mut self,
        diagnostic: Diagnostic,
    ) -> Result<(), Diagnostic> {
        if diagnostic.is_fatal(self.options.tidy) {
            return Err(diagnostic);
        }
        warn!("{}", diagnostic);
        self.doc.push_warning(diagnostic);
        Ok(())
    }

    pub fn push(
        &mut self,
        token: Token,
    ) -> Result<(), Diagnostic> {
        let line = token.line;
        match token.kind {
            GffLine::Blank => Ok(()),
            GffLine::Comment(text) => {
                self.scope_comments.push((text, line));
                Ok(())
            },
            GffLine::Directive(directive) => self.push_directive(directive, line),
            GffLine::Feature(record) => self.push_record(record, line),
            GffLine::SequenceHeader(description) => {
                self.close_scope()?;
                let entry = SequenceEntry::new(description).with_line(Some(line));
                if let Some(previous) = self.doc.sequence(entry.seqid()) {
                    return Err(Diagnostic::syntax(
                        line,
                        format!(
                            "the sequence \"{}\" on line {} has already been defined on \
                             line {}",
                            entry.seqid(),
                            line,
                            previous.line().unwrap_or_default()
                        ),
                    ));
                }
                self.current_sequence = Some(entry.seqid().clone());
                self.doc.insert_sequence(entry);
                Ok(())
            },
            GffLine::SequenceData(residues) => {
                let entry = self
                    .current_sequence
                    .as_ref()
                    .and_then(|seqid| self.doc.sequence_mut(seqid))
                    .ok_or_else(|| {
                        Diagnostic::syntax(
                            line,
                            format!("sequence data on line {} has no '>' header", line),
                        )
                    })?;
                entry.push_residues(&residues);
                Ok(())
            },
        }
    }

    fn push_directive(
        &mut self,
        directive: Directive,
        line: usize,
    ) -> Result<(), Diagnostic> {
        match directive {
            Directive::GffVersion(_) => Ok(()),
            Directive::SequenceRegion(region) => self.push_region(region, line),
            Directive::Fasta | Directive::Terminator => self.close_scope(),
            Directive::Other(text) => {
                self.scope_comments.push((text, line));
                Ok(())
            },
        }
    }

    fn push_region(
        &mut self,
        region: SequenceRegion,
        line: usize,
    ) -> Result<(), Diagnostic> {
        if let Some(diagnostic) = region.check() {
            return Err(diagnostic);
        }
        if let Some(previous) = self.doc.region(region.seqid()) {
            return Err(Diagnostic::syntax(
                line,
                format!(
                    "the sequence region \"{}\" on line {} has already been defined on \
                     line {}",
                    region.seqid(),
                    line,
                    previous.line().unwrap_or_default()
                ),
            ));
        }
        if let Some(used) = self.seqid_lines.get(region.seqid()) {
            return Err(Diagnostic::syntax(
                line,
                format!(
                    "seqid \"{}\" on line {} has been used before the corresponding \
                     sequence-region on line {}",
                    region.seqid(),
                    used,
                    line
                ),
            ));
        }
        self.doc.insert_region(region);
        Ok(())
    }

    fn push_record(
        &mut self,
        record: FeatureRecord,
        line: usize,
    ) -> Result<(), Diagnostic> {
        if let Some(diagnostic) = record.check().into_iter().next() {
            return Err(diagnostic);
        }
        self.seqid_lines
            .entry(record.seqid().clone())
            .or_insert(line);
        let parents = record.parents().to_vec();

        let node = match record.id().map(str::to_owned) {
            Some(id) if self.ids.contains_key(&id) => {
                let node = self.ids[&id];
                let counterpart = self.doc.node(node);
                let first_line = counterpart.first_line().unwrap_or_default();
                let mismatch = match counterpart.record() {
                    Some(first) if first.seqid() != record.seqid() => Some("sequence id"),
                    Some(first) if first.feature_type != record.feature_type => Some("type"),
                    _ => None,
                };
                match mismatch {
                    Some(what) => {
                        self.relax(Diagnostic::reference(
                            line,
                            format!(
                                "the multi-feature with ID \"{}\" on line {} has a \
                                 different {} than its counterpart on line {}",
                                id, line, what, first_line
                            ),
                        ))?;
                        self.new_node(record, None)
                    },
                    None => {
                        self.doc.node_mut(node).push_record(record);
                        node
                    },
                }
            },
            Some(id) => {
                if let Some(counterpart) = self.closed_ids.get(&id).copied() {
                    self.relax(Diagnostic::reference(
                        line,
                        format!(
                            "the multi-feature with ID \"{}\" on line {} is separated from \
                             its counterpart on line {} by terminator ###",
                            id, line, counterpart
                        ),
                    ))?;
                }
                self.new_node(record, Some(id))
            },
            None => self.new_node(record, None),
        };

        self.pending
            .extend(parents.into_iter().map(|parent_id| {
                PendingEdge {
                    child: node,
                    parent_id,
                    line,
                }
            }));
        Ok(())
    }

    fn new_node(
        &mut self,
        record: FeatureRecord,
        id: Option<String>,
    ) -> NodeId {
        let node = self.doc.add_record(record);
        if let Some(id) = id {
            self.ids.insert(id, node);
        }
        self.scope_nodes.push(node);
        node
    }

    fn resolve_edge(
        &mut self,
        edge: PendingEdge,
    ) -> Result<(), Diagnostic> {
        let Some(parent) = self.ids.get(&edge.parent_id).copied()
        else {
            return self.relax(Diagnostic::reference(
                edge.line,
                format!(
                    "the Parent \"{}\" referenced on line {} has not been previously \
                     defined",
                    edge.parent_id, edge.line
                ),
            ));
        };
        let (parent_node, child_node) = (self.doc.node(parent), self.doc.node(edge.child));
        if parent_node.seqid() != child_node.seqid() {
            let parent_line = parent_node.first_line().unwrap_or_default();
            return self.relax(Diagnostic::reference(
                edge.line,
                format!(
                    "the child feature on line {} has different sequence id than its \
                     parent \"{}\" on line {}",
                    edge.line, edge.parent_id, parent_line
                ),
            ));
        }
        if parent == edge.child || self.doc.descendants(edge.child).contains(&parent) {
            return self.relax(Diagnostic::reference(
                edge.line,
                format!(
                    "the Parent \"{}\" on line {} would introduce a cycle",
                    edge.parent_id, edge.line
                ),
            ));
        }
        self.doc.add_edge(parent, edge.child);
        Ok(())
    }

    /// Resolves the queued edges of the current scope and appends its
    /// top-level nodes and comments to the document.
    fn close_scope(&mut self) -> Result<(), Diagnostic> {
        for edge in std::mem::take(&mut self.pending) {
            self.resolve_edge(edge)?;
        }

        let roots: Vec<NodeId> = self
            .scope_nodes
            .iter()
            .copied()
            .filter(|n| self.doc.node(*n).parents().is_empty())
            .collect();
        let roots = self.group_components(roots);

        let roots_before = self.doc.roots().len();
        for (text, line) in std::mem::take(&mut self.scope_comments) {
            let preceding = roots
                .iter()
                .filter(|r| self.doc.node_line(**r).is_some_and(|l| l < line))
                .count();
            self.doc.push_comment(
                Comment::new(text, roots_before + preceding).with_line(Some(line)),
            );
        }
        for root in roots {
            self.doc.push_root(root);
        }

        for (id, node) in self.ids.drain() {
            let line = self.doc.node(node).first_line().unwrap_or_default();
            self.closed_ids.insert(id, line);
        }
        self.scope_nodes.clear();
        Ok(())
    }

    /// Puts the top-level nodes of every connected component with more than
    /// one of them under a pseudo-feature.
    fn group_components(
        &mut self,
        roots: Vec<NodeId>,
    ) -> Vec<NodeId> {
        if roots.len() < 2 {
            return roots;
        }
        fn find(
            group: &mut [usize],
            mut i: usize,
        ) -> usize {
            while group[i] != i {
                group[i] = group[group[i]];
                i = group[i];
            }
            i
        }

        let mut group: Vec<usize> = (0..roots.len()).collect();
        let mut owner: HashMap<NodeId, usize> = HashMap::new();
        for (i, root) in roots.iter().enumerate() {
            for node in self.doc.descendants(*root) {
                match owner.get(&node).copied() {
                    Some(j) => {
                        let (a, b) = (find(&mut group, i), find(&mut group, j));
                        group[max(a, b)] = min(a, b);
                    },
                    None => {
                        owner.insert(node, i);
                    },
                }
            }
        }

        let mut components: IndexMap<usize, Vec<NodeId>> = IndexMap::new();
        for (i, root) in roots.iter().enumerate() {
            components
                .entry(find(&mut group, i))
                .or_default()
                .push(*root);
        }
        components
            .into_values()
            .map(|members| {
                if members.len() == 1 {
                    members[0]
                }
                else {
                    debug!(
                        "Grouping {} top-level features under a pseudo-feature",
                        members.len()
                    );
                    self.doc.add_pseudo(members)
                }
            })
            .collect()
    }

    pub fn finish(mut self) -> Result<Document, Diagnostic> {
        self.close_scope()?;
        debug!(
            "Built document with {} nodes, {} top-level features, {} regions",
            self.doc.node_count(),
            self.doc.roots().len(),
            self.doc.regions().count()
        );
        Ok(self.doc)
    }
}

/// Parses a GFF3 document held in memory with default options.
pub fn parse(text: &str) -> Result<Document, Diagnostic> {
    parse_with(text, &ParseOptions::default())
}

pub fn parse_with(
    text: &str,
    options: &ParseOptions,
) -> Result<Document, Diagnostic> {
    parse_reader(text.as_bytes(), options)
}

/// Tokenizes and builds in one forward pass. The first fatal diagnostic
/// aborts the document.
pub fn parse_reader<R: BufRead>(
    reader: R,
    options: &ParseOptions,
) -> Result<Document, Diagnostic> {
    let mut builder = GraphBuilder::new(*options);
    for token in Tokenizer::new(reader) {
        builder.push(token?)?;
    }
    builder.finish()
}

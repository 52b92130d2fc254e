use std::collections::VecDeque;
use std::io::Write;

use anyhow::Context;
use hashbrown::{
    HashMap,
    HashSet,
};
use itertools::Itertools;
use log::debug;

use crate::data_structs::annotation::{
    Document,
    FeatureRecord,
    NodeId,
    ID_TAG,
    PARENT_TAG,
};
use crate::utils::escape;

pub const GFF_VERSION_LINE: &str = "##gff-version   3";

/// Renders a document as canonical GFF3 text.
///
/// `width` is the number of residues per FASTA line, `0` disables wrapping.
/// An empty document renders as an empty string.
pub fn serialize(
    doc: &Document,
    width: usize,
) -> String {
    Renderer::new(doc, width).render()
}

/// Writes documents to a sink.
pub struct GffWriter<W: Write> {
    sink:  W,
    width: usize,
}

impl<W: Write> GffWriter<W> {
    pub fn new(sink: W) -> Self { Self { sink, width: 0 } }

    pub fn with_width(
        mut self,
        width: usize,
    ) -> Self {
        self.width = width;
        self
    }

    pub fn write_document(
        &mut self,
        doc: &Document,
    ) -> anyhow::Result<()> {
        let text = serialize(doc, self.width);
        debug!("Writing {} bytes of GFF3", text.len());
        self.sink
            .write_all(text.as_bytes())
            .context("Failed to write GFF3 document")
    }

    pub fn finish(mut self) -> anyhow::Result<W> {
        self.sink.flush().context("Failed to flush GFF3 sink")?;
        Ok(self.sink)
    }
}

struct Renderer<'a> {
    doc:   &'a Document,
    width: usize,
    /// The ID each node is written with.
    ids:   HashMap<NodeId, String>,
    out:   String,
}

impl<'a> Renderer<'a> {
    fn new(
        doc: &'a Document,
        width: usize,
    ) -> Self {
        Self {
            doc,
            width,
            ids: assign_ids(doc),
            out: String::new(),
        }
    }

    fn line(
        &mut self,
        text: &str,
    ) {
        self.out.push_str(text);
        self.out.push('\n');
    }

    fn render(mut self) -> String {
        let doc = self.doc;
        if doc.is_empty() {
            return self.out;
        }
        self.line(GFF_VERSION_LINE);
        for region in doc.regions() {
            self.line(&format!(
                "##sequence-region   {} {} {}",
                region.seqid(),
                region.start(),
                region.end()
            ));
        }

        let mut comments = doc.comments().iter().peekable();
        for (k, root) in doc.roots().iter().enumerate() {
            while let Some(comment) = comments.next_if(|c| c.anchor() <= k) {
                self.line(&format!("#{}", comment.text()));
            }
            for node in self.write_order(*root) {
                self.write_node(node);
            }
            if !doc.node(*root).children().is_empty() {
                self.line("###");
            }
        }
        for comment in comments {
            self.line(&format!("#{}", comment.text()));
        }

        let mut sequences = doc.sequences().peekable();
        if sequences.peek().is_some() {
            self.line("##FASTA");
        }
        for entry in sequences {
            self.line(&format!(">{}", entry.description()));
            if self.width == 0 {
                self.line(entry.sequence());
            }
            else {
                for chunk in &entry.sequence().chars().chunks(self.width) {
                    let chunk: String = chunk.collect();
                    self.line(&chunk);
                }
            }
        }
        self.out
    }

    /// Depth-first for trees. Components with shared children are written
    /// breadth-first, a node only once all of its parents are written.
    fn write_order(
        &self,
        root: NodeId,
    ) -> Vec<NodeId> {
        let doc = self.doc;
        if doc.is_tree(root) {
            let mut order = Vec::new();
            let mut stack = vec![root];
            while let Some(node) = stack.pop() {
                order.push(node);
                stack.extend(doc.node(node).children().iter().rev().copied());
            }
            return order;
        }

        let mut remaining: HashMap<NodeId, usize> = HashMap::new();
        let mut queue = VecDeque::from([root]);
        let mut order = Vec::new();
        let mut seen = HashSet::new();
        while let Some(node) = queue.pop_front() {
            if !seen.insert(node) {
                continue;
            }
            order.push(node);
            for child in doc.node(node).children() {
                let left = remaining
                    .entry(*child)
                    .or_insert_with(|| doc.node(*child).parents().len());
                *left = left.saturating_sub(1);
                if *left == 0 {
                    queue.push_back(*child);
                }
            }
        }
        order
    }

    fn node_id(
        &self,
        node: NodeId,
    ) -> Option<String> {
        self.ids.get(&node).cloned()
    }

    fn write_node(
        &mut self,
        node: NodeId,
    ) {
        let doc = self.doc;
        let feature = doc.node(node);
        if feature.is_pseudo() {
            return;
        }
        let id = self.node_id(node);
        let parents: Vec<String> = feature
            .parents()
            .iter()
            .filter_map(|p| self.node_id(*p))
            .collect();
        for record in feature.records() {
            let attributes = render_attributes(record, id.as_deref(), &parents);
            self.line(&format!("{}\t{}", record.columns(), attributes));
        }
    }
}

/// `ID` first, then `Parent` as given by the graph, then the remaining
/// attributes in declaration order.
fn render_attributes(
    record: &FeatureRecord,
    id: Option<&str>,
    parents: &[String],
) -> String {
    let mut tokens = Vec::with_capacity(record.attributes.len() + 2);
    if let Some(id) = id {
        tokens.push(format!("{}={}", ID_TAG, escape(id)));
    }
    if !parents.is_empty() {
        tokens.push(format!(
            "{}={}",
            PARENT_TAG,
            parents.iter().map(|p| escape(p)).join(",")
        ));
    }
    tokens.extend(
        record
            .attributes
            .iter()
            .filter(|(tag, _)| tag.as_str() != ID_TAG && tag.as_str() != PARENT_TAG)
            .map(|(tag, values)| {
                format!(
                    "{}={}",
                    escape(tag),
                    values.iter().map(|v| escape(v)).join(",")
                )
            }),
    );
    if tokens.is_empty() {
        ".".to_owned()
    }
    else {
        tokens.join(";")
    }
}

/// Picks the ID every node is written with. An input ID stays on the first
/// node that carries it. Later nodes repeating it, and parents without an
/// ID, get a fresh `<type><n>` that no other node in the output uses.
fn assign_ids(doc: &Document) -> HashMap<NodeId, String> {
    let taken: HashSet<&str> = doc.records().filter_map(FeatureRecord::id).collect();
    let mut used: HashSet<String> = HashSet::new();
    let mut counters: HashMap<&str, usize> = HashMap::new();
    let mut ids: HashMap<NodeId, String> = HashMap::new();
    for root in doc.roots() {
        for node in doc.descendants(*root) {
            let feature = doc.node(node);
            if feature.is_pseudo() || ids.contains_key(&node) {
                continue;
            }
            let Some(feature_type) = feature.feature_type()
            else {
                continue;
            };
            let id = match feature.id() {
                Some(id) if !used.contains(id) => id.to_owned(),
                None if feature.children().is_empty() => continue,
                _ => {
                    let counter = counters.entry(feature_type.as_str()).or_insert(0);
                    loop {
                        *counter += 1;
                        let candidate = format!("{}{}", feature_type, counter);
                        if !taken.contains(candidate.as_str()) && !used.contains(&candidate) {
                            break candidate;
                        }
                    }
                },
            };
            if feature.id().is_some_and(|input| input != id) {
                debug!("Writing repeated ID {:?} as {}", feature.id(), id);
            }
            used.insert(id.clone());
            ids.insert(node, id);
        }
    }
    ids
}

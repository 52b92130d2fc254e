//! Term table of an OBO ontology, used to check feature types.
//!
//! Only the parts needed for type checking are modelled: stanza kinds,
//! `id`/`name`, `is_a` links and obsolescence. Every stanza is still kept
//! with all of its tags.

use std::collections::VecDeque;
use std::fmt::Display;

use hashbrown::{
    HashMap,
    HashSet,
};
use indexmap::IndexMap;
use once_cell::sync::Lazy;

use crate::io::obo::parse_obo;

/// Sequence ontology subset used when no ontology file is supplied.
pub const BUILTIN_OBO: &str = include_str!("../data/sofa.obo");

static BUILTIN: Lazy<Ontology> = Lazy::new(|| {
    parse_obo(BUILTIN_OBO).unwrap_or_else(|e| {
        log::error!("Built-in ontology is malformed: {}", e);
        Ontology::default()
    })
});

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum StanzaKind {
    Term,
    Typedef,
    Instance,
    /// Any other bracketed stanza. No tags are required.
    Other(String),
}

impl StanzaKind {
    pub fn from_name(name: &str) -> Self {
        match name {
            "Term" => StanzaKind::Term,
            "Typedef" => StanzaKind::Typedef,
            "Instance" => StanzaKind::Instance,
            other => StanzaKind::Other(other.to_owned()),
        }
    }

    pub fn name(&self) -> &str {
        match self {
            StanzaKind::Term => "Term",
            StanzaKind::Typedef => "Typedef",
            StanzaKind::Instance => "Instance",
            StanzaKind::Other(name) => name,
        }
    }

    /// The tag a stanza of this kind must carry.
    pub fn required_tag(&self) -> Option<&'static str> {
        match self {
            StanzaKind::Term | StanzaKind::Typedef => Some("name"),
            StanzaKind::Instance => Some("instance_of"),
            StanzaKind::Other(_) => None,
        }
    }
}

impl Display for StanzaKind {
    fn fmt(
        &self,
        f: &mut std::fmt::Formatter<'_>,
    ) -> std::fmt::Result {
        write!(f, "[{}]", self.name())
    }
}

/// A bracketed block of `tag: value` lines.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Stanza {
    kind: StanzaKind,
    tags: IndexMap<String, Vec<String>>,
    line: usize,
}

impl Stanza {
    pub fn new(
        kind: StanzaKind,
        line: usize,
    ) -> Self {
        Self {
            kind,
            tags: IndexMap::new(),
            line,
        }
    }

    pub fn kind(&self) -> &StanzaKind { &self.kind }

    /// Line of the `[Kind]` marker.
    pub fn line(&self) -> usize { self.line }

    pub fn push_tag<S: Into<String>>(
        &mut self,
        tag: S,
        value: S,
    ) {
        self.tags
            .entry(tag.into())
            .or_default()
            .push(value.into());
    }

    /// First value of `tag`.
    pub fn get(
        &self,
        tag: &str,
    ) -> Option<&str> {
        self.tags
            .get(tag)
            .and_then(|v| v.first())
            .map(String::as_str)
    }

    pub fn values(
        &self,
        tag: &str,
    ) -> &[String] {
        self.tags.get(tag).map(Vec::as_slice).unwrap_or(&[])
    }

    pub fn contains(
        &self,
        tag: &str,
    ) -> bool {
        self.tags.contains_key(tag)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OntologyTerm {
    id:       String,
    name:     String,
    is_a:     Vec<String>,
    obsolete: bool,
    line:     usize,
}

impl OntologyTerm {
    pub fn id(&self) -> &str { &self.id }

    pub fn name(&self) -> &str { &self.name }

    /// Ids of the direct `is_a` parents.
    pub fn is_a(&self) -> &[String] { &self.is_a }

    pub fn is_obsolete(&self) -> bool { self.obsolete }

    pub fn line(&self) -> usize { self.line }
}

impl From<&Stanza> for OntologyTerm {
    fn from(stanza: &Stanza) -> Self {
        Self {
            id:       stanza.get("id").unwrap_or_default().to_owned(),
            name:     stanza.get("name").unwrap_or_default().to_owned(),
            // "SO:0000001 {modifier}" keeps only the id
            is_a:     stanza
                .values("is_a")
                .iter()
                .filter_map(|v| v.split_whitespace().next())
                .map(str::to_owned)
                .collect(),
            obsolete: stanza.get("is_obsolete") == Some("true"),
            line:     stanza.line,
        }
    }
}

#[derive(Debug, Clone, Default)]
pub struct Ontology {
    header:  IndexMap<String, Vec<String>>,
    stanzas: Vec<Stanza>,
    terms:   Vec<OntologyTerm>,
    index:   HashMap<String, usize>,
}

impl Ontology {
    /// Builds the term table from the `[Term]` stanzas. Terms are looked up
    /// by id first, then by name.
    pub fn new(
        header: IndexMap<String, Vec<String>>,
        stanzas: Vec<Stanza>,
    ) -> Self {
        let terms: Vec<OntologyTerm> = stanzas
            .iter()
            .filter(|s| s.kind == StanzaKind::Term)
            .map(OntologyTerm::from)
            .collect();
        let mut index = HashMap::new();
        for (i, term) in terms.iter().enumerate() {
            if !term.id.is_empty() {
                index.entry(term.id.clone()).or_insert(i);
            }
        }
        for (i, term) in terms.iter().enumerate() {
            if !term.name.is_empty() {
                index.entry(term.name.clone()).or_insert(i);
            }
        }
        Self {
            header,
            stanzas,
            terms,
            index,
        }
    }

    /// The table compiled into the crate.
    pub fn builtin() -> &'static Ontology { &BUILTIN }

    pub fn format_version(&self) -> Option<&str> { self.header_value("format-version") }

    pub fn header_value(
        &self,
        tag: &str,
    ) -> Option<&str> {
        self.header
            .get(tag)
            .and_then(|v| v.first())
            .map(String::as_str)
    }

    pub fn stanzas(&self) -> &[Stanza] { &self.stanzas }

    pub fn terms(&self) -> &[OntologyTerm] { &self.terms }

    pub fn len(&self) -> usize { self.terms.len() }

    pub fn is_empty(&self) -> bool { self.terms.is_empty() }

    /// Looks a term up by id or name. Obsolete terms are returned too.
    pub fn term(
        &self,
        id_or_name: &str,
    ) -> Option<&OntologyTerm> {
        self.index.get(id_or_name).map(|i| &self.terms[*i])
    }

    /// A feature type is valid if it names a term that is not obsolete.
    pub fn is_valid_type(
        &self,
        feature_type: &str,
    ) -> bool {
        self.term(feature_type)
            .is_some_and(|term| !term.obsolete)
    }

    /// Ids of all terms reachable through `is_a`, nearest first.
    pub fn ancestors(
        &self,
        id_or_name: &str,
    ) -> Vec<&str> {
        let mut result = Vec::new();
        let Some(start) = self.term(id_or_name)
        else {
            return result;
        };
        let mut seen: HashSet<&str> = HashSet::from([start.id.as_str()]);
        let mut queue: VecDeque<&str> = start.is_a.iter().map(String::as_str).collect();
        while let Some(id) = queue.pop_front() {
            if !seen.insert(id) {
                continue;
            }
            result.push(id);
            if let Some(term) = self.term(id) {
                queue.extend(term.is_a.iter().map(String::as_str));
            }
        }
        result
    }

    /// True if `ancestor` equals `term` or can be reached from it via `is_a`.
    pub fn is_a(
        &self,
        term: &str,
        ancestor: &str,
    ) -> bool {
        let (Some(term), Some(ancestor)) = (self.term(term), self.term(ancestor))
        else {
            return false;
        };
        term.id == ancestor.id || self.ancestors(&term.id).contains(&ancestor.id.as_str())
    }
}

use std::str::FromStr;

use rstest::rstest;

use super::*;
use crate::data_structs::coords::{
    Contig,
    Range,
};
use crate::data_structs::Strand;
use crate::error::DiagnosticKind;

fn record(
    seqid: &str,
    feature_type: &str,
    start: u64,
    end: u64,
    attributes: &str,
) -> FeatureRecord {
    FeatureRecord::new(Contig::new(seqid, start, end, Strand::Forward), feature_type)
        .with_attributes(GffAttributes::from_str(attributes).unwrap())
}

#[test]
fn test_attributes_keep_declaration_order() {
    let attributes =
        GffAttributes::from_str("Name=my_gene;ID=gene123;Alias=a,b;custom=value;").unwrap();
    let tags: Vec<&str> = attributes.iter().map(|(k, _)| k.as_str()).collect();
    assert_eq!(tags, vec!["Name", "ID", "Alias", "custom"]);
    assert_eq!(attributes.id(), Some("gene123"));
    assert_eq!(attributes.get("Alias").unwrap(), ["a", "b"]);
    assert_eq!(
        attributes.to_string(),
        "Name=my_gene;ID=gene123;Alias=a,b;custom=value"
    );
}

#[test]
fn test_attributes_unescape_and_escape() {
    let attributes = GffAttributes::from_str("Note=a%3Bb%2Cc;Dbxref=x,y").unwrap();
    assert_eq!(attributes.first("Note"), Some("a;b,c"));
    assert_eq!(attributes.to_string(), "Note=a%3Bb%2Cc;Dbxref=x,y");
}

#[test]
fn test_attributes_dot_is_empty() {
    let attributes = GffAttributes::from_str(".").unwrap();
    assert!(attributes.is_empty());
    assert_eq!(attributes.to_string(), ".");
}

#[rstest]
#[case(".;ID=foo", DiagnosticKind::Attribute, "more than one attribute token defined")]
#[case("ID=foo=bar", DiagnosticKind::Attribute, "does not contain exactly one '='")]
#[case("ID", DiagnosticKind::Attribute, "does not contain exactly one '='")]
#[case("ID=a;;Name=b", DiagnosticKind::Attribute, "has no tag")]
#[case("ID=a;ID=b", DiagnosticKind::Attribute, "is defined more than once")]
#[case("Note=bad%G1", DiagnosticKind::Syntax, "illegal percent escape")]
fn test_attributes_parse_errors(
    #[case] input: &str,
    #[case] kind: DiagnosticKind,
    #[case] message: &str,
) {
    let err = GffAttributes::parse(input, Some(7)).unwrap_err();
    assert_eq!(err.kind(), kind);
    assert_eq!(err.line(), Some(7));
    assert!(err.message().contains(message), "{}", err);
}

#[rstest]
#[case("ID=;Name=foo", "the attribute \"ID\" on line 3 has no value")]
#[case("=foo", "has no tag")]
#[case("Parent=a,", "the attribute \"Parent\" on line 3 has no value")]
#[case("ID=a,b", "has more than one value")]
#[case("Target=EST23 1", "must have 3 or 4 blank separated entries")]
#[case("Target=EST23 2 1", "start '2' is larger then end '1' on line 3")]
#[case("Target=EST23 1 x", "could not parse integer")]
#[case("Target=EST23 1 21 x", "must be one of '+-.?'")]
fn test_attributes_check(
    #[case] input: &str,
    #[case] message: &str,
) {
    let attributes = GffAttributes::parse(input, Some(3)).unwrap();
    let diagnostics = attributes.check(Some(3));
    assert!(
        diagnostics.iter().any(|d| d.message().contains(message)),
        "{:?}",
        diagnostics
    );
}

#[test]
fn test_parse_target() {
    let target = parse_target("EST23 1 21 +", None).unwrap();
    assert_eq!(target.seqname(), "EST23");
    assert_eq!(target.start(), 1);
    assert_eq!(target.end(), 21);
    assert_eq!(target.strand(), Strand::Forward);
}

#[test]
fn test_feature_record_parse_line() {
    let record = FeatureRecord::parse_line(
        "ctg123\t.\tgene\t1000\t9000\t0.5\t+\t.\tID=gene00001;Name=EDEN",
        Some(2),
    )
    .unwrap();
    assert_eq!(record.seqid(), "ctg123");
    assert_eq!(record.feature_type, "gene");
    assert_eq!(record.range().length(), 8001);
    assert_eq!(record.score, Some(0.5));
    assert_eq!(record.strand(), Strand::Forward);
    assert_eq!(record.phase, None);
    assert_eq!(record.id(), Some("gene00001"));
    assert_eq!(record.line, Some(2));
    assert!(record.check().is_empty());
    assert_eq!(
        record.to_string(),
        "ctg123\t.\tgene\t1000\t9000\t0.5\t+\t.\tID=gene00001;Name=EDEN"
    );
}

#[rstest]
#[case("ctg123\t.\tgene\t1000\t9000\t.\t+\t.", "contains 8 tab separated fields instead of 9")]
#[case("ctg123\t.\tgene\tfoo\t9000\t.\t+\t.\t.", "could not parse integer")]
#[case("ctg123\t.\tgene\t1\t9000\tx\t+\t.\t.", "could not parse score")]
#[case("ctg123\t.\tgene\t1\t9000\t.\t*\t.\t.", "must be one of '+-.?'")]
#[case("ctg123\t.\tCDS\t1\t9000\t.\t+\t3\t.", "could not parse phase")]
#[case("ctg123\t.\tgene\t-5\t9000\t.\t+\t.\t.", "illegal feature start -5")]
fn test_feature_record_parse_errors(
    #[case] line: &str,
    #[case] message: &str,
) {
    let err = FeatureRecord::parse_line(line, Some(1)).unwrap_err();
    assert!(err.message().contains(message), "{}", err);
}

#[test]
fn test_feature_record_check_ranges() {
    let zero = FeatureRecord::from_str("ctg\t.\tgene\t0\t10\t.\t+\t.\t.").unwrap();
    assert!(zero.check()[0].message().contains("illegal feature start"));

    let swapped = FeatureRecord::from_str("ctg\t.\tgene\t20\t10\t.\t+\t.\t.").unwrap();
    let diagnostics = swapped.check();
    assert_eq!(diagnostics[0].kind(), DiagnosticKind::Range);
    assert!(diagnostics[0].message().contains("is larger then end"));
}

#[test]
fn test_sequence_region_check() {
    let good = SequenceRegion::new("ctg123", 1, 1497228);
    assert!(good.check().is_none());
    let bad = SequenceRegion::new("ctg123", 10, 1).with_line(Some(2));
    let diagnostic = bad.check().unwrap();
    assert_eq!(diagnostic.kind(), DiagnosticKind::Range);
    assert!(diagnostic.message().contains("illegal region start"));
}

#[test]
fn test_sequence_entry_seqid_is_first_word() {
    let entry = SequenceEntry::new("ctg123 some description").with_sequence("ACGT");
    assert_eq!(entry.seqid(), "ctg123");
    assert_eq!(entry.description(), "ctg123 some description");
    assert_eq!(entry.sequence(), "ACGT");
}

#[test]
fn test_document_edges_and_ranges() {
    let mut doc = Document::new();
    let gene = doc.add_record(record("ctg", "gene", 100, 900, "ID=g1"));
    let mrna = doc.add_record(record("ctg", "mRNA", 100, 900, "ID=m1;Parent=g1"));
    let cds = doc.add_record(record("ctg", "CDS", 100, 200, "ID=c1;Parent=m1"));
    doc.node_mut(cds)
        .push_record(record("ctg", "CDS", 500, 700, "ID=c1;Parent=m1"));
    assert!(doc.add_edge(gene, mrna));
    assert!(doc.add_edge(mrna, cds));
    assert!(!doc.add_edge(mrna, cds));
    doc.push_root(gene);

    assert!(doc.node(cds).is_multi());
    assert_eq!(doc.node_range(cds), Some(Range::new(100, 700)));
    assert_eq!(doc.descendants(gene), vec![gene, mrna, cds]);
    assert!(doc.is_tree(gene));
    assert_eq!(doc.records().count(), 4);
}

#[test]
fn test_document_pseudo_feature() {
    let mut doc = Document::new();
    let g1 = doc.add_record(record("ctg", "gene", 300, 900, "ID=g1"));
    let g2 = doc.add_record(record("ctg", "gene", 100, 500, "ID=g2"));
    let exon = doc.add_record(record("ctg", "exon", 300, 400, "Parent=g1,g2"));
    doc.add_edge(g1, exon);
    doc.add_edge(g2, exon);
    let pseudo = doc.add_pseudo(vec![g1, g2]);
    doc.push_root(pseudo);

    assert!(doc.node(pseudo).is_pseudo());
    assert!(doc.node(g1).parents().is_empty());
    assert_eq!(doc.node_range(pseudo), Some(Range::new(100, 900)));
    assert_eq!(doc.node_seqid(pseudo).unwrap(), "ctg");
    assert_eq!(doc.root_record(pseudo).unwrap().id(), Some("g1"));
    assert!(!doc.is_tree(pseudo));
}

#[test]
fn test_document_retain_roots_compacts() {
    let mut doc = Document::new();
    let g1 = doc.add_record(record("ctg", "gene", 1, 10, "ID=g1"));
    let e1 = doc.add_record(record("ctg", "exon", 1, 5, "Parent=g1"));
    let g2 = doc.add_record(record("ctg", "gene", 20, 30, "ID=g2"));
    let e2 = doc.add_record(record("ctg", "exon", 20, 25, "Parent=g2"));
    doc.add_edge(g1, e1);
    doc.add_edge(g2, e2);
    doc.push_root(g1);
    doc.push_comment(Comment::new("between", 1));
    doc.push_root(g2);
    doc.push_comment(Comment::new("after", 2));

    let doc = doc.retain_roots(|doc, root| doc.node(root).id() == Some("g2"));
    assert_eq!(doc.node_count(), 2);
    assert_eq!(doc.roots().len(), 1);
    let root = doc.roots()[0];
    assert_eq!(doc.node(root).id(), Some("g2"));
    assert_eq!(doc.node(doc.node(root).children()[0]).parents(), [root]);
    let anchors: Vec<usize> = doc.comments().iter().map(Comment::anchor).collect();
    assert_eq!(anchors, vec![0, 1]);
}

#[test]
fn test_document_structurally_eq_ignores_lines() {
    let build = |line: usize| {
        let mut doc = Document::new();
        doc.insert_region(SequenceRegion::new("ctg", 1, 100).with_line(Some(line)));
        let gene = doc.add_record(
            record("ctg", "gene", 1, 10, "ID=g1").with_line(Some(line + 1)),
        );
        doc.push_root(gene);
        doc
    };
    assert!(build(2).structurally_eq(&build(5)));

    let mut other = build(2);
    let extra = other.add_record(record("ctg", "gene", 20, 30, "ID=g2"));
    other.push_root(extra);
    assert!(!build(2).structurally_eq(&other));
}

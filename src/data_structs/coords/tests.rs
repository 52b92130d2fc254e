use rstest::rstest;

use super::*;
use crate::data_structs::enums::Strand;

#[rstest]
#[case((1, 10), 10)]
#[case((5, 5), 1)]
#[case((10, 1), 0)]
fn test_range_length(
    #[case] bounds: (u64, u64),
    #[case] expected: u64,
) {
    assert_eq!(Range::from(bounds).length(), expected);
}

#[test]
fn test_range_contains() {
    let region = Range::new(1, 1000);
    assert!(region.contains(&Range::new(1, 1000)));
    assert!(region.contains(&Range::new(10, 20)));
    assert!(!region.contains(&Range::new(0, 20)));
    assert!(!region.contains(&Range::new(990, 1001)));
    assert!(region.contains_pos(1000));
    assert!(!region.contains_pos(1001));
}

#[rstest]
#[case((1, 10), (11, 20), false, true)]
#[case((11, 20), (1, 10), false, true)]
#[case((1, 10), (10, 20), true, false)]
#[case((1, 10), (12, 20), false, false)]
fn test_range_overlaps_and_abuts(
    #[case] a: (u64, u64),
    #[case] b: (u64, u64),
    #[case] overlaps: bool,
    #[case] abuts: bool,
) {
    let (a, b) = (Range::from(a), Range::from(b));
    assert_eq!(a.overlaps(&b), overlaps);
    assert_eq!(a.abuts(&b), abuts);
}

#[test]
fn test_range_join() {
    let joined = Range::new(5, 10).join(&Range::new(1, 7));
    assert_eq!(joined, Range::new(1, 10));
}

#[rstest]
#[case((1000, 2000), -999, 1, Some((1, 1001)))]
#[case((1000, 2000), -1000, 1, None)]
#[case((1000, 2000), -1000, 0, Some((0, 1000)))]
#[case((0, 100), 0, 0, Some((0, 100)))]
#[case((0, 100), 0, 1, None)]
#[case((1, 10), 5, 1, Some((6, 15)))]
#[case((1, 10), i64::MIN, 0, None)]
fn test_range_shift(
    #[case] bounds: (u64, u64),
    #[case] offset: i64,
    #[case] floor: u64,
    #[case] expected: Option<(u64, u64)>,
) {
    assert_eq!(
        Range::from(bounds).shift(offset, floor),
        expected.map(Range::from)
    );
}

#[test]
fn test_range_display() {
    assert_eq!(Range::new(3, 7).to_string(), "(3,7)");
}

#[test]
fn test_contig_is_in() {
    let gene = Contig::new("ctg123", 1000, 9000, Strand::Forward);
    let exon = Contig::new("ctg123", 1300, 1500, Strand::Forward);
    let other = Contig::new("ctg124", 1300, 1500, Strand::Forward);
    assert!(exon.is_in(&gene));
    assert!(!gene.is_in(&exon));
    assert!(!other.is_in(&gene));
}

#[test]
fn test_contig_target_string() {
    let plain = Contig::new("EST23", 1, 21, Strand::None);
    let stranded = Contig::new("EST23", 1, 21, Strand::Reverse);
    assert_eq!(plain.to_target_string(), "EST23 1 21");
    assert_eq!(stranded.to_target_string(), "EST23 1 21 -");
}

#[test]
fn test_contig_setters() {
    let mut contig = Contig::new("chr1", 10, 20, Strand::None);
    contig.set_start(5);
    contig.set_end(25);
    contig.set_strand(Strand::Unknown);
    contig.set_seqname("chr2");
    assert_eq!(contig.length(), 21);
    assert_eq!(contig.to_string(), "chr2:5-25 (?)");
}

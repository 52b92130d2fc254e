//! Whole-document operations on parsed annotations.
//!
//! - [`validate`]: region containment, parent/child consistency, feature
//!   types and ordering checks.
//! - [`sort`]: canonical ordering of top-level features.
//! - [`filter`]: keeps or drops whole trees by seqid, strand and gene
//!   predicates.
//! - [`offset`]: moves all coordinates by a uniform or per-seqid offset.
//! - [`mergefeat`]: folds touching siblings of the same type together.
//! - [`introns`]: derives introns from the gaps between exons.
//! - [`merge`]: merges sorted documents.
pub mod filter;
pub mod introns;
pub mod merge;
pub mod mergefeat;
pub mod offset;
pub mod sort;
pub mod validate;

pub use filter::{
    filter,
    FilterOptions,
};
pub use introns::add_introns;
pub use merge::merge;
pub use mergefeat::merge_features;
pub use offset::{
    transform_offset,
    OffsetSpec,
};
pub use sort::{
    check_sorted,
    sort,
};
pub use validate::{
    validate,
    validate_many,
    TypeCheck,
    ValidateOptions,
};

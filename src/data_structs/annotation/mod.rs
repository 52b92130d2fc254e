mod document;
mod gff_entry;

pub use document::{
    Comment,
    Document,
    FeatureNode,
    NodeId,
    SequenceEntry,
    SequenceRegion,
};
pub use gff_entry::{
    parse_target,
    FeatureRecord,
    GffAttributes,
    ID_TAG,
    PARENT_TAG,
    TARGET_TAG,
};

#[cfg(test)]
mod tests;

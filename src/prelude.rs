pub use crate::data_structs::annotation::{
    Comment,
    Document,
    FeatureNode,
    FeatureRecord,
    GffAttributes,
    NodeId,
    SequenceEntry,
    SequenceRegion,
};
pub use crate::data_structs::coords::{
    Contig,
    Range,
};
pub use crate::data_structs::ontology::{
    Ontology,
    OntologyTerm,
    StanzaKind,
};
pub use crate::data_structs::Strand;
pub use crate::error::{
    Diagnostic,
    DiagnosticKind,
    DiagnosticList,
};
pub use crate::io::gff::{
    parse,
    parse_reader,
    parse_with,
    read_gff_file,
    read_many,
    serialize,
    GffWriter,
    ParseOptions,
};
pub use crate::io::{
    parse_obo,
    read_obo,
    read_obo_file,
};
pub use crate::tools::{
    add_introns,
    check_sorted,
    filter,
    merge,
    merge_features,
    sort,
    transform_offset,
    validate,
    validate_many,
    FilterOptions,
    OffsetSpec,
    TypeCheck,
    ValidateOptions,
};

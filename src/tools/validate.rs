//! Document-level checks: sequence-region containment, parent/child
//! consistency, feature types and ordering.

use std::sync::Arc;

use log::debug;
use rayon::prelude::*;

use crate::data_structs::annotation::Document;
use crate::data_structs::ontology::Ontology;
use crate::error::{
    on_line,
    Diagnostic,
    DiagnosticKind,
    DiagnosticList,
};
use crate::tools::sort::check_sorted;
use crate::with_field_fn;

/// Which term table feature types are checked against.
#[derive(Debug, Clone, Default)]
pub enum TypeCheck {
    #[default]
    Disabled,
    /// The compiled-in sequence ontology subset.
    BuiltIn,
    /// A loaded ontology, shared between validations.
    Ontology(Arc<Ontology>),
}

impl TypeCheck {
    fn table(&self) -> Option<&Ontology> {
        match self {
            TypeCheck::Disabled => None,
            TypeCheck::BuiltIn => Some(Ontology::builtin()),
            TypeCheck::Ontology(ontology) => Some(ontology.as_ref()),
        }
    }
}

impl From<Ontology> for TypeCheck {
    fn from(value: Ontology) -> Self { TypeCheck::Ontology(Arc::new(value)) }
}

#[derive(Debug, Clone, Default)]
pub struct ValidateOptions {
    pub type_check:      TypeCheck,
    /// Every seqid used by a feature must have a `##sequence-region`.
    pub require_regions: bool,
    /// Top-level features must already be in sorted order.
    pub ensure_sorted:   bool,
}

impl ValidateOptions {
    pub fn new() -> Self { Self::default() }

    with_field_fn!(type_check, TypeCheck);

    with_field_fn!(require_regions, bool);

    with_field_fn!(ensure_sorted, bool);
}

/// Runs every check and collects all diagnostics.
pub fn validate(
    doc: &Document,
    options: &ValidateOptions,
) -> Result<(), DiagnosticList> {
    let mut diagnostics: Vec<Diagnostic> = doc.regions().filter_map(|r| r.check()).collect();
    let types = options.type_check.table();

    for (_, node) in doc.nodes() {
        let Some(first) = node.record()
        else {
            continue;
        };
        for record in node.records() {
            diagnostics.extend(record.check());

            if record.seqid() != first.seqid() || record.feature_type != first.feature_type {
                diagnostics.push(Diagnostic::new(
                    DiagnosticKind::Reference,
                    record.line,
                    format!(
                        "the multi-feature with ID \"{}\"{} does not match its \
                         counterpart{}",
                        record.id().unwrap_or_default(),
                        on_line(record.line),
                        on_line(first.line)
                    ),
                ));
            }

            match doc.region(record.seqid()) {
                Some(region) if !region.range().contains(&record.range()) => {
                    diagnostics.push(Diagnostic::new(
                        DiagnosticKind::Range,
                        record.line,
                        format!(
                            "the range {} of the feature{} is not contained in range {} \
                             of the corresponding sequence region{}",
                            record.range(),
                            on_line(record.line),
                            region.range(),
                            on_line(region.line())
                        ),
                    ));
                },
                None if options.require_regions => {
                    diagnostics.push(Diagnostic::new(
                        DiagnosticKind::Range,
                        record.line,
                        format!(
                            "the document does not contain a sequence-region for seqid \
                             \"{}\" used{}",
                            record.seqid(),
                            on_line(record.line)
                        ),
                    ));
                },
                _ => {},
            }

            if let Some(types) = types {
                if !types.is_valid_type(&record.feature_type) {
                    diagnostics.push(Diagnostic::new(
                        DiagnosticKind::Ontology,
                        record.line,
                        format!(
                            "type \"{}\"{} is not a valid one",
                            record.feature_type,
                            on_line(record.line)
                        ),
                    ));
                }
            }
        }

        for parent in node.parents() {
            let parent = doc.node(*parent);
            if parent.seqid() != node.seqid() {
                diagnostics.push(Diagnostic::new(
                    DiagnosticKind::Reference,
                    first.line,
                    format!(
                        "the child feature{} has different sequence id than its parent{}",
                        on_line(first.line),
                        on_line(parent.first_line())
                    ),
                ));
            }
        }
    }

    if options.ensure_sorted {
        if let Err(diagnostic) = check_sorted(doc) {
            diagnostics.push(diagnostic);
        }
    }

    debug!("Validation finished with {} diagnostics", diagnostics.len());
    DiagnosticList::check(diagnostics)
}

/// Validates independent documents in parallel. The options, including a
/// loaded ontology, are shared read-only.
pub fn validate_many(
    docs: &[Document],
    options: &ValidateOptions,
) -> Vec<Result<(), DiagnosticList>> {
    docs.par_iter()
        .map(|doc| validate(doc, options))
        .collect()
}

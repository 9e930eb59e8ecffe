//! The standard pipelines.
//!
//! - [`load`] - build the target-independent document from the files
//! - [`initialize`] - select a target, assign variables, substitute references
//! - [`validate`] - run the read-only checks

use crate::bundle::Bundle;
use crate::interpolate::ResolveReferences;
use crate::loader::{CheckDuplicateKeys, LoadRoot, ProcessRootIncludes};
use crate::merge_keyed::MergeKeyedSequences;
use crate::mutator::{Mutator, Pipeline};
use crate::target::{DefineDefaultTarget, SelectTarget};
use crate::validate::Validate;
use crate::variables::{ResolveVariableLookups, SetVariables};
use crate::Result;

fn pipeline(mutators: Vec<Box<dyn Mutator>>) -> Pipeline {
    let mut pipeline = Pipeline::new();
    pipeline.extend(mutators);
    pipeline
}

pub fn load() -> Pipeline {
    pipeline(vec![
        Box::new(LoadRoot),
        Box::new(ProcessRootIncludes),
        Box::new(DefineDefaultTarget),
        Box::new(MergeKeyedSequences),
        Box::new(CheckDuplicateKeys),
    ])
}

pub fn initialize() -> Pipeline {
    pipeline(vec![
        Box::new(SelectTarget),
        Box::new(MergeKeyedSequences),
        Box::new(SetVariables),
        Box::new(ResolveVariableLookups),
        Box::new(ResolveReferences::without_resources()),
        Box::new(ResolveReferences::resources_only()),
    ])
}

pub fn validate() -> Pipeline {
    pipeline(vec![Box::new(Validate::standard())])
}

/// Run [`load`], [`initialize`] and [`validate`] in order.
///
/// # Errors
///
/// Returns the first fatal error; diagnostics collected up to that point
/// remain on the bundle.
pub fn load_and_validate(bundle: &mut Bundle) -> Result<()> {
    load().execute(bundle)?;
    initialize().execute(bundle)?;
    validate().execute(bundle)
}

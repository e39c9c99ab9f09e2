//! Correction compiler
//!
//! Turns diff instructions into executable [`Correction`]s for one zone.
//! The shape of the output depends only on the [`Mutator`] a provider
//! exposes:
//!
//! - [`Mutator::ByLabel`]: record sets are created per type and replaced or
//!   deleted per label, addressed by the exact-case label the provider
//!   returned
//! - [`Mutator::ByRow`]: rows are created, edited field by field and deleted
//!   by numeric ID; output is ordered reports, deletes, creates, changes
//!
//! Every validation happens while compiling, so a returned plan never fails
//! for a reason that was knowable before the first request.

mod by_label;
mod by_row;

use crate::diff::Instruction;
use crate::error::Result;
use crate::model::{Correction, ZoneRef};
use crate::traits::Mutator;

/// Compile `instructions` into corrections for `zone`
pub fn compile(zone: &ZoneRef, instructions: &[Instruction], mutator: &Mutator) -> Result<Vec<Correction>> {
    match mutator {
        Mutator::ByLabel(api) => by_label::compile(zone, instructions, api),
        Mutator::ByRow(api) => by_row::compile(zone, instructions, api),
    }
}

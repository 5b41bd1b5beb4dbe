//! Replaying adapter for the `ReferenceResolver` port.

use std::sync::Mutex;

use super::{extract_result, next_output};
use crate::cassette::replayer::CassetteReplayer;
use crate::error::PortError;
use crate::ports::{ReferenceQuery, ReferenceResolver, Referencer};

/// Serves recorded reference lookups.
pub struct ReplayingResolver {
    replayer: Mutex<CassetteReplayer>,
}

impl ReplayingResolver {
    /// Creates a replaying resolver from a cassette replayer.
    #[must_use]
    pub fn new(replayer: CassetteReplayer) -> Self {
        Self { replayer: Mutex::new(replayer) }
    }
}

impl ReferenceResolver for ReplayingResolver {
    fn find_referencers(&self, _query: &ReferenceQuery) -> Result<Vec<Referencer>, PortError> {
        let output = next_output(&self.replayer, "resolver", "find_referencers");
        extract_result(&output, "resolver::find_referencers")
    }
}

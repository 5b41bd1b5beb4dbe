//! Recording adapter for the `ReferenceResolver` port.

use std::sync::{Arc, Mutex};

use super::record_result;
use crate::cassette::recorder::CassetteRecorder;
use crate::error::PortError;
use crate::ports::{ReferenceQuery, ReferenceResolver, Referencer};

/// Records reference lookups while delegating to an inner implementation.
pub struct RecordingResolver {
    inner: Box<dyn ReferenceResolver>,
    recorder: Arc<Mutex<CassetteRecorder>>,
}

impl RecordingResolver {
    /// Creates a recording resolver wrapping `inner`.
    pub fn new(inner: Box<dyn ReferenceResolver>, recorder: Arc<Mutex<CassetteRecorder>>) -> Self {
        Self { inner, recorder }
    }
}

impl ReferenceResolver for RecordingResolver {
    fn find_referencers(&self, query: &ReferenceQuery) -> Result<Vec<Referencer>, PortError> {
        let result = self.inner.find_referencers(query);
        record_result(&self.recorder, "resolver", "find_referencers", query, &result);
        result
    }
}

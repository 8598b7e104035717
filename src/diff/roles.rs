//! Message role classification.
//!
//! Phase one of a comparison run: a pure scan over every service method in
//! both schemas, producing a frozen [`RoleMap`] that the message comparator
//! consumes read-only. Freezing the map before any diffing starts keeps
//! field-level classification independent of traversal order.

use std::collections::HashSet;

use crate::model::Schema;

/// How service methods reference a message across both schema versions.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MessageRole {
    /// Request type of at least one method, response type of none.
    RequestOnly,
    /// Response type of at least one method, or referenced by no method at
    /// all. The latter is a long-standing quirk kept for compatibility:
    /// unreferenced messages classify as response-only rather than getting
    /// a dedicated role.
    ResponseOnly,
    /// Both a request and a response type somewhere.
    Unclear,
}

/// Frozen request/response reference sets, keyed by fully-qualified name.
#[derive(Debug, Clone, Default)]
pub struct RoleMap {
    requests: HashSet<String>,
    responses: HashSet<String>,
}

impl RoleMap {
    /// Scan every service method of both schemas.
    pub fn classify(old: &Schema, new: &Schema) -> Self {
        let mut map = Self::default();
        for schema in [old, new] {
            for service in schema.services() {
                for method in &service.methods {
                    map.requests.insert(method.input_type.clone());
                    map.responses.insert(method.output_type.clone());
                }
            }
        }
        map
    }

    pub fn role_of(&self, full_name: &str) -> MessageRole {
        match (
            self.requests.contains(full_name),
            self.responses.contains(full_name),
        ) {
            (true, true) => MessageRole::Unclear,
            (true, false) => MessageRole::RequestOnly,
            _ => MessageRole::ResponseOnly,
        }
    }
}

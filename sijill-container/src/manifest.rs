//! Introspection results baked into a compiled container.

use crate::inspector::{TagMap, TypeMap};

/// Static maps emitted by the compiler.
///
/// A container carrying a manifest answers every inspector query from
/// it instead of walking its definitions.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Manifest {
    pub service_ids: &'static [&'static str],
    pub typed_service_ids: &'static [(&'static str, &'static str)],
    pub tagged_service_ids: &'static [(&'static str, &'static [&'static str])],
}

impl Manifest {
    pub const EMPTY: Manifest = Manifest {
        service_ids: &[],
        typed_service_ids: &[],
        tagged_service_ids: &[],
    };

    pub fn service_ids(&self) -> Vec<String> {
        self.service_ids.iter().map(|id| id.to_string()).collect()
    }

    pub fn type_map(&self) -> TypeMap {
        self.typed_service_ids
            .iter()
            .map(|(type_name, id)| (type_name.to_string(), id.to_string()))
            .collect()
    }

    pub fn tag_map(&self) -> TagMap {
        self.tagged_service_ids
            .iter()
            .map(|(tag, ids)| (tag.to_string(), ids.iter().map(|id| id.to_string()).collect()))
            .collect()
    }
}

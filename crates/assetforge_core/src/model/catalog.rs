//! Reference catalog rows.

use crate::model::item::{CatalogId, TypeId};
use serde::{Deserialize, Serialize};

/// Hardware type; `code` is the middle segment of asset tags.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HardwareType {
    pub id: TypeId,
    pub name: String,
    pub code: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Location {
    pub id: CatalogId,
    pub name: String,
    pub parent_id: Option<CatalogId>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct User {
    pub id: CatalogId,
    pub name: String,
    pub email: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Group {
    pub id: CatalogId,
    pub name: String,
}

/// Finer classification under a hardware type.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SubType {
    pub id: CatalogId,
    pub name: String,
    pub type_id: Option<TypeId>,
}

/// Entry of the known-IP allow-list.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct KnownIp {
    pub id: CatalogId,
    pub address: String,
}

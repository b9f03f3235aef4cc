//! Static entity metadata and the per-type binder.
//!
//! Every mapped property of an entity type is described by a
//! [`FieldDescriptor`]; the descriptors for a type hang off its
//! [`EntityMeta`]. Value assignment goes through [`Entity::apply`], a binder
//! implemented per entity type at registration time, so no runtime
//! reflection is involved anywhere in materialization.

use crate::context::QueryContext;
use crate::core::{EngineResult, FieldType, ScalarValue};

/// One member of a flags-style choice field.
///
/// `external` is the token the backend stores when it differs from the
/// member name; `bit` is the member's position in the combined flags value.
#[derive(Debug, Clone, Copy)]
pub struct ChoiceMember {
    pub name: &'static str,
    pub external: Option<&'static str>,
    pub bit: u64,
}

impl ChoiceMember {
    pub const fn new(name: &'static str, bit: u64) -> Self {
        Self {
            name,
            external: None,
            bit,
        }
    }

    pub const fn named(name: &'static str, external: &'static str, bit: u64) -> Self {
        Self {
            name,
            external: Some(external),
            bit,
        }
    }

    /// Token as it appears in raw row data.
    pub fn token(&self) -> &'static str {
        match self.external {
            Some(t) => t,
            None => self.name,
        }
    }
}

/// Static metadata for one mapped entity property.
#[derive(Debug, Clone, Copy)]
pub struct FieldDescriptor {
    /// Property name on the entity type.
    pub property: &'static str,
    /// Backend field (column) name.
    pub field: &'static str,
    pub field_type: FieldType,
    /// Read-only properties must name a backing storage slot; assignment to
    /// one without it is a configuration error.
    pub read_only: bool,
    pub storage: Option<&'static str>,
    /// Calculated columns prefix the raw value with a `type;#` tag.
    pub calculated: bool,
    /// Companion property receiving the one permitted unrecognized choice
    /// token ("other"/fill-in escape).
    pub other_choice: Option<&'static str>,
    /// Target list for lookup-typed fields.
    pub lookup_list: Option<&'static str>,
    /// Identifier column of the target list, addressed by subqueries and
    /// by-id resolution.
    pub lookup_key: &'static str,
    /// Member table for choice-typed fields.
    pub choices: Option<&'static [ChoiceMember]>,
}

impl FieldDescriptor {
    pub const fn new(property: &'static str, field: &'static str, field_type: FieldType) -> Self {
        Self {
            property,
            field,
            field_type,
            read_only: false,
            storage: None,
            calculated: false,
            other_choice: None,
            lookup_list: None,
            lookup_key: "ID",
            choices: None,
        }
    }

    pub const fn read_only(mut self, storage: Option<&'static str>) -> Self {
        self.read_only = true;
        self.storage = storage;
        self
    }

    pub const fn calculated(mut self) -> Self {
        self.calculated = true;
        self
    }

    pub const fn with_lookup(mut self, list: &'static str) -> Self {
        self.lookup_list = Some(list);
        self
    }

    pub const fn with_lookup_key(mut self, key: &'static str) -> Self {
        self.lookup_key = key;
        self
    }

    pub const fn with_choices(mut self, members: &'static [ChoiceMember]) -> Self {
        self.choices = Some(members);
        self
    }

    pub const fn with_other(mut self, property: &'static str) -> Self {
        self.other_choice = Some(property);
        self
    }
}

/// Static metadata for one mapped entity type.
#[derive(Debug)]
pub struct EntityMeta {
    /// Backend list name.
    pub list: &'static str,
    /// Version token recorded when the mapping was generated.
    pub version: &'static str,
    /// List-level version-check override; `None` falls through to the
    /// type-level default.
    pub check_version: Option<bool>,
    /// Primary-key descriptor (a counter column, also present in `fields`).
    pub key: &'static FieldDescriptor,
    pub fields: &'static [FieldDescriptor],
}

impl EntityMeta {
    /// Look up a descriptor by backend field name.
    pub fn field_by_name(&self, field: &str) -> Option<&'static FieldDescriptor> {
        self.fields.iter().find(|fd| fd.field == field)
    }

    /// Look up a descriptor by entity property name.
    pub fn field_by_property(&self, property: &str) -> Option<&'static FieldDescriptor> {
        self.fields.iter().find(|fd| fd.property == property)
    }

    /// Every mapped backend field, de-duplicated at field-name level.
    /// Distinct properties may share one column (a multi-choice field and
    /// its companion often do not, but duplicate detection stays by name).
    pub fn mapped_projection(&self) -> Vec<String> {
        let mut fields = Vec::with_capacity(self.fields.len());
        for fd in self.fields {
            if !fields.iter().any(|f| f == fd.field) {
                fields.push(fd.field.to_string());
            }
        }
        fields
    }
}

/// Decoded value handed to an entity binder.
///
/// Lookup variants carry bare foreign ids; the binder wraps them in typed
/// lazy references using the context. `Flags` carries the OR of the
/// recognized choice members' bits.
#[derive(Debug, Clone, PartialEq)]
pub enum FieldValue {
    Scalar(ScalarValue),
    Lookup(i64),
    LookupMulti(Vec<i64>),
    Flags(u64),
}

/// A mapped entity type.
///
/// `apply` is the registration-built binder: given a descriptor from
/// `meta().fields` and a decoded value, it writes the matching property
/// (or backing storage slot) directly.
pub trait Entity: Default + 'static {
    fn meta() -> &'static EntityMeta;

    /// Type-level default for the version-consistency gate. Overridden by a
    /// list-level `check_version` and, above that, the context setting.
    fn check_version_default() -> bool {
        true
    }

    fn apply(
        &mut self,
        field: &FieldDescriptor,
        value: FieldValue,
        ctx: &QueryContext,
    ) -> EngineResult<()>;
}

//! Type-directed reconstruction of entities from raw rows.
//!
//! `get_item` is the only way a row becomes an entity: a key hit in the
//! source's identity cache returns the live instance without reading the
//! rest of the row; a miss allocates, populates field by field, and inserts
//! into the cache exactly once. Assignment goes through the entity's binder
//! ([`Entity::apply`]); a column missing from the row is the one tolerated
//! soft condition and is skipped silently.

use crate::context::{ListSource, QueryContext};
use crate::core::{EngineError, EngineResult, FieldType, ScalarValue};
use crate::metadata::{Entity, FieldDescriptor, FieldValue};
use crate::provider::Row;
use std::cell::RefCell;
use std::rc::Rc;

/// Raw-value delimiter between multi-value chunks and inside calculated
/// column prefixes.
const CHUNK_DELIMITER: &str = ";#";

pub struct Materializer<'a, T: Entity> {
    ctx: &'a QueryContext,
    source: Rc<ListSource<T>>,
}

impl<'a, T: Entity> Materializer<'a, T> {
    pub fn new(ctx: &'a QueryContext) -> Self {
        Self {
            ctx,
            source: ctx.source::<T>(),
        }
    }

    /// Materialize one row, with identity-cache semantics on the primary key.
    pub fn get_item(&self, row: &Row) -> EngineResult<Rc<RefCell<T>>> {
        let meta = T::meta();
        let raw_key = row.get(meta.key.field).ok_or_else(|| {
            EngineError::shape(format!(
                "row from list '{}' is missing its key column '{}'",
                meta.list, meta.key.field
            ))
        })?;
        let id = raw_key.trim().parse::<i64>().map_err(|_| {
            EngineError::shape(format!("invalid primary key value '{raw_key}'"))
        })?;

        if let Some(hit) = self.source.cache().get(id) {
            return Ok(hit);
        }

        let mut entity = T::default();
        self.populate(&mut entity, row)?;
        let entity = Rc::new(RefCell::new(entity));
        self.source.cache().insert(id, Rc::clone(&entity));
        Ok(entity)
    }

    fn populate(&self, entity: &mut T, row: &Row) -> EngineResult<()> {
        for fd in T::meta().fields {
            let Some(raw) = row.get(fd.field) else {
                // Sparse view: the column was not part of this row.
                continue;
            };
            self.assign(entity, fd, raw)?;
        }
        Ok(())
    }

    fn assign(&self, entity: &mut T, fd: &FieldDescriptor, raw: &str) -> EngineResult<()> {
        if fd.read_only && fd.storage.is_none() {
            return Err(EngineError::configuration(format!(
                "read-only property '{}' has no backing storage field",
                fd.property
            )));
        }

        let raw = if fd.calculated {
            strip_calculated_tag(raw)?
        } else {
            raw
        };

        match fd.field_type {
            FieldType::Boolean
            | FieldType::DateTime
            | FieldType::Counter
            | FieldType::Number
            | FieldType::Integer
            | FieldType::Url
            | FieldType::Text => {
                let value = ScalarValue::parse(fd.field_type, raw)?;
                entity.apply(fd, FieldValue::Scalar(value), self.ctx)
            }
            FieldType::Choice | FieldType::MultiChoice => self.assign_choice(entity, fd, raw),
            FieldType::Lookup => {
                let id = parse_lookup_chunk(raw)?;
                entity.apply(fd, FieldValue::Lookup(id), self.ctx)
            }
            FieldType::LookupMulti => {
                let mut ids = Vec::new();
                for chunk in raw.split(CHUNK_DELIMITER).filter(|c| !c.is_empty()) {
                    ids.push(parse_lookup_chunk(chunk)?);
                }
                entity.apply(fd, FieldValue::LookupMulti(ids), self.ctx)
            }
        }
    }

    /// Flags-style decoding: intersect the raw tokens with the member table,
    /// OR the recognized bits, and route the one permitted leftover token to
    /// the companion "other" property.
    fn assign_choice(&self, entity: &mut T, fd: &FieldDescriptor, raw: &str) -> EngineResult<()> {
        let members = fd.choices.ok_or_else(|| {
            EngineError::configuration(format!(
                "choice property '{}' has no member table",
                fd.property
            ))
        })?;

        let mut flags = 0u64;
        let mut leftovers: Vec<&str> = Vec::new();
        for token in raw.split(CHUNK_DELIMITER).filter(|t| !t.is_empty()) {
            match members.iter().find(|m| m.token() == token) {
                Some(member) => flags |= member.bit,
                None => leftovers.push(token),
            }
        }

        if leftovers.len() > 1 {
            return Err(EngineError::shape(format!(
                "property '{}' has {} unrecognized choice tokens, at most one is permitted",
                fd.property,
                leftovers.len()
            )));
        }

        entity.apply(fd, FieldValue::Flags(flags), self.ctx)?;

        if let Some(token) = leftovers.first() {
            let other_property = fd.other_choice.ok_or_else(|| {
                EngineError::shape(format!(
                    "unrecognized token '{token}' on property '{}' with no companion property",
                    fd.property
                ))
            })?;
            let other_fd = T::meta().field_by_property(other_property).ok_or_else(|| {
                EngineError::configuration(format!(
                    "companion property '{other_property}' is not mapped"
                ))
            })?;
            entity.apply(
                other_fd,
                FieldValue::Scalar(ScalarValue::Text(token.to_string())),
                self.ctx,
            )?;
        }
        Ok(())
    }
}

/// Calculated columns carry a `type;#value` prefix; only the value part is
/// real data.
fn strip_calculated_tag(raw: &str) -> EngineResult<&str> {
    raw.split_once(CHUNK_DELIMITER)
        .map(|(_, value)| value)
        .ok_or_else(|| {
            EngineError::shape(format!("calculated value '{raw}' is missing its type tag"))
        })
}

/// A lookup chunk is `id#display`; only the id matters.
fn parse_lookup_chunk(chunk: &str) -> EngineResult<i64> {
    let id_text = chunk.split('#').next().unwrap_or("");
    id_text
        .trim()
        .parse::<i64>()
        .map_err(|_| EngineError::shape(format!("invalid lookup value '{chunk}'")))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_strip_calculated_tag() {
        assert_eq!(strip_calculated_tag("float;#42.5").unwrap(), "42.5");
        assert_eq!(strip_calculated_tag("string;#a;#b").unwrap(), "a;#b");
        assert!(strip_calculated_tag("42.5").is_err());
    }

    #[test]
    fn test_parse_lookup_chunk() {
        assert_eq!(parse_lookup_chunk("42#Display Name").unwrap(), 42);
        assert_eq!(parse_lookup_chunk("7").unwrap(), 7);
        assert!(parse_lookup_chunk("#NoId").is_err());
        assert!(parse_lookup_chunk("x#y").is_err());
    }
}

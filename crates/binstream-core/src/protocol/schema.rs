//! Wire-type descriptors, field schemas, and the process-wide schema registry.
//!
//! A struct declares its fields once through [`WireStruct::declare`].  The
//! first encode or decode of that type builds a [`Schema`] from the
//! declaration, validates it, and caches it for the rest of the process.
//!
//! # Concurrency
//!
//! The cache is an `RwLock<HashMap<TypeId, Arc<Schema>>>`.  Schemas are built
//! without holding the lock; the write lock is only taken to insert the
//! finished schema, and the first insert wins.  Two threads racing on the
//! same type compute identical schemas, so losing the race is harmless.
//! Callers receive an `Arc<Schema>` and never hold the lock while encoding.

use std::any::TypeId;
use std::collections::{HashMap, HashSet};
use std::fmt;
use std::sync::{Arc, OnceLock, PoisonError, RwLock};

use tracing::{debug, warn};

use crate::protocol::cursor::LENGTH_PREFIX_SIZE;
use crate::protocol::error::{CodecError, Result};
use crate::protocol::message::WireStruct;

// ── Descriptors ───────────────────────────────────────────────────────────────

/// Handle to a struct type that can appear as a nested field.
#[derive(Clone, Copy)]
pub struct StructType {
    id: TypeId,
    name: &'static str,
    declare: fn(&mut SchemaBuilder),
}

impl StructType {
    pub fn of<T: WireStruct>() -> Self {
        Self {
            id: TypeId::of::<T>(),
            name: std::any::type_name::<T>(),
            declare: T::declare,
        }
    }

    pub fn type_id(&self) -> TypeId {
        self.id
    }

    /// Fully qualified Rust type name.
    pub fn name(&self) -> &'static str {
        self.name
    }
}

impl PartialEq for StructType {
    fn eq(&self, other: &Self) -> bool {
        self.id == other.id
    }
}

impl Eq for StructType {}

impl fmt::Debug for StructType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("StructType").field(&self.name).finish()
    }
}

/// How a field is laid out on the wire.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum WireType {
    Int8,
    Int16,
    Int32,
    UInt8,
    UInt16,
    UInt32,
    Float32,
    Float64,
    /// `[len:u16][utf8 bytes]`
    Text,
    /// The nested struct's own encoding, inline.
    Nested(StructType),
    /// `[count:u16][elem]...`
    Array(Box<WireType>),
    /// `[count:u16][key][value]...`
    Map(Box<WireType>, Box<WireType>),
}

impl WireType {
    pub fn nested<T: WireStruct>() -> Self {
        WireType::Nested(StructType::of::<T>())
    }

    pub fn array(element: WireType) -> Self {
        WireType::Array(Box::new(element))
    }

    pub fn map(key: WireType, value: WireType) -> Self {
        WireType::Map(Box::new(key), Box::new(value))
    }

    /// Width in bytes for fixed-width scalars, `None` otherwise.
    pub fn fixed_width(&self) -> Option<usize> {
        match self {
            WireType::Int8 | WireType::UInt8 => Some(1),
            WireType::Int16 | WireType::UInt16 => Some(2),
            WireType::Int32 | WireType::UInt32 | WireType::Float32 => Some(4),
            WireType::Float64 => Some(8),
            WireType::Text | WireType::Nested(_) | WireType::Array(_) | WireType::Map(..) => None,
        }
    }

    pub fn name(&self) -> &'static str {
        match self {
            WireType::Int8 => "Int8",
            WireType::Int16 => "Int16",
            WireType::Int32 => "Int32",
            WireType::UInt8 => "UInt8",
            WireType::UInt16 => "UInt16",
            WireType::UInt32 => "UInt32",
            WireType::Float32 => "Float32",
            WireType::Float64 => "Float64",
            WireType::Text => "Text",
            WireType::Nested(_) => "Nested",
            WireType::Array(_) => "Array",
            WireType::Map(..) => "Map",
        }
    }
}

// ── Schema ────────────────────────────────────────────────────────────────────

/// One declared field.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FieldDecl {
    pub name: &'static str,
    pub wire: WireType,
}

/// Collects field declarations in wire order.
#[derive(Debug, Default)]
pub struct SchemaBuilder {
    fields: Vec<FieldDecl>,
}

impl SchemaBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Appends a field.  Call order is wire order.
    pub fn field(&mut self, name: &'static str, wire: WireType) -> &mut Self {
        self.fields.push(FieldDecl { name, wire });
        self
    }
}

/// Validated, ordered field layout of one struct type.
#[derive(Debug, PartialEq)]
pub struct Schema {
    type_name: &'static str,
    fields: Vec<FieldDecl>,
    min_encoded_len: usize,
}

impl Schema {
    pub fn type_name(&self) -> &'static str {
        self.type_name
    }

    /// Fields in wire order.
    pub fn fields(&self) -> &[FieldDecl] {
        &self.fields
    }

    /// Smallest possible encoding: every collection empty, every text blank.
    pub fn min_encoded_len(&self) -> usize {
        self.min_encoded_len
    }
}

// ── Registry ──────────────────────────────────────────────────────────────────

static GLOBAL: OnceLock<SchemaRegistry> = OnceLock::new();

/// Cache of built schemas keyed by struct type.
///
/// Most callers use [`SchemaRegistry::global`]; a private registry is useful
/// in tests that want to observe a cold cache.
#[derive(Debug, Default)]
pub struct SchemaRegistry {
    schemas: RwLock<HashMap<TypeId, Arc<Schema>>>,
}

impl SchemaRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// The process-wide registry.  Lives until the process exits.
    pub fn global() -> &'static SchemaRegistry {
        GLOBAL.get_or_init(SchemaRegistry::new)
    }

    /// Returns the schema for `T`, building and caching it on first use.
    ///
    /// # Errors
    ///
    /// [`CodecError::DuplicateFieldName`] or [`CodecError::CyclicSchema`] if the
    /// declaration of `T`, or of any struct it nests, is invalid.
    pub fn schema_of<T: WireStruct>(&self) -> Result<Arc<Schema>> {
        self.resolve(StructType::of::<T>())
    }

    /// Returns the schema for the struct behind `ty`.
    pub fn resolve(&self, ty: StructType) -> Result<Arc<Schema>> {
        if let Some(schema) = self.cached(ty.id) {
            return Ok(schema);
        }
        let mut in_progress = Vec::new();
        self.build(ty, &mut in_progress).map_err(|e| {
            warn!("schema build for {} failed: {e}", ty.name);
            e
        })
    }

    /// Number of cached schemas.
    pub fn len(&self) -> usize {
        self.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Smallest number of bytes a value of `wire` can occupy.
    pub fn min_encoded_len(&self, wire: &WireType) -> Result<usize> {
        self.min_len(wire, &mut Vec::new())
    }

    fn cached(&self, id: TypeId) -> Option<Arc<Schema>> {
        self.read().get(&id).cloned()
    }

    // A panic elsewhere cannot leave the map half-updated: every mutation is
    // a single insert.
    fn read(&self) -> std::sync::RwLockReadGuard<'_, HashMap<TypeId, Arc<Schema>>> {
        self.schemas.read().unwrap_or_else(PoisonError::into_inner)
    }

    fn build(&self, ty: StructType, in_progress: &mut Vec<StructType>) -> Result<Arc<Schema>> {
        if in_progress.contains(&ty) {
            let path = in_progress
                .iter()
                .skip_while(|t| **t != ty)
                .map(|t| t.name)
                .chain(std::iter::once(ty.name))
                .collect::<Vec<_>>()
                .join(" -> ");
            return Err(CodecError::CyclicSchema { path });
        }
        if let Some(schema) = self.cached(ty.id) {
            return Ok(schema);
        }

        let mut builder = SchemaBuilder::new();
        (ty.declare)(&mut builder);

        let mut seen = HashSet::with_capacity(builder.fields.len());
        for decl in &builder.fields {
            if !seen.insert(decl.name) {
                return Err(CodecError::DuplicateFieldName {
                    type_name: ty.name,
                    field: decl.name,
                });
            }
        }

        in_progress.push(ty);
        let mut min_encoded_len = 0;
        for decl in &builder.fields {
            min_encoded_len += self.min_len(&decl.wire, in_progress)?;
        }
        in_progress.pop();

        let schema = Arc::new(Schema {
            type_name: ty.name,
            fields: builder.fields,
            min_encoded_len,
        });

        let mut schemas = self.schemas.write().unwrap_or_else(PoisonError::into_inner);
        let cached = Arc::clone(schemas.entry(ty.id).or_insert(schema));
        drop(schemas);

        debug!(
            "schema for {} cached: {} fields, min {} bytes",
            ty.name,
            cached.fields.len(),
            cached.min_encoded_len
        );
        Ok(cached)
    }

    /// Walks `wire`, building nested schemas so cycles are found even when
    /// the nesting sits inside a collection.
    fn min_len(&self, wire: &WireType, in_progress: &mut Vec<StructType>) -> Result<usize> {
        match wire {
            WireType::Nested(ty) => Ok(self.build(*ty, in_progress)?.min_encoded_len),
            WireType::Array(element) => {
                self.min_len(element, in_progress)?;
                Ok(LENGTH_PREFIX_SIZE)
            }
            WireType::Map(key, value) => {
                self.min_len(key, in_progress)?;
                self.min_len(value, in_progress)?;
                Ok(LENGTH_PREFIX_SIZE)
            }
            WireType::Text => Ok(LENGTH_PREFIX_SIZE),
            scalar => Ok(scalar.fixed_width().unwrap_or(0)),
        }
    }
}

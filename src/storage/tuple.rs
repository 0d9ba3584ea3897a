// Tuple and field primitives
//
// Fields are fixed-width on disk so heap pages can slot tuples without a
// per-record length table: integers take 4 bytes, text takes a 4-byte
// length prefix plus TEXT_CAPACITY payload bytes.

use std::fmt;
use std::io::Cursor;

use byteorder::{LittleEndian, ReadBytesExt};

use crate::common::error::{DbError, DbResult};
use crate::execution::predicate::PredOp;
use crate::storage::page::PageId;

/// Maximum stored length of a text field, in bytes. Longer values are
/// truncated on insert.
pub const TEXT_CAPACITY: usize = 128;

/// Column types supported by the engine
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Type {
    Int,
    Text,
}

impl Type {
    /// On-disk size of a field of this type, in bytes.
    pub fn size(&self) -> usize {
        match self {
            Type::Int => 4,
            Type::Text => 4 + TEXT_CAPACITY,
        }
    }
}

impl fmt::Display for Type {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Type::Int => write!(f, "INT"),
            Type::Text => write!(f, "TEXT"),
        }
    }
}

/// A single typed value
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Field {
    Int(i32),
    Text(String),
}

impl Field {
    pub fn field_type(&self) -> Type {
        match self {
            Field::Int(_) => Type::Int,
            Field::Text(_) => Type::Text,
        }
    }

    /// Evaluate `self op other`. Comparing fields of different types is a
    /// structural error.
    pub fn compare(&self, op: PredOp, other: &Field) -> DbResult<bool> {
        match (self, other) {
            (Field::Int(a), Field::Int(b)) => Ok(op.apply_ord(a.cmp(b))),
            (Field::Text(a), Field::Text(b)) => Ok(op.apply_ord(a.cmp(b))),
            _ => Err(DbError::InvalidOperation(format!(
                "cannot compare {} with {}",
                self.field_type(),
                other.field_type()
            ))),
        }
    }

    /// Serialize this field into `buf` at its fixed width.
    pub fn write_to(&self, buf: &mut Vec<u8>) {
        match self {
            Field::Int(v) => {
                buf.extend_from_slice(&v.to_le_bytes());
            }
            Field::Text(s) => {
                let bytes = s.as_bytes();
                let len = bytes.len().min(TEXT_CAPACITY);
                buf.extend_from_slice(&(len as u32).to_le_bytes());
                buf.extend_from_slice(&bytes[..len]);
                buf.extend(std::iter::repeat(0u8).take(TEXT_CAPACITY - len));
            }
        }
    }

    /// Deserialize a field of the given type from `cursor`.
    pub fn read_from(cursor: &mut Cursor<&[u8]>, field_type: Type) -> DbResult<Field> {
        match field_type {
            Type::Int => Ok(Field::Int(cursor.read_i32::<LittleEndian>()?)),
            Type::Text => {
                let len = cursor.read_u32::<LittleEndian>()? as usize;
                if len > TEXT_CAPACITY {
                    return Err(DbError::InvalidOperation(format!(
                        "text field length {} exceeds capacity",
                        len
                    )));
                }
                let mut payload = vec![0u8; TEXT_CAPACITY];
                std::io::Read::read_exact(cursor, &mut payload)?;
                payload.truncate(len);
                let s = String::from_utf8(payload)
                    .map_err(|e| DbError::InvalidOperation(format!("invalid utf8 in text field: {}", e)))?;
                Ok(Field::Text(s))
            }
        }
    }
}

impl fmt::Display for Field {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Field::Int(v) => write!(f, "{}", v),
            Field::Text(s) => write!(f, "{}", s),
        }
    }
}

/// Schema of a tuple: an ordered list of typed, named columns.
///
/// Equality compares types only; column names are cosmetic and two
/// schemas that agree on types are interchangeable for storage purposes.
#[derive(Debug, Clone, Eq)]
pub struct TupleDesc {
    types: Vec<Type>,
    names: Vec<String>,
}

impl PartialEq for TupleDesc {
    fn eq(&self, other: &Self) -> bool {
        self.types == other.types
    }
}

impl TupleDesc {
    pub fn new(types: Vec<Type>, names: Vec<String>) -> Self {
        debug_assert_eq!(types.len(), names.len());
        TupleDesc { types, names }
    }

    /// Schema with auto-generated column names, for intermediate results.
    pub fn unnamed(types: Vec<Type>) -> Self {
        let names = (0..types.len()).map(|i| format!("col{}", i)).collect();
        TupleDesc { types, names }
    }

    pub fn num_fields(&self) -> usize {
        self.types.len()
    }

    pub fn field_type(&self, i: usize) -> Type {
        self.types[i]
    }

    pub fn field_name(&self, i: usize) -> &str {
        &self.names[i]
    }

    /// Index of the named column, if present.
    pub fn field_index(&self, name: &str) -> Option<usize> {
        self.names.iter().position(|n| n == name)
    }

    /// On-disk size of one tuple with this schema, in bytes.
    pub fn tuple_size(&self) -> usize {
        self.types.iter().map(|t| t.size()).sum()
    }

    pub fn types(&self) -> &[Type] {
        &self.types
    }
}

/// Location of a stored tuple: owning page plus slot index.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct RecordId {
    pub page_id: PageId,
    pub slot: usize,
}

/// A row of typed values, optionally pinned to a storage location.
#[derive(Debug, Clone, PartialEq)]
pub struct Tuple {
    desc: TupleDesc,
    fields: Vec<Field>,
    record_id: Option<RecordId>,
}

impl Tuple {
    pub fn new(desc: TupleDesc, fields: Vec<Field>) -> Self {
        debug_assert_eq!(desc.num_fields(), fields.len());
        Tuple {
            desc,
            fields,
            record_id: None,
        }
    }

    pub fn desc(&self) -> &TupleDesc {
        &self.desc
    }

    pub fn field(&self, i: usize) -> &Field {
        &self.fields[i]
    }

    pub fn fields(&self) -> &[Field] {
        &self.fields
    }

    pub fn record_id(&self) -> Option<RecordId> {
        self.record_id
    }

    pub fn set_record_id(&mut self, rid: Option<RecordId>) {
        self.record_id = rid;
    }

    /// Serialize the tuple's fields at their fixed widths.
    pub fn to_bytes(&self) -> Vec<u8> {
        let mut buf = Vec::with_capacity(self.desc.tuple_size());
        for field in &self.fields {
            field.write_to(&mut buf);
        }
        buf
    }

    /// Deserialize a tuple with the given schema from `data`.
    pub fn from_bytes(desc: &TupleDesc, data: &[u8]) -> DbResult<Tuple> {
        let mut cursor = Cursor::new(data);
        let mut fields = Vec::with_capacity(desc.num_fields());
        for i in 0..desc.num_fields() {
            fields.push(Field::read_from(&mut cursor, desc.field_type(i))?);
        }
        Ok(Tuple::new(desc.clone(), fields))
    }
}

impl fmt::Display for Tuple {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let rendered: Vec<String> = self.fields.iter().map(|v| v.to_string()).collect();
        write!(f, "({})", rendered.join(", "))
    }
}

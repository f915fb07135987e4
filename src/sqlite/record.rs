//! Record format decoding.
//!
//! A leaf cell's payload is a record: a header of varints followed by a body
//! of column values.
//!
//! ```text
//! | header size | type 1 | type 2 | ... | type N | value 1 | value 2 | ... | value N |
//! |<---------------- header ------------------->|<----------- body ------------>|
//! ```
//!
//! The header size varint counts itself. Each serial type fixes both the
//! storage class and the number of body bytes its value occupies, so values
//! are decoded front to back in column order.

use std::fmt;

use byteorder::{BigEndian, ByteOrder};
use serde::{Serialize, Serializer};

use crate::sqlite::varint::{read_twos_complement, read_varint};
use crate::util::hex::format_bytes;
use crate::SqlbError;

/// One column value.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum Value {
    Null,
    Integer(i64),
    Real(f64),
    #[serde(serialize_with = "serialize_blob")]
    Blob(Vec<u8>),
    Text(String),
}

#[allow(clippy::ptr_arg)]
fn serialize_blob<S: Serializer>(data: &Vec<u8>, s: S) -> Result<S::Ok, S::Error> {
    s.serialize_str(&format!("x'{}'", format_bytes(data)))
}

impl Value {
    /// Storage class name as used by SQLite's `typeof()`.
    pub fn type_name(&self) -> &'static str {
        match self {
            Value::Null => "null",
            Value::Integer(_) => "integer",
            Value::Real(_) => "real",
            Value::Blob(_) => "blob",
            Value::Text(_) => "text",
        }
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Null => write!(f, "NULL"),
            Value::Integer(v) => write!(f, "{}", v),
            Value::Real(v) => write!(f, "{}", v),
            Value::Blob(b) => write!(f, "x'{}'", format_bytes(b)),
            Value::Text(s) => write!(f, "{}", s),
        }
    }
}

/// Body size in bytes of a value with the given serial type.
///
/// # Examples
///
/// ```
/// use sqlb::sqlite::record::serial_type_size;
///
/// assert_eq!(serial_type_size(0).unwrap(), 0);
/// assert_eq!(serial_type_size(5).unwrap(), 6);
/// assert_eq!(serial_type_size(23).unwrap(), 5); // text of length 5
/// assert!(serial_type_size(10).is_err());
/// ```
pub fn serial_type_size(serial_type: u64) -> Result<usize, SqlbError> {
    Ok(match serial_type {
        0 | 8 | 9 => 0,
        1 => 1,
        2 => 2,
        3 => 3,
        4 => 4,
        5 => 6,
        6 | 7 => 8,
        10 | 11 => return Err(SqlbError::UnsupportedSerialType(serial_type)),
        n if n % 2 == 0 => ((n - 12) / 2) as usize,
        n => ((n - 13) / 2) as usize,
    })
}

/// The decoded columns of one row, in table column order.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(transparent)]
pub struct Record {
    values: Vec<Value>,
}

impl Record {
    /// Decode a record from a complete payload.
    ///
    /// # Examples
    ///
    /// ```
    /// use sqlb::sqlite::record::{Record, Value};
    ///
    /// // header: size 3, serial types 1 (int8) and 23 (text, 5 bytes)
    /// let payload = [3, 1, 23, 0x7b, b'h', b'e', b'l', b'l', b'o'];
    /// let record = Record::decode(&payload).unwrap();
    /// assert_eq!(
    ///     record.values(),
    ///     &[Value::Integer(123), Value::Text("hello".to_string())]
    /// );
    /// ```
    pub fn decode(payload: &[u8]) -> Result<Self, SqlbError> {
        let (header_size, consumed) = read_varint(payload)
            .map_err(|_| SqlbError::MalformedRecord("Missing record header size".to_string()))?;
        if header_size < consumed as i64 || header_size as u64 > payload.len() as u64 {
            return Err(SqlbError::MalformedRecord(format!(
                "Header size {} outside payload of {} bytes",
                header_size,
                payload.len()
            )));
        }
        let header_size = header_size as usize;

        let mut types = &payload[consumed..header_size];
        let mut body = &payload[header_size..];
        let mut values = Vec::new();

        while !types.is_empty() {
            let (serial_type, n) = read_varint(types).map_err(|_| {
                SqlbError::MalformedRecord(format!(
                    "Truncated serial type in column {}",
                    values.len()
                ))
            })?;
            types = &types[n..];

            let serial_type = serial_type as u64;
            let size = serial_type_size(serial_type)?;
            if size > body.len() {
                return Err(SqlbError::MalformedRecord(format!(
                    "Column {} needs {} bytes, {} left in body",
                    values.len(),
                    size,
                    body.len()
                )));
            }
            let (data, rest) = body.split_at(size);
            body = rest;
            values.push(decode_value(serial_type, data)?);
        }

        Ok(Record { values })
    }

    /// Column values in order.
    pub fn values(&self) -> &[Value] {
        &self.values
    }

    /// Value of column `index`, if the record has that many columns.
    pub fn get(&self, index: usize) -> Option<&Value> {
        self.values.get(index)
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    pub fn into_values(self) -> Vec<Value> {
        self.values
    }
}

impl fmt::Display for Record {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (i, v) in self.values.iter().enumerate() {
            if i > 0 {
                write!(f, "|")?;
            }
            write!(f, "{}", v)?;
        }
        Ok(())
    }
}

/// Decode one value; `data` is exactly [`serial_type_size`] bytes long.
fn decode_value(serial_type: u64, data: &[u8]) -> Result<Value, SqlbError> {
    Ok(match serial_type {
        0 => Value::Null,
        1 => Value::Integer(data[0] as i8 as i64),
        2 => Value::Integer(BigEndian::read_i16(data) as i64),
        3 => Value::Integer(read_twos_complement(data, 3)?),
        4 => Value::Integer(BigEndian::read_i32(data) as i64),
        5 => Value::Integer(read_twos_complement(data, 6)?),
        6 => Value::Integer(BigEndian::read_i64(data)),
        7 => Value::Real(BigEndian::read_f64(data)),
        8 => Value::Integer(0),
        9 => Value::Integer(1),
        n if n % 2 == 0 => Value::Blob(data.to_vec()),
        _ => Value::Text(String::from_utf8_lossy(data).into_owned()),
    })
}

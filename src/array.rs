//! The columnar data model: typed arrays, chunked columns, schemas and
//! tables.
//!
//! `Array` is a validity-bitmap-backed, chunk-aware column enum, with a
//! `Boolean` variant for the evaluator's mask/predicate results — a kind
//! a CSV-sourced `Table` never produces itself, but one the expression
//! engine needs as a first-class column type.

use std::fmt;

/// The logical element type of an [`Array`]/[`ChunkedArray`].
///
/// `Boolean` never appears in a `Table` built directly from CSV (table
/// construction only ever produces `Int64`/`Float64`/`String` columns),
/// but it is a normal citizen of the expression evaluator, whose
/// predicates and boolean combinators produce boolean columns. Keeping
/// one enum for both makes numeric promotion and type-checking share a
/// single vocabulary.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum DataType {
    Int64,
    Float64,
    String,
    Boolean,
}

impl fmt::Display for DataType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            DataType::Int64 => "int64",
            DataType::Float64 => "float64",
            DataType::String => "string",
            DataType::Boolean => "boolean",
        };
        f.write_str(name)
    }
}

/// A packed, one-bit-per-slot validity bitmap: `1` means valid, `0` means
/// null. `None` on an [`Array`] is shorthand for "all bits set".
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Bitmap {
    bits: Vec<u8>,
    len: usize,
}

impl Bitmap {
    pub fn with_capacity(capacity: usize) -> Self {
        Bitmap {
            bits: Vec::with_capacity((capacity + 7) / 8),
            len: 0,
        }
    }

    pub fn all_valid(len: usize) -> Self {
        let mut bm = Bitmap::with_capacity(len);
        for _ in 0..len {
            bm.push(true);
        }
        bm
    }

    pub fn len(&self) -> usize {
        self.len
    }

    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    pub fn push(&mut self, valid: bool) {
        let bit_index = self.len % 8;
        if bit_index == 0 {
            self.bits.push(0);
        }
        if valid {
            let last = self.bits.last_mut().expect("just pushed a byte");
            *last |= 1 << bit_index;
        }
        self.len += 1;
    }

    pub fn get(&self, index: usize) -> bool {
        assert!(index < self.len, "validity bitmap index out of bounds");
        let byte = self.bits[index / 8];
        (byte >> (index % 8)) & 1 == 1
    }

    pub fn set(&mut self, index: usize, valid: bool) {
        assert!(index < self.len, "validity bitmap index out of bounds");
        let byte = &mut self.bits[index / 8];
        if valid {
            *byte |= 1 << (index % 8);
        } else {
            *byte &= !(1 << (index % 8));
        }
    }

    pub fn iter(&self) -> impl Iterator<Item = bool> + '_ {
        (0..self.len).map(move |i| self.get(i))
    }
}

impl FromIterator<bool> for Bitmap {
    fn from_iter<I: IntoIterator<Item = bool>>(iter: I) -> Self {
        let mut bm = Bitmap::with_capacity(0);
        for v in iter {
            bm.push(v);
        }
        bm
    }
}

macro_rules! typed_array {
    ($name:ident, $elem:ty, $zero:expr) => {
        #[derive(Debug, Clone, PartialEq)]
        pub struct $name {
            pub values: Vec<$elem>,
            pub validity: Option<Bitmap>,
        }

        impl $name {
            pub fn new(values: Vec<$elem>, validity: Option<Bitmap>) -> Self {
                if let Some(bm) = &validity {
                    assert_eq!(bm.len(), values.len(), "validity length must match values");
                }
                $name { values, validity }
            }

            pub fn all_valid(values: Vec<$elem>) -> Self {
                $name {
                    values,
                    validity: None,
                }
            }

            pub fn len(&self) -> usize {
                self.values.len()
            }

            pub fn is_empty(&self) -> bool {
                self.values.is_empty()
            }

            pub fn is_valid(&self, index: usize) -> bool {
                match &self.validity {
                    Some(bm) => bm.get(index),
                    None => index < self.values.len(),
                }
            }

            /// Builder used while materializing rows one at a time; pushes
            /// a null placeholder (`$zero`) plus a `false` validity bit.
            /// The validity bit is pushed *before* the value so that a
            /// lazily-created bitmap (see `validity_mut`) is initialized
            /// over the correct, not-yet-extended, length.
            pub fn push_null(&mut self) {
                self.validity_mut().push(false);
                self.values.push($zero);
            }

            pub fn push_value(&mut self, value: $elem) {
                if let Some(bm) = self.validity.as_mut() {
                    bm.push(true);
                }
                self.values.push(value);
            }

            fn validity_mut(&mut self) -> &mut Bitmap {
                if self.validity.is_none() {
                    self.validity = Some(Bitmap::all_valid(self.values.len()));
                }
                self.validity.as_mut().unwrap()
            }

            pub fn empty(nullable: bool) -> Self {
                $name {
                    values: Vec::new(),
                    validity: if nullable {
                        Some(Bitmap::with_capacity(0))
                    } else {
                        None
                    },
                }
            }
        }
    };
}

typed_array!(Int64Array, i64, 0);
typed_array!(Float64Array, f64, 0.0);
typed_array!(StringArray, String, String::new());
typed_array!(BooleanArray, bool, false);

/// A single, contiguous, typed column with a validity bitmap.
#[derive(Debug, Clone, PartialEq)]
pub enum Array {
    Int64(Int64Array),
    Float64(Float64Array),
    String(StringArray),
    Boolean(BooleanArray),
}

impl Array {
    pub fn data_type(&self) -> DataType {
        match self {
            Array::Int64(_) => DataType::Int64,
            Array::Float64(_) => DataType::Float64,
            Array::String(_) => DataType::String,
            Array::Boolean(_) => DataType::Boolean,
        }
    }

    pub fn len(&self) -> usize {
        match self {
            Array::Int64(a) => a.len(),
            Array::Float64(a) => a.len(),
            Array::String(a) => a.len(),
            Array::Boolean(a) => a.len(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn is_valid(&self, index: usize) -> bool {
        match self {
            Array::Int64(a) => a.is_valid(index),
            Array::Float64(a) => a.is_valid(index),
            Array::String(a) => a.is_valid(index),
            Array::Boolean(a) => a.is_valid(index),
        }
    }

    /// Returns the value at `index` as a [`Scalar`], or `Scalar::Null` if
    /// the slot is null.
    pub fn scalar_at(&self, index: usize) -> Scalar {
        if !self.is_valid(index) {
            return Scalar::Null;
        }
        match self {
            Array::Int64(a) => Scalar::Int64(a.values[index]),
            Array::Float64(a) => Scalar::Float64(a.values[index]),
            Array::String(a) => Scalar::String(a.values[index].clone()),
            Array::Boolean(a) => Scalar::Boolean(a.values[index]),
        }
    }
}

/// A logically concatenated column represented as an ordered list of
/// physical [`Array`] chunks, all of the same [`DataType`]. A
/// single-chunk `ChunkedArray` is the degenerate, un-chunked case.
#[derive(Debug, Clone, PartialEq)]
pub struct ChunkedArray {
    chunks: Vec<Array>,
}

impl ChunkedArray {
    pub fn new(chunks: Vec<Array>) -> Self {
        if let Some(first) = chunks.first() {
            let ty = first.data_type();
            debug_assert!(
                chunks.iter().all(|c| c.data_type() == ty),
                "all chunks of a ChunkedArray must share a data type"
            );
        }
        ChunkedArray { chunks }
    }

    pub fn from_array(array: Array) -> Self {
        ChunkedArray {
            chunks: vec![array],
        }
    }

    pub fn chunks(&self) -> &[Array] {
        &self.chunks
    }

    pub fn len(&self) -> usize {
        self.chunks.iter().map(Array::len).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn data_type(&self) -> Option<DataType> {
        self.chunks.first().map(Array::data_type)
    }

    fn locate(&self, row: usize) -> (&Array, usize) {
        let mut remaining = row;
        for chunk in &self.chunks {
            if remaining < chunk.len() {
                return (chunk, remaining);
            }
            remaining -= chunk.len();
        }
        panic!("row index {} out of bounds", row);
    }

    pub fn is_valid(&self, row: usize) -> bool {
        let (chunk, offset) = self.locate(row);
        chunk.is_valid(offset)
    }

    pub fn scalar_at(&self, row: usize) -> Scalar {
        let (chunk, offset) = self.locate(row);
        chunk.scalar_at(offset)
    }

    /// Flattens the chunk sequence into one contiguous [`Array`], in row
    /// order. Used by the evaluator at `ColumnRef` leaves: rechunking is
    /// always safe for correctness, since flattening preserves row order
    /// regardless of the original chunk boundaries.
    pub fn to_flat_array(&self) -> Array {
        if self.chunks.len() == 1 {
            return self.chunks[0].clone();
        }
        match self.data_type() {
            None => Array::String(StringArray::empty(false)),
            Some(DataType::Int64) => {
                let mut values = Vec::with_capacity(self.len());
                let mut validity = Bitmap::with_capacity(self.len());
                for chunk in &self.chunks {
                    if let Array::Int64(a) = chunk {
                        for i in 0..a.len() {
                            values.push(a.values[i]);
                            validity.push(a.is_valid(i));
                        }
                    }
                }
                Array::Int64(Int64Array::new(values, Some(validity)))
            }
            Some(DataType::Float64) => {
                let mut values = Vec::with_capacity(self.len());
                let mut validity = Bitmap::with_capacity(self.len());
                for chunk in &self.chunks {
                    if let Array::Float64(a) = chunk {
                        for i in 0..a.len() {
                            values.push(a.values[i]);
                            validity.push(a.is_valid(i));
                        }
                    }
                }
                Array::Float64(Float64Array::new(values, Some(validity)))
            }
            Some(DataType::String) => {
                let mut values = Vec::with_capacity(self.len());
                let mut validity = Bitmap::with_capacity(self.len());
                for chunk in &self.chunks {
                    if let Array::String(a) = chunk {
                        for i in 0..a.len() {
                            values.push(a.values[i].clone());
                            validity.push(a.is_valid(i));
                        }
                    }
                }
                Array::String(StringArray::new(values, Some(validity)))
            }
            Some(DataType::Boolean) => {
                let mut values = Vec::with_capacity(self.len());
                let mut validity = Bitmap::with_capacity(self.len());
                for chunk in &self.chunks {
                    if let Array::Boolean(a) = chunk {
                        for i in 0..a.len() {
                            values.push(a.values[i]);
                            validity.push(a.is_valid(i));
                        }
                    }
                }
                Array::Boolean(BooleanArray::new(values, Some(validity)))
            }
        }
    }
}

/// Advances one logical row at a time across a [`ChunkedArray`]'s chunk
/// boundaries using a chunk-index + offset-within-chunk cursor. Used
/// where re-locating from scratch on every row would be wasteful (the
/// row-filter utilities' `drop_na`/`apply_mask`).
pub struct ChunkCursor<'a> {
    chunks: &'a [Array],
    chunk_idx: usize,
    offset: usize,
}

impl<'a> ChunkCursor<'a> {
    pub fn new(chunks: &'a [Array]) -> Self {
        let mut cursor = ChunkCursor {
            chunks,
            chunk_idx: 0,
            offset: 0,
        };
        cursor.skip_empty_chunks();
        cursor
    }

    fn skip_empty_chunks(&mut self) {
        while self.chunk_idx < self.chunks.len() && self.chunks[self.chunk_idx].is_empty() {
            self.chunk_idx += 1;
        }
    }

    /// The `(chunk, offset)` the cursor currently points at, or `None` if
    /// every row has been consumed.
    pub fn current(&self) -> Option<(&'a Array, usize)> {
        if self.chunk_idx < self.chunks.len() {
            Some((&self.chunks[self.chunk_idx], self.offset))
        } else {
            None
        }
    }

    /// Moves the cursor forward by exactly one logical row.
    pub fn advance(&mut self) {
        self.offset += 1;
        if self.chunk_idx < self.chunks.len() && self.offset >= self.chunks[self.chunk_idx].len() {
            self.offset = 0;
            self.chunk_idx += 1;
            self.skip_empty_chunks();
        }
    }
}

/// A named, typed column slot in a [`Schema`].
#[derive(Debug, Clone, PartialEq)]
pub struct Field {
    pub name: String,
    pub data_type: DataType,
    pub nullable: bool,
}

impl Field {
    pub fn new(name: impl Into<String>, data_type: DataType, nullable: bool) -> Self {
        Field {
            name: name.into(),
            data_type,
            nullable,
        }
    }
}

/// An ordered list of [`Field`]s. Names need not be unique; resolution is
/// first-match-wins.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Schema {
    pub fields: Vec<Field>,
}

impl Schema {
    pub fn new(fields: Vec<Field>) -> Self {
        Schema { fields }
    }

    pub fn len(&self) -> usize {
        self.fields.len()
    }

    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }

    pub fn index_of(&self, name: &str) -> Option<usize> {
        self.fields.iter().position(|f| f.name == name)
    }

    pub fn field(&self, index: usize) -> &Field {
        &self.fields[index]
    }
}

/// A schema paired with one [`ChunkedArray`] per field, all sharing the
/// same total row count.
#[derive(Debug, Clone, PartialEq)]
pub struct Table {
    schema: Schema,
    columns: Vec<ChunkedArray>,
}

impl Table {
    /// Builds a `Table`, checking the structural invariants: one column per
    /// field, and every column the same length.
    pub fn try_new(schema: Schema, columns: Vec<ChunkedArray>) -> Result<Self, crate::Error> {
        if schema.len() != columns.len() {
            return Err(crate::Error::type_error(format!(
                "schema has {} fields but {} columns were supplied",
                schema.len(),
                columns.len()
            )));
        }
        let row_count = columns.first().map(ChunkedArray::len).unwrap_or(0);
        for (field, column) in schema.fields.iter().zip(columns.iter()) {
            if column.len() != row_count {
                return Err(crate::Error::type_error(format!(
                    "column '{}' has {} rows, expected {}",
                    field.name,
                    column.len(),
                    row_count
                )));
            }
        }
        Ok(Table { schema, columns })
    }

    pub fn schema(&self) -> &Schema {
        &self.schema
    }

    pub fn column(&self, index: usize) -> &ChunkedArray {
        &self.columns[index]
    }

    pub fn column_by_name(&self, name: &str) -> Option<&ChunkedArray> {
        self.schema.index_of(name).map(|i| &self.columns[i])
    }

    pub fn num_rows(&self) -> usize {
        self.columns.first().map(ChunkedArray::len).unwrap_or(0)
    }

    pub fn num_columns(&self) -> usize {
        self.columns.len()
    }

    pub fn columns(&self) -> &[ChunkedArray] {
        &self.columns
    }
}

/// A single decoded value read out of a [`Table`] (used by `row_at`, and a
/// natural value to hand back from a scalar expression evaluation), with
/// a `Display` impl used for CLI output.
#[derive(Debug, Clone, PartialEq)]
pub enum Scalar {
    Int64(i64),
    Float64(f64),
    String(String),
    Boolean(bool),
    Null,
}

impl fmt::Display for Scalar {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Scalar::Int64(n) => write!(f, "{}", n),
            Scalar::Float64(n) => write!(f, "{}", n),
            Scalar::String(s) => write!(f, "{}", s),
            Scalar::Boolean(b) => write!(f, "{}", b),
            Scalar::Null => write!(f, "NA"),
        }
    }
}

macro_rules! array_conversions {
    ($array:ident, $elem:ty, $variant:ident) => {
        impl From<Vec<Option<$elem>>> for Array {
            fn from(values: Vec<Option<$elem>>) -> Array {
                let mut array = $array::empty(true);
                for v in values {
                    match v {
                        Some(value) => array.push_value(value),
                        None => array.push_null(),
                    }
                }
                Array::$variant(array)
            }
        }

        impl std::convert::TryFrom<Array> for Vec<Option<$elem>> {
            type Error = &'static str;

            fn try_from(array: Array) -> Result<Self, Self::Error> {
                match array {
                    Array::$variant(a) => Ok((0..a.len())
                        .map(|i| if a.is_valid(i) { Some(a.values[i].clone()) } else { None })
                        .collect()),
                    _ => Err(concat!("array is not of type ", stringify!($variant))),
                }
            }
        }
    };
}

array_conversions!(Int64Array, i64, Int64);
array_conversions!(Float64Array, f64, Float64);
array_conversions!(StringArray, String, String);
array_conversions!(BooleanArray, bool, Boolean);

#[cfg(test)]
mod tests {
    use super::*;
    use std::convert::TryFrom;

    #[test]
    fn bitmap_tracks_validity() {
        let mut bm = Bitmap::with_capacity(4);
        bm.push(true);
        bm.push(false);
        bm.push(true);
        bm.push(true);
        assert_eq!(bm.len(), 4);
        assert!(bm.get(0));
        assert!(!bm.get(1));
        bm.set(1, true);
        assert!(bm.get(1));
    }

    #[test]
    fn chunked_array_flattens_in_order() {
        let chunks = vec![
            Array::Int64(Int64Array::all_valid(vec![0])),
            Array::Int64(Int64Array::all_valid(vec![1, 2])),
            Array::Int64(Int64Array::all_valid(vec![3, 4, 5])),
        ];
        let chunked = ChunkedArray::new(chunks);
        assert_eq!(chunked.len(), 6);
        let flat = chunked.to_flat_array();
        if let Array::Int64(a) = flat {
            assert_eq!(a.values, vec![0, 1, 2, 3, 4, 5]);
        } else {
            panic!("expected Int64 array");
        }
    }

    #[test]
    fn chunk_cursor_walks_mixed_sizes() {
        let chunks: Vec<Array> = vec![
            Array::Int64(Int64Array::all_valid(vec![0])),
            Array::Int64(Int64Array::all_valid(vec![1, 2])),
            Array::Int64(Int64Array::all_valid(vec![3, 4, 5])),
        ];
        let mut cursor = ChunkCursor::new(&chunks);
        let mut seen = Vec::new();
        for _ in 0..6 {
            let (chunk, offset) = cursor.current().expect("row in range");
            if let Array::Int64(a) = chunk {
                seen.push(a.values[offset]);
            }
            cursor.advance();
        }
        assert_eq!(seen, vec![0, 1, 2, 3, 4, 5]);
        assert!(cursor.current().is_none());
    }

    #[test]
    fn round_trips_through_option_vec() {
        let values = vec![Some(1i64), None, Some(3)];
        let array: Array = values.clone().into();
        let back: Vec<Option<i64>> = Vec::try_from(array).unwrap();
        assert_eq!(back, values);
    }

    #[test]
    fn table_rejects_mismatched_column_lengths() {
        let schema = Schema::new(vec![
            Field::new("a", DataType::Int64, false),
            Field::new("b", DataType::Int64, false),
        ]);
        let columns = vec![
            ChunkedArray::from_array(Array::Int64(Int64Array::all_valid(vec![1, 2, 3]))),
            ChunkedArray::from_array(Array::Int64(Int64Array::all_valid(vec![1, 2]))),
        ];
        assert!(Table::try_new(schema, columns).is_err());
    }
}

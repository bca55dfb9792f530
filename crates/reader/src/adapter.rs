//! Adaptation of wire batches into native column vectors.
//!
//! The adapter is a type/layout translation, not a data copy: each native
//! vector shares the wire field's refcounted buffers. Vectors are valid only
//! until the cursor advances again or the reader closes.

use std::sync::Arc;

use arrow::array::ArrayRef;
use arrow::buffer::NullBuffer;
use arrow::record_batch::RecordBatch;
use arrow_schema::{DataType, Field};
use colflux_common::{FluxError, Result};

/// Capability contract for the engine-side column type.
///
/// Anything constructible from one wire field vector can be a
/// materialization target, which keeps the adapter testable without the
/// engine's own vector type.
pub trait WireColumnTarget: Sized {
    fn from_wire(field: &Field, values: ArrayRef) -> Result<Self>;
}

/// Native column vector backed by the wire batch's buffers.
#[derive(Debug, Clone)]
pub struct ColumnVector {
    name: String,
    values: ArrayRef,
}

impl ColumnVector {
    /// Field name from the wire schema.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Logical type of the vector.
    pub fn data_type(&self) -> &DataType {
        self.values.data_type()
    }

    /// Number of values in the vector.
    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    /// Number of null slots.
    pub fn null_count(&self) -> usize {
        self.values.null_count()
    }

    /// Whether the slot at `idx` is null.
    pub fn is_null(&self, idx: usize) -> bool {
        self.values.is_null(idx)
    }

    /// Validity bitmap view, when the vector carries one.
    pub fn validity(&self) -> Option<&NullBuffer> {
        self.values.nulls()
    }

    /// Shared view of the underlying values.
    pub fn values(&self) -> &ArrayRef {
        &self.values
    }
}

impl WireColumnTarget for ColumnVector {
    fn from_wire(field: &Field, values: ArrayRef) -> Result<Self> {
        Ok(Self {
            name: field.name().clone(),
            values,
        })
    }
}

/// One materialized batch: a row count plus one vector per wire field, in
/// wire field order.
#[derive(Debug, Clone)]
pub struct ColumnarBatch {
    num_rows: usize,
    columns: Vec<ColumnVector>,
}

impl ColumnarBatch {
    pub fn num_rows(&self) -> usize {
        self.num_rows
    }

    pub fn num_columns(&self) -> usize {
        self.columns.len()
    }

    pub fn columns(&self) -> &[ColumnVector] {
        &self.columns
    }

    pub fn column(&self, idx: usize) -> Option<&ColumnVector> {
        self.columns.get(idx)
    }
}

/// Materialize a wire batch into engine column vectors.
pub fn materialize(batch: &RecordBatch) -> Result<ColumnarBatch> {
    let (num_rows, columns) = materialize_with::<ColumnVector>(batch)?;
    Ok(ColumnarBatch { num_rows, columns })
}

/// Materialize into any target column type.
///
/// Every field is type-checked before any target is constructed, so an
/// unsupported wire type surfaces as an error instead of a partially
/// adapted batch.
pub fn materialize_with<T: WireColumnTarget>(batch: &RecordBatch) -> Result<(usize, Vec<T>)> {
    let schema = batch.schema();
    for field in schema.fields() {
        ensure_supported(field)?;
    }
    let mut columns = Vec::with_capacity(batch.num_columns());
    for (field, values) in schema.fields().iter().zip(batch.columns()) {
        columns.push(T::from_wire(field.as_ref(), Arc::clone(values))?);
    }
    Ok((batch.num_rows(), columns))
}

fn ensure_supported(field: &Field) -> Result<()> {
    if type_supported(field.data_type()) {
        Ok(())
    } else {
        Err(FluxError::Adapter(format!(
            "field '{}' has wire type {:?} with no native column counterpart",
            field.name(),
            field.data_type()
        )))
    }
}

fn type_supported(data_type: &DataType) -> bool {
    matches!(
        data_type,
        DataType::Boolean
            | DataType::Int8
            | DataType::Int16
            | DataType::Int32
            | DataType::Int64
            | DataType::UInt8
            | DataType::UInt16
            | DataType::UInt32
            | DataType::UInt64
            | DataType::Float32
            | DataType::Float64
            | DataType::Utf8
            | DataType::LargeUtf8
            | DataType::Binary
            | DataType::LargeBinary
            | DataType::Date32
            | DataType::Date64
            | DataType::Time32(_)
            | DataType::Time64(_)
            | DataType::Timestamp(_, _)
            | DataType::Decimal128(_, _)
    )
}

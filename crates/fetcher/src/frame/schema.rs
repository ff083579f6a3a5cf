//! Declared column types and the frame layouts each accessor produces.

use arrow::datatypes::{DataType, Field, Schema, TimeUnit};

use suiscan_core::SUI_DECIMALS;

/// Largest precision an Arrow `Decimal128` can hold.
pub const DECIMAL_PRECISION: u8 = 38;

/// Target type of a frame column.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ColumnKind {
    Utf8,
    Int64,
    Float64,
    Boolean,
    /// Fixed-point decimal with `DECIMAL_PRECISION` digits and the given scale.
    Decimal { scale: i8 },
    /// Milliseconds since the epoch, UTC.
    Timestamp,
    /// Calendar date (`YYYY-MM-DD`).
    Date,
}

impl ColumnKind {
    pub fn data_type(&self) -> DataType {
        match self {
            ColumnKind::Utf8 => DataType::Utf8,
            ColumnKind::Int64 => DataType::Int64,
            ColumnKind::Float64 => DataType::Float64,
            ColumnKind::Boolean => DataType::Boolean,
            ColumnKind::Decimal { scale } => DataType::Decimal128(DECIMAL_PRECISION, *scale),
            ColumnKind::Timestamp => DataType::Timestamp(TimeUnit::Millisecond, Some("UTC".into())),
            ColumnKind::Date => DataType::Date32,
        }
    }

    /// Short name used in conversion errors.
    pub fn label(&self) -> &'static str {
        match self {
            ColumnKind::Utf8 => "string",
            ColumnKind::Int64 => "int64",
            ColumnKind::Float64 => "float64",
            ColumnKind::Boolean => "boolean",
            ColumnKind::Decimal { .. } => "decimal",
            ColumnKind::Timestamp => "timestamp",
            ColumnKind::Date => "date",
        }
    }
}

/// A named column with its declared kind.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ColumnSpec {
    pub name: &'static str,
    pub kind: ColumnKind,
}

impl ColumnSpec {
    pub const fn new(name: &'static str, kind: ColumnKind) -> Self {
        Self { name, kind }
    }

    pub fn field(&self) -> Field {
        Field::new(self.name, self.kind.data_type(), true)
    }
}

/// Build an Arrow [`Schema`] from column specs.
pub fn build_schema(columns: &[ColumnSpec]) -> Schema {
    Schema::new(columns.iter().map(ColumnSpec::field).collect::<Vec<_>>())
}

// ── Accessor layouts ─────────────────────────────────────────

pub const TRANSACTION_COLUMNS: &[ColumnSpec] = &[
    ColumnSpec::new("transaction_digest", ColumnKind::Utf8),
    ColumnSpec::new("timestamp_ms", ColumnKind::Int64),
    ColumnSpec::new("sender", ColumnKind::Utf8),
    ColumnSpec::new("gas_used", ColumnKind::Int64),
    ColumnSpec::new("gas_price", ColumnKind::Int64),
    ColumnSpec::new("success", ColumnKind::Boolean),
    ColumnSpec::new("effects_status", ColumnKind::Utf8),
    ColumnSpec::new("checkpoint_sequence_number", ColumnKind::Int64),
    ColumnSpec::new("timestamp", ColumnKind::Timestamp),
];

pub const BALANCE_COLUMNS: &[ColumnSpec] = &[
    ColumnSpec::new("address", ColumnKind::Utf8),
    ColumnSpec::new("coin_type", ColumnKind::Utf8),
    ColumnSpec::new("balance", ColumnKind::Decimal { scale: 0 }),
    ColumnSpec::new("object_count", ColumnKind::Int64),
    ColumnSpec::new("last_activity_ms", ColumnKind::Int64),
    ColumnSpec::new("last_activity", ColumnKind::Timestamp),
];

/// Raw balance reinterpreted in whole SUI.
pub const BALANCE_SUI: ColumnSpec =
    ColumnSpec::new("balance_sui", ColumnKind::Decimal { scale: SUI_DECIMALS });

pub const SUMMARY_COLUMNS: &[ColumnSpec] = &[
    ColumnSpec::new("date", ColumnKind::Date),
    ColumnSpec::new("transaction_count", ColumnKind::Int64),
    ColumnSpec::new("unique_senders", ColumnKind::Int64),
    ColumnSpec::new("total_gas_used", ColumnKind::Int64),
    ColumnSpec::new("avg_gas_used", ColumnKind::Float64),
    ColumnSpec::new("successful_txns", ColumnKind::Int64),
    ColumnSpec::new("failed_txns", ColumnKind::Int64),
];

pub const SUMMARY_SUCCESS_RATE: ColumnSpec =
    ColumnSpec::new("success_rate_pct", ColumnKind::Float64);

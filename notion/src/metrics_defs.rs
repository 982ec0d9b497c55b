//! Metrics definitions for the record source.

use shared::metrics_defs::{MetricDef, MetricType};

pub const TABLE_PAGES: MetricDef = MetricDef {
    name: "table.pages",
    metric_type: MetricType::Counter,
    description: "Number of table pages fetched from the record source",
};

pub const TABLE_ROWS: MetricDef = MetricDef {
    name: "table.rows",
    metric_type: MetricType::Histogram,
    description: "Number of records returned by a full table read",
};

pub const ALL_METRICS: &[MetricDef] = &[TABLE_PAGES, TABLE_ROWS];

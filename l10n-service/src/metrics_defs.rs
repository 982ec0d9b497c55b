use shared::metrics_defs::{MetricDef, MetricType};

pub const REQUEST_DURATION: MetricDef = MetricDef {
    name: "request.duration",
    metric_type: MetricType::Histogram,
    description: "Request duration in seconds. Tagged with status, handler.",
};

pub const RECORDS_CREATED: MetricDef = MetricDef {
    name: "records.created",
    metric_type: MetricType::Counter,
    description: "Number of records created in the table",
};

pub const RECORDS_UPDATED: MetricDef = MetricDef {
    name: "records.updated",
    metric_type: MetricType::Counter,
    description: "Number of records updated in the table",
};

pub const RECORDS_SKIPPED: MetricDef = MetricDef {
    name: "records.skipped",
    metric_type: MetricType::Counter,
    description: "Number of records that needed no write",
};

pub const ALL_METRICS: &[MetricDef] = &[
    REQUEST_DURATION,
    RECORDS_CREATED,
    RECORDS_UPDATED,
    RECORDS_SKIPPED,
];

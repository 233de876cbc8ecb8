use shared::metrics_defs::{MetricDef, MetricType};

pub const REQUESTS: MetricDef = MetricDef {
    name: "gateway.requests",
    metric_type: MetricType::Counter,
    description: "Incoming documentation requests",
};

pub const CANONICAL_REDIRECTS: MetricDef = MetricDef {
    name: "gateway.redirects.canonical",
    metric_type: MetricType::Counter,
    description: "Root requests redirected to the canonical default version URL",
};

pub const NOT_FOUND: MetricDef = MetricDef {
    name: "gateway.not_found",
    metric_type: MetricType::Counter,
    description: "Requests that resolved to nothing (404)",
};

pub const AUTH_CHALLENGES: MetricDef = MetricDef {
    name: "gateway.auth.challenges",
    metric_type: MetricType::Counter,
    description: "Anonymous requests redirected to a login endpoint",
};

pub const UNAUTHORIZED: MetricDef = MetricDef {
    name: "gateway.auth.unauthorized",
    metric_type: MetricType::Counter,
    description: "Authenticated requests denied with a 401",
};

pub const FILES_SERVED: MetricDef = MetricDef {
    name: "gateway.files.served",
    metric_type: MetricType::Counter,
    description: "Files handed off to storage, directly or via internal redirect",
};

pub const ALL_METRICS: &[MetricDef] = &[
    REQUESTS,
    CANONICAL_REDIRECTS,
    NOT_FOUND,
    AUTH_CHALLENGES,
    UNAUTHORIZED,
    FILES_SERVED,
];

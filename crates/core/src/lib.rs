pub mod config;
pub mod domain;
pub mod errors;
pub mod mart;
pub mod query;

pub use domain::customer::{CustomerRecord, SegmentResponse, AT_RISK_SEGMENT};
pub use domain::metric::{ChannelFilter, Dimension, Metric, MetricPoint};
pub use errors::{ApplicationError, InterfaceError, ValidationError};
pub use mart::AnalyticsSchema;
pub use query::{MetricQuery, RenderedQuery, SegmentQuery};

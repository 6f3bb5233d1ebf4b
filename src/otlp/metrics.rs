//! `ExportMetricsServiceRequest` encoder and the view-data bridge.

use crate::core::otel_compliance::system_time_to_nanos;
use crate::core::{LumenError, Result, SdkLimits};
use crate::otlp::buffer::ProtoBuffer;
use crate::otlp::common::{write_attributes, write_export_request, InstrumentationScope, KeyValue, Resource};
use crate::otlp::wire::ProtoWriter;
use crate::stats::{Aggregation, MutableAggregation, ViewData};
use std::time::SystemTime;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[repr(u8)]
pub enum AggregationTemporality {
    #[default]
    Unspecified = 0,
    Delta = 1,
    Cumulative = 2,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum NumberValue {
    Double(f64),
    Int(i64),
}

#[derive(Debug, Clone, PartialEq)]
pub struct NumberDataPoint {
    pub attributes: Vec<KeyValue>,
    pub start_time: SystemTime,
    pub time: SystemTime,
    pub value: NumberValue,
    pub flags: u32,
}

#[derive(Debug, Clone, PartialEq)]
pub struct HistogramDataPoint {
    pub attributes: Vec<KeyValue>,
    pub start_time: SystemTime,
    pub time: SystemTime,
    pub count: u64,
    pub sum: Option<f64>,
    pub bucket_counts: Vec<u64>,
    pub explicit_bounds: Vec<f64>,
    pub min: Option<f64>,
    pub max: Option<f64>,
    pub flags: u32,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ValueAtQuantile {
    pub quantile: f64,
    pub value: f64,
}

#[derive(Debug, Clone, PartialEq)]
pub struct SummaryDataPoint {
    pub attributes: Vec<KeyValue>,
    pub start_time: SystemTime,
    pub time: SystemTime,
    pub count: u64,
    pub sum: f64,
    pub quantile_values: Vec<ValueAtQuantile>,
    pub flags: u32,
}

/// Shape and points of one metric.
#[derive(Debug, Clone, PartialEq)]
pub enum MetricKind {
    Gauge(Vec<NumberDataPoint>),
    Sum {
        points: Vec<NumberDataPoint>,
        temporality: AggregationTemporality,
        monotonic: bool,
    },
    Histogram {
        points: Vec<HistogramDataPoint>,
        temporality: AggregationTemporality,
    },
    Summary(Vec<SummaryDataPoint>),
}

#[derive(Debug, Clone, PartialEq)]
pub struct MetricData {
    pub name: String,
    pub description: String,
    pub unit: String,
    pub kind: MetricKind,
    pub scope: InstrumentationScope,
}

impl MetricData {
    /// Renders a view snapshot as a cumulative metric.
    ///
    /// | aggregation  | OTLP shape                                  |
    /// |--------------|---------------------------------------------|
    /// | Sum          | Sum, non-monotonic                          |
    /// | Count        | Sum, monotonic, integer points              |
    /// | Mean         | Summary, quantile 0 = min, quantile 1 = max |
    /// | Distribution | Histogram with explicit bounds              |
    /// | LastValue    | Gauge; rows never recorded are skipped      |
    ///
    /// Long measures produce integer points for Sum and LastValue. Rows are
    /// emitted in tag-value order so the output is deterministic.
    pub fn from_view_data(data: &ViewData, scope: InstrumentationScope) -> Result<Self> {
        let view = &data.view;
        let is_long = view.measure().is_long();
        let number = |v: f64| {
            if is_long {
                NumberValue::Int(v.round() as i64)
            } else {
                NumberValue::Double(v)
            }
        };

        let mut kind = match view.aggregation() {
            Aggregation::Sum => MetricKind::Sum {
                points: Vec::new(),
                temporality: AggregationTemporality::Cumulative,
                monotonic: false,
            },
            Aggregation::Count => MetricKind::Sum {
                points: Vec::new(),
                temporality: AggregationTemporality::Cumulative,
                monotonic: true,
            },
            Aggregation::Mean => MetricKind::Summary(Vec::new()),
            Aggregation::Distribution(_) => MetricKind::Histogram {
                points: Vec::new(),
                temporality: AggregationTemporality::Cumulative,
            },
            Aggregation::LastValue => MetricKind::Gauge(Vec::new()),
        };

        let mut rows: Vec<_> = data.rows.iter().collect();
        rows.sort_by(|a, b| a.0.cmp(b.0));

        for (combination, aggregation) in rows {
            let attributes: Vec<KeyValue> = view
                .columns()
                .iter()
                .zip(combination)
                .filter_map(|(key, value)| {
                    value
                        .as_ref()
                        .map(|v| KeyValue::new(key.as_str(), v.as_str()))
                })
                .collect();
            let (start_time, time) = (data.start, data.end);

            match (aggregation, &mut kind) {
                (MutableAggregation::Sum(sum), MetricKind::Sum { points, .. }) => {
                    points.push(NumberDataPoint {
                        attributes,
                        start_time,
                        time,
                        value: number(sum.sum()),
                        flags: 0,
                    });
                },
                (MutableAggregation::Count(count), MetricKind::Sum { points, .. }) => {
                    points.push(NumberDataPoint {
                        attributes,
                        start_time,
                        time,
                        value: NumberValue::Int(count.count() as i64),
                        flags: 0,
                    });
                },
                (MutableAggregation::Mean(mean), MetricKind::Summary(points)) => {
                    let quantile_values = if mean.count() > 0 {
                        vec![
                            ValueAtQuantile {
                                quantile: 0.0,
                                value: mean.min(),
                            },
                            ValueAtQuantile {
                                quantile: 1.0,
                                value: mean.max(),
                            },
                        ]
                    } else {
                        Vec::new()
                    };
                    points.push(SummaryDataPoint {
                        attributes,
                        start_time,
                        time,
                        count: mean.count(),
                        sum: mean.sum(),
                        quantile_values,
                        flags: 0,
                    });
                },
                (MutableAggregation::Distribution(dist), MetricKind::Histogram { points, .. }) => {
                    let recorded = dist.count() > 0;
                    points.push(HistogramDataPoint {
                        attributes,
                        start_time,
                        time,
                        count: dist.count(),
                        sum: Some(dist.sum()),
                        bucket_counts: dist.bucket_counts().to_vec(),
                        explicit_bounds: dist.boundaries().bounds().to_vec(),
                        min: recorded.then(|| dist.min()),
                        max: recorded.then(|| dist.max()),
                        flags: 0,
                    });
                },
                (MutableAggregation::LastValue(last), MetricKind::Gauge(points)) => {
                    if last.is_initialized() {
                        points.push(NumberDataPoint {
                            attributes,
                            start_time,
                            time,
                            value: number(last.value()),
                            flags: 0,
                        });
                    }
                },
                (other, _) => {
                    return Err(LumenError::AggregationMismatch {
                        expected: view.aggregation().name(),
                        found: other.kind_name(),
                    })
                },
            }
        }

        Ok(Self {
            name: view.name().to_string(),
            description: view.description().to_string(),
            unit: view.measure().unit().to_string(),
            kind,
            scope,
        })
    }
}

/// Encodes `metrics` at `start` and returns the offset past the last byte.
pub fn write_metrics_data(
    buffer: &mut ProtoBuffer,
    start: usize,
    limits: &SdkLimits,
    resource: Option<&Resource>,
    metrics: &[MetricData],
) -> Result<usize> {
    write_export_request(
        buffer,
        start,
        limits,
        resource,
        metrics,
        |metric| &metric.scope,
        |w, metric| write_metric(w, metric, limits),
    )
}

fn write_metric(w: &mut ProtoWriter<'_>, metric: &MetricData, limits: &SdkLimits) -> Result<()> {
    w.write_string_field(1, &metric.name)?;
    if !metric.description.is_empty() {
        w.write_string_field(2, &metric.description)?;
    }
    if !metric.unit.is_empty() {
        w.write_string_field(3, &metric.unit)?;
    }

    match &metric.kind {
        MetricKind::Gauge(points) => w.write_message(5, |w| {
            for p in points {
                w.write_message(1, |w| write_number_point(w, p, limits))?;
            }
            Ok(())
        }),
        MetricKind::Sum {
            points,
            temporality,
            monotonic,
        } => w.write_message(7, |w| {
            for p in points {
                w.write_message(1, |w| write_number_point(w, p, limits))?;
            }
            write_temporality(w, 2, *temporality)?;
            if *monotonic {
                w.write_bool_field(3, true)?;
            }
            Ok(())
        }),
        MetricKind::Histogram {
            points,
            temporality,
        } => w.write_message(9, |w| {
            for p in points {
                w.write_message(1, |w| write_histogram_point(w, p, limits))?;
            }
            write_temporality(w, 2, *temporality)
        }),
        MetricKind::Summary(points) => w.write_message(11, |w| {
            for p in points {
                w.write_message(1, |w| write_summary_point(w, p, limits))?;
            }
            Ok(())
        }),
    }
}

fn write_temporality(w: &mut ProtoWriter<'_>, field: u32, temporality: AggregationTemporality) -> Result<()> {
    if temporality != AggregationTemporality::Unspecified {
        w.write_uint64_field(field, temporality as u64)?;
    }
    Ok(())
}

// Data points carry no dropped-attributes field; the count limit still cuts.
fn write_point_attributes(
    w: &mut ProtoWriter<'_>,
    field: u32,
    attributes: &[KeyValue],
    limits: &SdkLimits,
) -> Result<()> {
    write_attributes(
        w,
        field,
        attributes,
        limits.attribute_count_limit,
        limits.attribute_value_length_limit,
    )?;
    Ok(())
}

fn write_number_point(w: &mut ProtoWriter<'_>, p: &NumberDataPoint, limits: &SdkLimits) -> Result<()> {
    w.write_fixed64_field(2, system_time_to_nanos(p.start_time))?;
    w.write_fixed64_field(3, system_time_to_nanos(p.time))?;
    match p.value {
        NumberValue::Double(v) => w.write_double_field(4, v)?,
        NumberValue::Int(v) => w.write_sfixed64_field(6, v)?,
    }
    write_point_attributes(w, 7, &p.attributes, limits)?;
    if p.flags != 0 {
        w.write_uint64_field(8, u64::from(p.flags))?;
    }
    Ok(())
}

fn write_histogram_point(w: &mut ProtoWriter<'_>, p: &HistogramDataPoint, limits: &SdkLimits) -> Result<()> {
    w.write_fixed64_field(2, system_time_to_nanos(p.start_time))?;
    w.write_fixed64_field(3, system_time_to_nanos(p.time))?;
    w.write_fixed64_field(4, p.count)?;
    if let Some(sum) = p.sum {
        w.write_double_field(5, sum)?;
    }
    w.write_packed_fixed64(6, &p.bucket_counts)?;
    w.write_packed_double(7, &p.explicit_bounds)?;
    write_point_attributes(w, 9, &p.attributes, limits)?;
    if p.flags != 0 {
        w.write_uint64_field(10, u64::from(p.flags))?;
    }
    if let Some(min) = p.min {
        w.write_double_field(11, min)?;
    }
    if let Some(max) = p.max {
        w.write_double_field(12, max)?;
    }
    Ok(())
}

fn write_summary_point(w: &mut ProtoWriter<'_>, p: &SummaryDataPoint, limits: &SdkLimits) -> Result<()> {
    w.write_fixed64_field(2, system_time_to_nanos(p.start_time))?;
    w.write_fixed64_field(3, system_time_to_nanos(p.time))?;
    w.write_fixed64_field(4, p.count)?;
    w.write_double_field(5, p.sum)?;
    for q in &p.quantile_values {
        w.write_message(6, |w| {
            w.write_double_field(1, q.quantile)?;
            w.write_double_field(2, q.value)
        })?;
    }
    write_point_attributes(w, 7, &p.attributes, limits)?;
    if p.flags != 0 {
        w.write_uint64_field(8, u64::from(p.flags))?;
    }
    Ok(())
}

//! Measures and measurements.

use crate::core::types::validate_name;
use crate::core::Result;
use std::fmt;
use std::sync::Arc;

#[derive(Debug, PartialEq, Eq, Hash)]
struct Descriptor {
    name: String,
    description: String,
    unit: String,
}

impl Descriptor {
    fn new(name: String, description: String, unit: String) -> Result<Self> {
        validate_name("Measure", &name)?;
        Ok(Self {
            name,
            description,
            unit,
        })
    }
}

/// A floating-point quantity being measured, e.g. latency in ms.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct MeasureDouble(Arc<Descriptor>);

/// An integer quantity being measured, e.g. bytes sent.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct MeasureLong(Arc<Descriptor>);

macro_rules! measure_impl {
    ($ty:ident) => {
        impl $ty {
            /// Creates the measure. The name must be printable ASCII of at
            /// most 255 chars.
            pub fn new(
                name: impl Into<String>,
                description: impl Into<String>,
                unit: impl Into<String>,
            ) -> Result<Self> {
                Descriptor::new(name.into(), description.into(), unit.into())
                    .map(|d| Self(Arc::new(d)))
            }

            pub fn name(&self) -> &str {
                &self.0.name
            }

            pub fn description(&self) -> &str {
                &self.0.description
            }

            pub fn unit(&self) -> &str {
                &self.0.unit
            }
        }
    };
}

measure_impl!(MeasureDouble);
measure_impl!(MeasureLong);

/// Either kind of measure.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Measure {
    Double(MeasureDouble),
    Long(MeasureLong),
}

impl Measure {
    pub fn name(&self) -> &str {
        match self {
            Measure::Double(m) => m.name(),
            Measure::Long(m) => m.name(),
        }
    }

    pub fn description(&self) -> &str {
        match self {
            Measure::Double(m) => m.description(),
            Measure::Long(m) => m.description(),
        }
    }

    pub fn unit(&self) -> &str {
        match self {
            Measure::Double(m) => m.unit(),
            Measure::Long(m) => m.unit(),
        }
    }

    pub fn is_long(&self) -> bool {
        matches!(self, Measure::Long(_))
    }
}

impl From<MeasureDouble> for Measure {
    fn from(m: MeasureDouble) -> Self {
        Measure::Double(m)
    }
}

impl From<MeasureLong> for Measure {
    fn from(m: MeasureLong) -> Self {
        Measure::Long(m)
    }
}

impl fmt::Display for Measure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.name())
    }
}

/// A single recorded value, typed by its measure.
#[derive(Debug, Clone, PartialEq)]
pub enum Measurement {
    Double(MeasureDouble, f64),
    Long(MeasureLong, i64),
}

impl Measurement {
    pub fn measure(&self) -> Measure {
        match self {
            Measurement::Double(m, _) => Measure::Double(m.clone()),
            Measurement::Long(m, _) => Measure::Long(m.clone()),
        }
    }

    pub fn measure_name(&self) -> &str {
        match self {
            Measurement::Double(m, _) => m.name(),
            Measurement::Long(m, _) => m.name(),
        }
    }

    /// Value widened to f64 for aggregation
    pub fn value(&self) -> f64 {
        match self {
            Measurement::Double(_, v) => *v,
            Measurement::Long(_, v) => *v as f64,
        }
    }

    /// True when both measurements refer to the same measure
    pub(crate) fn same_measure(&self, other: &Measurement) -> bool {
        match (self, other) {
            (Measurement::Double(a, _), Measurement::Double(b, _)) => a == b,
            (Measurement::Long(a, _), Measurement::Long(b, _)) => a == b,
            _ => false,
        }
    }
}

//! Statistical aggregation kernels
//!
//! Seven numeric accumulators drive the `Stats` machinery: sum, min, max,
//! avg, std, suminv, avginv. Each is an in-place accumulator fed one sample
//! at a time by the row scanner and read out once the scan is done.
//!
//! `std` is the population standard deviation, √(Σx²/n − (Σx/n)²), without
//! Bessel's correction. `value()` on an accumulator that has seen no samples
//! is left to the caller: averages yield NaN, min/max yield 0 (see below).

/// The aggregation operators accepted on a `Stats` line
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AggregationKind {
    Sum,
    Min,
    Max,
    Avg,
    Std,
    SumInv,
    AvgInv,
}

impl AggregationKind {
    /// Look up an operator by its protocol name.
    ///
    /// An unknown name is not an error at this level: on a `Stats` line the
    /// first token doubles as a column name in the count-filter form.
    pub fn from_name(name: &str) -> Option<Self> {
        match name {
            "sum" => Some(Self::Sum),
            "min" => Some(Self::Min),
            "max" => Some(Self::Max),
            "avg" => Some(Self::Avg),
            "std" => Some(Self::Std),
            "suminv" => Some(Self::SumInv),
            "avginv" => Some(Self::AvgInv),
            _ => None,
        }
    }

    pub fn name(&self) -> &'static str {
        match self {
            Self::Sum => "sum",
            Self::Min => "min",
            Self::Max => "max",
            Self::Avg => "avg",
            Self::Std => "std",
            Self::SumInv => "suminv",
            Self::AvgInv => "avginv",
        }
    }

    /// Create a fresh accumulator for this operator.
    pub fn accumulator(&self) -> Accumulator {
        match self {
            Self::Sum => Accumulator::Sum { sum: 0.0 },
            Self::Min => Accumulator::Min {
                first: true,
                value: 0.0,
            },
            Self::Max => Accumulator::Max {
                first: true,
                value: 0.0,
            },
            Self::Avg => Accumulator::Avg { count: 0, sum: 0.0 },
            Self::Std => Accumulator::Std {
                count: 0,
                sum: 0.0,
                sum_of_squares: 0.0,
            },
            Self::SumInv => Accumulator::SumInv { sum: 0.0 },
            Self::AvgInv => Accumulator::AvgInv { count: 0, sum: 0.0 },
        }
    }
}

impl std::fmt::Display for AggregationKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.name())
    }
}

/// An in-place numeric accumulator
///
/// Min/Max keep a zero-initialized cell and a first-sample flag instead of
/// seeding with ±infinity, so their empty-input value is 0. That is wrong
/// but intentional: remote sites rely on it.
#[derive(Debug, Clone, PartialEq)]
pub enum Accumulator {
    Sum {
        sum: f64,
    },
    Min {
        first: bool,
        value: f64,
    },
    Max {
        first: bool,
        value: f64,
    },
    Avg {
        count: u32,
        sum: f64,
    },
    Std {
        count: u32,
        sum: f64,
        sum_of_squares: f64,
    },
    SumInv {
        sum: f64,
    },
    AvgInv {
        count: u32,
        sum: f64,
    },
}

impl Accumulator {
    /// Feed one sample.
    pub fn update(&mut self, sample: f64) {
        match self {
            Self::Sum { sum } => *sum += sample,
            Self::Min { first, value } => {
                if *first || sample < *value {
                    *value = sample;
                }
                *first = false;
            }
            Self::Max { first, value } => {
                if *first || sample > *value {
                    *value = sample;
                }
                *first = false;
            }
            Self::Avg { count, sum } => {
                *count += 1;
                *sum += sample;
            }
            Self::Std {
                count,
                sum,
                sum_of_squares,
            } => {
                *count += 1;
                *sum += sample;
                *sum_of_squares += sample * sample;
            }
            Self::SumInv { sum } => *sum += 1.0 / sample,
            Self::AvgInv { count, sum } => {
                *count += 1;
                *sum += 1.0 / sample;
            }
        }
    }

    /// Read the aggregate out.
    pub fn value(&self) -> f64 {
        match self {
            Self::Sum { sum } | Self::SumInv { sum } => *sum,
            Self::Min { value, .. } | Self::Max { value, .. } => *value,
            Self::Avg { count, sum } | Self::AvgInv { count, sum } => *sum / f64::from(*count),
            Self::Std {
                count,
                sum,
                sum_of_squares,
            } => {
                let n = f64::from(*count);
                let mean = *sum / n;
                (sum_of_squares / n - mean * mean).sqrt()
            }
        }
    }
}

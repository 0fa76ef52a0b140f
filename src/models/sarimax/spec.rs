//! SARIMAX order specifications.

use serde::Serialize;
use std::fmt;

/// Monthly seasonality.
pub const SEASONAL_PERIOD: usize = 12;

/// Non-seasonal order (p, d, q).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub struct ModelOrder {
    /// AR order (p)
    pub p: usize,
    /// Differencing order (d)
    pub d: usize,
    /// MA order (q)
    pub q: usize,
}

impl ModelOrder {
    pub fn new(p: usize, d: usize, q: usize) -> Self {
        Self { p, d, q }
    }
}

impl fmt::Display for ModelOrder {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "({}, {}, {})", self.p, self.d, self.q)
    }
}

/// Seasonal order (P, D, Q, period).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub struct SeasonalOrder {
    /// Seasonal AR order (P)
    pub p: usize,
    /// Seasonal differencing order (D)
    pub d: usize,
    /// Seasonal MA order (Q)
    pub q: usize,
    /// Season length in observations
    pub period: usize,
}

impl SeasonalOrder {
    pub fn new(p: usize, d: usize, q: usize, period: usize) -> Self {
        Self { p, d, q, period }
    }

    /// Seasonal order with the same (P, D, Q) digits as a non-seasonal order.
    pub fn from_order(order: ModelOrder, period: usize) -> Self {
        Self::new(order.p, order.d, order.q, period)
    }

    /// No seasonal component.
    pub fn none() -> Self {
        Self::new(0, 0, 0, 0)
    }
}

impl fmt::Display for SeasonalOrder {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "({}, {}, {}, {})", self.p, self.d, self.q, self.period)
    }
}

/// Full SARIMA(p, d, q)(P, D, Q)\[s\] specification.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub struct SarimaxSpec {
    pub order: ModelOrder,
    pub seasonal: SeasonalOrder,
}

impl SarimaxSpec {
    pub fn new(order: ModelOrder, seasonal: SeasonalOrder) -> Self {
        Self { order, seasonal }
    }

    fn period(&self) -> usize {
        self.seasonal.period
    }

    /// Degree of the expanded AR polynomial: p + s*P.
    pub fn k_ar(&self) -> usize {
        self.order.p + self.period() * self.seasonal.p
    }

    /// Degree of the expanded MA polynomial: q + s*Q.
    pub fn k_ma(&self) -> usize {
        self.order.q + self.period() * self.seasonal.q
    }

    /// Number of ARMA states: max(k_ar, k_ma + 1).
    pub fn k_arma_states(&self) -> usize {
        self.k_ar().max(self.k_ma() + 1)
    }

    /// Number of differencing states: d + s*D.
    pub fn k_diff_states(&self) -> usize {
        self.order.d + self.period() * self.seasonal.d
    }

    /// Total state dimension.
    pub fn k_states(&self) -> usize {
        self.k_arma_states() + self.k_diff_states()
    }

    /// Number of ARMA coefficients (p + q + P + Q).
    pub fn k_arma_params(&self) -> usize {
        self.order.p + self.order.q + self.seasonal.p + self.seasonal.q
    }

    /// Parameters counted by the information criteria, including the variance.
    pub fn num_params(&self, k_exog: usize) -> usize {
        k_exog + self.k_arma_params() + 1
    }
}

impl fmt::Display for SarimaxSpec {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "SARIMAX{}x{}", self.order, self.seasonal)
    }
}

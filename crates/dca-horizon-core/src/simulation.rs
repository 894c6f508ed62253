use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::error::HorizonError;
use crate::types::{Money, PricePoint, PriceSample};
use crate::HorizonResult;

/// Running state of one window's monthly purchase simulation.
///
/// A month with no usable price freezes the share count: nothing is bought,
/// nothing already invested is removed, and the portfolio is valued at the
/// last known valid price. That valuation is an approximation when shares
/// were bought recently at a different price, but it never fabricates a
/// purchase.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SimulationState {
    pub shares_held: Decimal,
    pub total_contributed: Money,
    pub value_trail: Vec<Money>,
    #[serde(skip)]
    last_valid_price: Option<Money>,
}

impl SimulationState {
    pub fn new() -> Self {
        Self {
            shares_held: Decimal::ZERO,
            total_contributed: Decimal::ZERO,
            value_trail: Vec::new(),
            last_valid_price: None,
        }
    }

    /// Advance the simulation by one month.
    pub fn step(&mut self, point: &PricePoint, contribution: Money) {
        match point.sample {
            PriceSample::Valid(price) => {
                self.shares_held += contribution / price;
                self.total_contributed += contribution;
                self.last_valid_price = Some(price);
                self.value_trail.push(self.shares_held * price);
            }
            PriceSample::Invalid(_) => {
                let value = match self.last_valid_price {
                    Some(price) if self.shares_held > Decimal::ZERO => self.shares_held * price,
                    _ => Decimal::ZERO,
                };
                self.value_trail.push(value);
            }
        }
    }

    /// Portfolio value after the most recent step.
    pub fn current_value(&self) -> Money {
        self.value_trail.last().copied().unwrap_or(Decimal::ZERO)
    }
}

impl Default for SimulationState {
    fn default() -> Self {
        Self::new()
    }
}

/// A window's simulated cash flows: one outflow per month, with the final
/// portfolio value added to the last entry.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WindowCashFlows {
    pub flows: Vec<Money>,
    pub final_value: Money,
    pub state: SimulationState,
}

/// Simulate a fixed monthly contribution over `periods` and build the
/// cash-flow series for the IRR solver.
pub fn build_cash_flows(
    periods: &[PricePoint],
    contribution: Money,
) -> HorizonResult<WindowCashFlows> {
    if contribution <= Decimal::ZERO {
        return Err(HorizonError::InvalidInput {
            field: "contribution".into(),
            reason: "Monthly contribution must be positive".into(),
        });
    }
    if periods.is_empty() {
        return Err(HorizonError::EmptySeries);
    }

    let mut state = SimulationState::new();
    for point in periods {
        state.step(point, contribution);
    }

    let final_value = state.current_value();
    let mut flows = vec![-contribution; periods.len()];
    if let Some(last) = flows.last_mut() {
        *last += final_value;
    }

    Ok(WindowCashFlows {
        flows,
        final_value,
        state,
    })
}

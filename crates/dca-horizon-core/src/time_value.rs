use std::time::Instant;

use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use serde::{Deserialize, Serialize};

use crate::error::HorizonError;
use crate::types::{with_metadata, ComputationOutput, Money, Rate};
use crate::HorizonResult;

const NPV_TOLERANCE: Decimal = dec!(0.000001);
const MAX_NEWTON_ITERATIONS: u32 = 100;
const MAX_BISECTION_ITERATIONS: u32 = 200;
const RATE_FLOOR: Decimal = dec!(-0.95);
const RATE_CEIL: Decimal = dec!(10);
const SCAN_STEP: Decimal = dec!(0.05);
const SCAN_CEIL: Decimal = dec!(1.5);

/// Default Newton-Raphson seed for periodic IRR.
pub const DEFAULT_IRR_GUESS: Decimal = dec!(0.1);

/// Net Present Value of a series of cash flows
pub fn npv(rate: Rate, cash_flows: &[Money]) -> HorizonResult<Money> {
    if rate <= dec!(-1) {
        return Err(HorizonError::InvalidInput {
            field: "rate".into(),
            reason: "Discount rate must be greater than -100%".into(),
        });
    }

    let one_plus_r = Decimal::ONE + rate;
    let mut discount = Decimal::ONE;
    let mut result = Decimal::ZERO;

    for (t, cf) in cash_flows.iter().enumerate() {
        if t > 0 {
            discount = discount.checked_mul(one_plus_r).ok_or_else(|| {
                HorizonError::InvalidInput {
                    field: "rate".into(),
                    reason: format!("discount factor overflows at period {t}"),
                }
            })?;
        }
        if discount.is_zero() {
            return Err(HorizonError::DivisionByZero {
                context: format!("NPV discount factor at period {t}"),
            });
        }
        let term = cf.checked_div(discount).ok_or_else(|| {
            HorizonError::InvalidInput {
                field: "rate".into(),
                reason: format!("NPV term overflows at period {t}"),
            }
        })?;
        result += term;
    }

    Ok(result)
}

/// Periodic internal rate of return: the rate at which the NPV of
/// `cash_flows` is zero. Newton-Raphson from `guess`, falling back to a
/// bracket scan plus bisection when the iteration diverges or stalls.
pub fn irr(cash_flows: &[Money], guess: Rate) -> HorizonResult<Rate> {
    if cash_flows.len() < 2 {
        return Err(HorizonError::InsufficientData(
            "IRR requires at least 2 cash flows".into(),
        ));
    }

    let has_outflow = cash_flows.iter().any(|cf| *cf < Decimal::ZERO);
    let has_inflow = cash_flows.iter().any(|cf| *cf > Decimal::ZERO);
    if !has_outflow || !has_inflow {
        return Err(HorizonError::NoSignChange);
    }

    let mut rate = clamp_rate(guess);

    for _ in 0..MAX_NEWTON_ITERATIONS {
        let eval = evaluate_npv(cash_flows, rate);
        if !eval.complete {
            break;
        }
        if eval.npv.abs() < NPV_TOLERANCE {
            return Ok(rate);
        }
        if eval.derivative.is_zero() {
            break;
        }
        let Some(step) = eval.npv.checked_div(eval.derivative) else {
            break;
        };
        rate = clamp_rate(rate - step);
    }

    bisect(cash_flows)
}

/// Convert a periodic rate to its compounded yearly equivalent:
/// `(1 + r)^periods_per_year - 1`.
pub fn annualize(periodic: Rate, periods_per_year: u32) -> Rate {
    let mut compounded = Decimal::ONE;
    let one_plus_r = Decimal::ONE + periodic;
    for _ in 0..periods_per_year {
        compounded = compounded.saturating_mul(one_plus_r);
    }
    compounded - Decimal::ONE
}

struct NpvEvaluation {
    npv: Money,
    derivative: Money,
    /// False when some terms were dropped because their discount factor
    /// is not representable at this rate; the value is then unreliable.
    complete: bool,
}

/// NPV and its derivative with respect to the rate, accumulated with
/// checked arithmetic.
fn evaluate_npv(cash_flows: &[Money], rate: Rate) -> NpvEvaluation {
    let one_plus_r = Decimal::ONE + rate;
    let mut npv_val = Decimal::ZERO;
    let mut dnpv = Decimal::ZERO;
    let mut discount = Decimal::ONE;
    let mut complete = true;

    for (t, cf) in cash_flows.iter().enumerate() {
        if t > 0 {
            discount = match discount.checked_mul(one_plus_r) {
                Some(d) if !d.is_zero() => d,
                _ => {
                    complete = false;
                    break;
                }
            };
        }

        let term = cf
            .checked_div(discount)
            .and_then(|term| npv_val.checked_add(term));
        let Some(sum) = term else {
            complete = false;
            break;
        };
        npv_val = sum;

        if t > 0 {
            // d/dr of cf/(1+r)^t is -t*cf/(1+r)^(t+1)
            let dterm = discount
                .checked_mul(one_plus_r)
                .filter(|d| !d.is_zero())
                .and_then(|denom| Decimal::from(t as u64).checked_mul(*cf)?.checked_div(denom))
                .and_then(|dterm| dnpv.checked_sub(dterm));
            let Some(diff) = dterm else {
                complete = false;
                break;
            };
            dnpv = diff;
        }
    }

    NpvEvaluation {
        npv: npv_val,
        derivative: dnpv,
        complete,
    }
}

fn clamp_rate(rate: Rate) -> Rate {
    if rate < RATE_FLOOR {
        RATE_FLOOR
    } else if rate > RATE_CEIL {
        RATE_CEIL
    } else {
        rate
    }
}

/// Bisection fallback: scan for an NPV sign change on a coarse grid, then
/// halve the bracket until the residual is inside tolerance. Grid points
/// whose NPV cannot be fully evaluated are excluded from bracketing, so a
/// sign flip caused by dropped terms is never mistaken for a root.
fn bisect(cash_flows: &[Money]) -> HorizonResult<Rate> {
    let mut prev: Option<(Decimal, Decimal)> = None;
    let mut bracket = None;
    let mut last_residual = Decimal::MAX;

    let mut rate = RATE_FLOOR;
    while rate <= SCAN_CEIL {
        let eval = evaluate_npv(cash_flows, rate);
        if eval.complete {
            if eval.npv.abs() < NPV_TOLERANCE {
                return Ok(rate);
            }
            last_residual = eval.npv;
            if let Some((prev_rate, prev_npv)) = prev {
                if (eval.npv < Decimal::ZERO) != (prev_npv < Decimal::ZERO) {
                    bracket = Some((prev_rate, rate, prev_npv));
                    break;
                }
            }
            prev = Some((rate, eval.npv));
        } else {
            prev = None;
        }
        rate += SCAN_STEP;
    }

    let Some((mut lo, mut hi, mut f_lo)) = bracket else {
        return Err(HorizonError::ConvergenceFailure {
            iterations: 0,
            last_delta: last_residual,
        });
    };

    for i in 0..MAX_BISECTION_ITERATIONS {
        let mid = (lo + hi) / dec!(2);
        if mid == lo || mid == hi {
            // Bracket collapsed to adjacent representable rates.
            return Err(HorizonError::ConvergenceFailure {
                iterations: i,
                last_delta: last_residual,
            });
        }
        let f_mid = evaluate_npv(cash_flows, mid).npv;
        if f_mid.abs() < NPV_TOLERANCE {
            return Ok(mid);
        }
        last_residual = f_mid;
        if (f_mid < Decimal::ZERO) == (f_lo < Decimal::ZERO) {
            lo = mid;
            f_lo = f_mid;
        } else {
            hi = mid;
        }
    }

    Err(HorizonError::ConvergenceFailure {
        iterations: MAX_BISECTION_ITERATIONS,
        last_delta: last_residual,
    })
}

/// Input for a standalone cash-flow IRR computation
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CashFlowIrrInput {
    /// Periodic cash flows (index 0 = first period)
    pub cash_flows: Vec<Money>,
    /// Compounding periods per year for annualization
    #[serde(default = "default_periods_per_year")]
    pub periods_per_year: u32,
}

fn default_periods_per_year() -> u32 {
    12
}

/// Output of a standalone cash-flow IRR computation
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CashFlowIrrOutput {
    pub periodic_rate: Rate,
    pub annualized_rate: Rate,
}

/// Solve the periodic IRR of an explicit cash-flow list and annualize it.
pub fn cash_flow_irr(
    input: &CashFlowIrrInput,
) -> HorizonResult<ComputationOutput<CashFlowIrrOutput>> {
    let start = Instant::now();

    if input.periods_per_year == 0 {
        return Err(HorizonError::InvalidInput {
            field: "periods_per_year".into(),
            reason: "Compounding periods per year must be positive".into(),
        });
    }

    let periodic = irr(&input.cash_flows, DEFAULT_IRR_GUESS)?;
    let annualized = annualize(periodic, input.periods_per_year);

    let output = CashFlowIrrOutput {
        periodic_rate: periodic,
        annualized_rate: annualized,
    };

    let elapsed = start.elapsed().as_micros() as u64;
    Ok(with_metadata(
        "Periodic IRR via Newton-Raphson with bisection fallback, annualized as (1+r)^p - 1",
        &serde_json::json!({
            "periods_per_year": input.periods_per_year,
            "cash_flow_count": input.cash_flows.len(),
        }),
        Vec::new(),
        elapsed,
        output,
    ))
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    #[test]
    fn test_npv_basic() {
        let cfs = vec![dec!(-1000), dec!(300), dec!(400), dec!(500)];
        let result = npv(dec!(0.10), &cfs).unwrap();
        // NPV at 10%: -1000 + 300/1.1 + 400/1.21 + 500/1.331 ≈ -21.04
        assert!((result - dec!(-21.04)).abs() < dec!(1.0));
    }

    #[test]
    fn test_npv_zero_rate() {
        let cfs = vec![dec!(-100), dec!(50), dec!(50), dec!(50)];
        let result = npv(dec!(0.0), &cfs).unwrap();
        assert_eq!(result, dec!(50));
    }

    #[test]
    fn test_npv_rejects_rate_below_minus_one() {
        let cfs = vec![dec!(-100), dec!(50)];
        assert!(npv(dec!(-1), &cfs).is_err());
    }

    #[test]
    fn test_irr_basic() {
        let cfs = vec![dec!(-1000), dec!(400), dec!(400), dec!(400)];
        let result = irr(&cfs, DEFAULT_IRR_GUESS).unwrap();
        // IRR should be ~9.7%
        assert!((result - dec!(0.097)).abs() < dec!(0.01));
    }

    #[test]
    fn test_irr_flat_dca_year_is_zero() {
        // 12 monthly contributions of 1000 at a constant price buy 120
        // shares worth 12000 at the end; the rate that zeroes the NPV is 0.
        let mut cfs = vec![dec!(-1000); 12];
        *cfs.last_mut().unwrap() += dec!(12000);
        let result = irr(&cfs, DEFAULT_IRR_GUESS).unwrap();
        assert!(result.abs() < dec!(0.0001), "got {result}");
    }

    #[test]
    fn test_irr_matches_constant_growth() {
        // Prices growing 1% per month: DCA cash flows solve to exactly the
        // monthly growth rate.
        let mut price = dec!(100);
        let mut shares = Decimal::ZERO;
        let mut cfs = Vec::new();
        for _ in 0..12 {
            shares += dec!(1000) / price;
            cfs.push(dec!(-1000));
            price *= dec!(1.01);
        }
        let final_value = shares * (price / dec!(1.01));
        *cfs.last_mut().unwrap() += final_value;

        let result = irr(&cfs, DEFAULT_IRR_GUESS).unwrap();
        assert!((result - dec!(0.01)).abs() < dec!(0.0005), "got {result}");
    }

    #[test]
    fn test_irr_negative_for_losses() {
        let mut cfs = vec![dec!(-1000); 12];
        // End worth half of what went in.
        *cfs.last_mut().unwrap() += dec!(6000);
        let result = irr(&cfs, DEFAULT_IRR_GUESS).unwrap();
        assert!(result < Decimal::ZERO);
    }

    #[test]
    fn test_irr_no_sign_change() {
        let cfs = vec![dec!(-100), dec!(-100), dec!(-100)];
        let err = irr(&cfs, DEFAULT_IRR_GUESS).unwrap_err();
        assert!(matches!(err, HorizonError::NoSignChange));
    }

    #[test]
    fn test_irr_requires_two_flows() {
        let err = irr(&[dec!(-100)], DEFAULT_IRR_GUESS).unwrap_err();
        assert!(matches!(err, HorizonError::InsufficientData(_)));
    }

    #[test]
    fn test_annualize() {
        assert_eq!(annualize(Decimal::ZERO, 12), Decimal::ZERO);
        // 1.01^12 - 1 ≈ 0.1268250301
        let annual = annualize(dec!(0.01), 12);
        assert!((annual - dec!(0.1268250301)).abs() < dec!(0.0000001));
    }

    #[test]
    fn test_cash_flow_irr_envelope() {
        let mut cfs = vec![dec!(-1000); 12];
        *cfs.last_mut().unwrap() += dec!(12000);
        let out = cash_flow_irr(&CashFlowIrrInput {
            cash_flows: cfs,
            periods_per_year: 12,
        })
        .unwrap();
        assert!(out.result.periodic_rate.abs() < dec!(0.0001));
        assert!(out.result.annualized_rate.abs() < dec!(0.002));
    }
}

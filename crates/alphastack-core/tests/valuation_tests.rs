use alphastack_core::report::{compare_to_market, Verdict, DEFAULT_FAIR_VALUE_BAND};
use alphastack_core::stress::simulate_drawdown;
use alphastack_core::valuation::{
    compute_free_cash_flow, compute_terminal_value, dcf, project_cash_flows, DividendDiscount,
    ModelKind, RelativePe, ValuationMethod, ValuationModel,
};
use alphastack_core::{AlphaStackError, AssumptionSet, Currency, FinancialSnapshot};
use rust_decimal::{Decimal, MathematicalOps};
use rust_decimal_macros::dec;

fn reference_snapshot() -> FinancialSnapshot {
    FinancialSnapshot {
        ticker: Some("TCS.NS".into()),
        currency: Currency::INR,
        revenue: dec!(1000),
        ebit: None,
        capital_expenditure: dec!(100),
        depreciation: dec!(50),
        change_in_working_capital: dec!(-20),
        cash: dec!(200),
        debt: dec!(100),
        shares_outstanding: dec!(50),
        net_income: Some(dec!(150)),
        dividends: Some(dec!(40)),
    }
}

fn reference_assumptions() -> AssumptionSet {
    AssumptionSet {
        revenue_growth_rate: dec!(10),
        ebit_margin: dec!(20),
        tax_rate: dec!(25),
        discount_rate: dec!(10),
        terminal_growth_rate: dec!(3),
        forecast_years: 5,
    }
}

// ===========================================================================
// DCF reference chain
// ===========================================================================

#[test]
fn test_reference_chain_reproduces_exactly() {
    let snap = reference_snapshot();
    let a = reference_assumptions();

    let base = compute_free_cash_flow(&snap, &a);
    assert_eq!(base, dec!(120));

    let projection = project_cash_flows(base, &a).unwrap();
    assert_eq!(projection[0].projected, dec!(132));
    assert_eq!(projection[0].discounted, dec!(120));
}

#[test]
fn test_reference_valuation_values() {
    let result = dcf::valuate(&reference_snapshot(), &reference_assumptions()).unwrap();

    // Growth equals the discount rate: every discounted year is 120
    assert_eq!(result.pv_of_cash_flows, dec!(600));
    // Last projected = 120 * 1.1^5 = 193.26120
    assert_eq!(result.projection[4].projected, dec!(193.26120));
    // TV = 193.2612 * 1.03 / 0.07; PV(TV) = TV / 1.1^5 = 120 * 1.03 / 0.07 = 1765.714...
    assert!((result.discounted_terminal_value - dec!(1765.7142857)).abs() < dec!(0.0001));
    assert!((result.enterprise_value - dec!(2365.7142857)).abs() < dec!(0.0001));
    assert!((result.equity_value - dec!(2465.7142857)).abs() < dec!(0.0001));
    assert!((result.intrinsic_value_per_share - dec!(49.3142857)).abs() < dec!(0.0001));
}

#[test]
fn test_projection_length_and_order() {
    for n in 1..=10u32 {
        let a = AssumptionSet {
            forecast_years: n,
            ..reference_assumptions()
        };
        let projection = project_cash_flows(dec!(120), &a).unwrap();
        assert_eq!(projection.len(), n as usize);
        let years: Vec<u32> = projection.iter().map(|p| p.year).collect();
        assert_eq!(years, (1..=n).collect::<Vec<_>>());
    }
}

#[test]
fn test_terminal_value_rejects_growth_at_or_above_discount() {
    let pairs = [
        (dec!(10), dec!(10)),
        (dec!(10), dec!(12)),
        (dec!(0), dec!(0)),
        (dec!(5), dec!(49.9)),
        (dec!(-2), dec!(-1)),
    ];
    for (discount, growth) in pairs {
        let a = AssumptionSet {
            discount_rate: discount,
            terminal_growth_rate: growth,
            ..reference_assumptions()
        };
        let err = compute_terminal_value(dec!(100), &a).unwrap_err();
        assert!(
            matches!(err, AlphaStackError::InvalidAssumptions { .. }),
            "discount {discount} / growth {growth} should be rejected"
        );
        assert!(dcf::valuate(&reference_snapshot(), &a).is_err());
    }
}

#[test]
fn test_valuate_is_deterministic() {
    let first = dcf::valuate(&reference_snapshot(), &reference_assumptions()).unwrap();
    for _ in 0..5 {
        let again = dcf::valuate(&reference_snapshot(), &reference_assumptions()).unwrap();
        assert_eq!(first, again);
        assert_eq!(
            serde_json::to_string(&first).unwrap(),
            serde_json::to_string(&again).unwrap()
        );
    }
}

#[test]
fn test_doubling_shares_halves_per_share_value() {
    let snap = reference_snapshot();
    let mut doubled = snap.clone();
    doubled.shares_outstanding = snap.shares_outstanding * dec!(2);

    let a = reference_assumptions();
    let base = dcf::valuate(&snap, &a).unwrap();
    let halved = dcf::valuate(&doubled, &a).unwrap();

    assert_eq!(base.equity_value, halved.equity_value);
    assert_eq!(
        halved.intrinsic_value_per_share * dec!(2),
        base.intrinsic_value_per_share
    );
}

#[test]
fn test_zero_growth_zero_margin() {
    let a = AssumptionSet {
        revenue_growth_rate: Decimal::ZERO,
        ebit_margin: Decimal::ZERO,
        ..reference_assumptions()
    };
    let snap = reference_snapshot();
    let result = dcf::valuate(&snap, &a).unwrap();

    // 0 + 50 - 100 + 20
    let base = dec!(-30);
    assert_eq!(result.base_cash_flow, base);
    assert!(result.projection.iter().all(|p| p.projected == base));

    let annuity: Decimal = (1..=5u64)
        .map(|y| Decimal::ONE / (Decimal::ONE + dec!(0.10)).powi(y as i64))
        .sum();
    let expected_ev = base * annuity + result.discounted_terminal_value;
    assert!((result.enterprise_value - expected_ev).abs() < dec!(0.000001));
}

#[test]
fn test_non_positive_shares_fail_with_invalid_snapshot() {
    for shares in [Decimal::ZERO, dec!(-10)] {
        let mut snap = reference_snapshot();
        snap.shares_outstanding = shares;
        let err = dcf::valuate(&snap, &reference_assumptions()).unwrap_err();
        assert!(matches!(err, AlphaStackError::InvalidSnapshot { .. }));
    }
}

#[test]
fn test_loss_making_company_values_negative() {
    let mut snap = reference_snapshot();
    snap.ebit = Some(dec!(-400));
    snap.cash = Decimal::ZERO;
    let result = dcf::valuate(&snap, &reference_assumptions()).unwrap();
    assert!(result.intrinsic_value_per_share < Decimal::ZERO);
}

// ===========================================================================
// Model polymorphism
// ===========================================================================

#[test]
fn test_every_method_produces_a_result() {
    let snap = reference_snapshot();
    let a = reference_assumptions();
    let methods = vec![
        ValuationMethod::Dcf,
        ValuationMethod::RelativePe {
            peer_pe_ratios: vec![dec!(18), dec!(22), dec!(30)],
        },
        ValuationMethod::DividendDiscount,
    ];
    let kinds: Vec<ModelKind> = methods
        .iter()
        .map(|m| m.valuate(&snap, &a).unwrap().model)
        .collect();
    assert_eq!(
        kinds,
        vec![ModelKind::Dcf, ModelKind::RelativePe, ModelKind::DividendDiscount]
    );
}

#[test]
fn test_models_behind_trait_objects() {
    let models: Vec<Box<dyn ValuationModel>> = vec![
        Box::new(dcf::DiscountedCashFlow),
        Box::new(RelativePe::new(vec![dec!(20)])),
        Box::new(DividendDiscount),
    ];
    for model in &models {
        let result = model
            .valuate(&reference_snapshot(), &reference_assumptions())
            .unwrap();
        assert_eq!(result.model, model.kind());
        assert_eq!(
            result.intrinsic_value_per_share,
            result.equity_value / dec!(50)
        );
    }
}

// ===========================================================================
// Stress test and verdict
// ===========================================================================

#[test]
fn test_drawdown_reference() {
    let r = simulate_drawdown("COVID-19 (2020)", dec!(50), Some(dec!(100)), Some(dec!(70))).unwrap();
    assert_eq!(r.percent_drop, dec!(-30));
    assert_eq!(r.simulated_current_price, dec!(35));
}

#[test]
fn test_verdict_reference() {
    let c = compare_to_market(dec!(120), dec!(100), DEFAULT_FAIR_VALUE_BAND).unwrap();
    assert_eq!(c.percent_difference, dec!(20));
    assert_eq!(c.verdict, Verdict::Undervalued);
}

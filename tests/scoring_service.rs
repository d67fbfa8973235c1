mod common;

use common::{demo_service, fixed_service};
use shockrisk::recommendations::{AdviceSource, RangeStatus, Severity, Treatment};
use shockrisk::{Feature, RawInputs, RiskError, RiskTier};

#[test]
fn demo_model_flags_scenario_patient_as_high_risk() {
    let service = demo_service();
    let inputs = RawInputs::new(0.5, 180.0, 25.0, false, false, false);

    let result = service.score(&inputs).unwrap();
    let expected = 1.0 / (1.0 + (-1.3f64).exp());
    assert!((result.probability - expected).abs() < 1e-9, "got {}", result.probability);
    assert_eq!(result.risk_tier, RiskTier::High);

    let sources: Vec<AdviceSource> = result.recommendations.iter().map(|r| r.source).collect();
    assert_eq!(
        sources,
        vec![
            AdviceSource::Range { feature: Feature::Lym, status: RangeStatus::Below },
            AdviceSource::Range { feature: Feature::Hb, status: RangeStatus::Above },
            AdviceSource::Range { feature: Feature::Alb, status: RangeStatus::Below },
            AdviceSource::Treatment { treatment: Treatment::AceiArb },
            AdviceSource::Treatment { treatment: Treatment::ReperfusionTherapy },
            AdviceSource::Treatment { treatment: Treatment::Ecmo },
        ]
    );
    assert!(result.recommendations[0].message.contains("towards 0.8"));
    assert!(result.recommendations[1].message.starts_with("Hb (g/L): Your value is 180.0."));
    assert!(result.recommendations[1].message.contains("towards 170"));
    assert!(result.recommendations[2].message.contains("towards 35"));
}

#[test]
fn demo_model_treated_patient_in_range_is_low_risk() {
    let service = demo_service();
    let result = service
        .score(&RawInputs::new(2.0, 140.0, 40.0, true, true, true))
        .unwrap();

    let expected = 1.0 / (1.0 + 1.75f64.exp());
    assert!((result.probability - expected).abs() < 1e-9);
    assert_eq!(result.risk_tier, RiskTier::Low);
    assert!(result.recommendations.is_empty());
    assert_eq!(result.probability_percent(), "14.80%");
}

#[test]
fn probability_stays_in_unit_interval_across_input_domain() {
    let service = demo_service();
    for lym in [0.0, 0.8, 1.5, 4.0, 8.0] {
        for hb in [0.0, 90.0, 150.0, 200.0] {
            for alb in [0.0, 30.0, 50.0] {
                for flags in 0..8u8 {
                    let inputs = RawInputs::new(lym, hb, alb, flags & 1 != 0, flags & 2 != 0, flags & 4 != 0);
                    let result = service.score(&inputs).unwrap();
                    assert!((0.0..=1.0).contains(&result.probability));
                    if result.risk_tier == RiskTier::Low {
                        assert!(result.recommendations.is_empty());
                    }
                }
            }
        }
    }
}

#[test]
fn scoring_is_idempotent() {
    let service = demo_service();
    let inputs = RawInputs::new(0.9, 110.0, 33.0, true, false, false).with_beta_blocker(false);
    let first = service.score(&inputs).unwrap();
    let second = service.score(&inputs).unwrap();
    assert_eq!(first.probability.to_bits(), second.probability.to_bits());
    assert_eq!(first.recommendations, second.recommendations);
}

#[test]
fn extended_flags_only_affect_advice() {
    let service = fixed_service(0.9);
    let base = RawInputs::new(2.0, 140.0, 40.0, true, true, true);
    let extended = base.with_beta_blocker(false).with_surgery(false);

    let plain = service.score(&base).unwrap();
    let with_extra = service.score(&extended).unwrap();
    assert_eq!(plain.probability, with_extra.probability);

    let treatments: Vec<&str> = with_extra
        .recommendations
        .iter()
        .filter(|r| matches!(r.source, AdviceSource::Treatment { .. }))
        .map(|r| r.message.as_str())
        .collect();
    assert_eq!(
        treatments,
        vec![
            "Consider using β-receptor blocker medication.",
            "Consider undergoing surgery therapy.",
        ]
    );
}

#[test]
fn lym_reference_bounds_are_not_flagged() {
    let service = fixed_service(0.99);
    for lym in [0.8, 4.0] {
        let result = service
            .score(&RawInputs::new(lym, 150.0, 40.0, true, true, true))
            .unwrap();
        assert_eq!(result.risk_tier, RiskTier::High);
        let lym_rec = &result.recommendations[0];
        assert_eq!(lym_rec.severity, Severity::Info);
        assert_eq!(
            lym_rec.source,
            AdviceSource::Range { feature: Feature::Lym, status: RangeStatus::Within }
        );
    }
}

#[test]
fn low_tier_never_has_recommendations() {
    let service = fixed_service(0.2);
    let result = service
        .score(&RawInputs::new(0.1, 10.0, 5.0, false, false, false).with_surgery(false))
        .unwrap();
    assert_eq!(result.risk_tier, RiskTier::Low);
    assert!(result.recommendations.is_empty());
}

#[test]
fn invalid_input_is_rejected_and_service_keeps_working() {
    let service = demo_service();

    let err = service
        .score(&RawInputs::new(1.0, 250.0, 40.0, true, true, true))
        .unwrap_err();
    assert!(matches!(err, RiskError::Validation { ref field, .. } if field == "hb"));

    let err = service
        .score(&RawInputs::new(1.0, 120.0, f64::NAN, true, true, true))
        .unwrap_err();
    assert!(matches!(err, RiskError::Validation { ref field, .. } if field == "alb"));

    assert!(service.score(&RawInputs::new(1.0, 120.0, 40.0, true, true, true)).is_ok());
}

#[test]
fn service_can_be_shared_across_threads() {
    let service = std::sync::Arc::new(demo_service());
    let handles: Vec<_> = (0..4)
        .map(|i| {
            let service = std::sync::Arc::clone(&service);
            std::thread::spawn(move || {
                let inputs = RawInputs::new(0.5 + i as f64, 130.0, 36.0, i % 2 == 0, false, true);
                service.score(&inputs).map(|r| r.probability)
            })
        })
        .collect();

    for handle in handles {
        let probability = handle.join().unwrap().unwrap();
        assert!((0.0..=1.0).contains(&probability));
    }
}

#[test]
fn model_output_outside_unit_interval_is_model_error() {
    let inputs = RawInputs::new(0.5, 180.0, 25.0, false, false, false);
    for probability in [f64::NAN, 1.5, -0.2, f64::INFINITY] {
        let err = fixed_service(probability).score(&inputs).unwrap_err();
        assert!(
            matches!(err, RiskError::Model { .. }),
            "probability {probability} gave {err:?}"
        );
    }

    for probability in [0.0, 1.0] {
        assert!(fixed_service(probability).score(&inputs).is_ok());
    }
}

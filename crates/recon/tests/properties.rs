// Property-based tests for normalization, extraction and the reconcile pass.
// CI: 256 cases (default). Soak: PROPTEST_CASES=10000 cargo test --release

use proptest::prelude::*;
use stockfern_recon::config::MatchSettings;
use stockfern_recon::engine::reconcile;
use stockfern_recon::extract::{parse_quantity, BlockExtractor};
use stockfern_recon::model::{CandidateRecord, CatalogRow, MatchMethod};
use stockfern_recon::normalize::{normalize_display, normalize_key};
use stockfern_recon::similarity::TokenSetRatio;

// ---------------------------------------------------------------------------
// Config
// ---------------------------------------------------------------------------

fn config_256() -> ProptestConfig {
    ProptestConfig {
        cases: std::env::var("PROPTEST_CASES")
            .ok()
            .and_then(|s| s.parse().ok())
            .unwrap_or(256),
        failure_persistence: None,
        ..ProptestConfig::default()
    }
}

// ---------------------------------------------------------------------------
// Generators
// ---------------------------------------------------------------------------

const CODES: &[&str] = &["AB-123", "AB-12", "CD-9", "EF_77", "gh.5", "ZX 100"];
const ATTRS: &[&str] = &["แดง", "ดำ", "ขาว", "red", ""];

fn arb_catalog() -> impl Strategy<Value = Vec<CatalogRow>> {
    proptest::collection::vec(
        (
            proptest::sample::select(CODES),
            proptest::sample::select(ATTRS),
            0i64..500,
        ),
        0..8,
    )
    .prop_map(|rows| {
        rows.into_iter()
            .map(|(code, attr, qty)| CatalogRow::new(code, attr, qty))
            .collect()
    })
}

/// Context: some noise, maybe a catalog code (mangled), maybe a color.
fn arb_candidate() -> impl Strategy<Value = CandidateRecord> {
    (
        r"[a-zA-Zก-ฮ ]{0,12}",
        proptest::option::of(proptest::sample::select(CODES)),
        proptest::sample::select(ATTRS),
        0i64..1000,
    )
        .prop_map(|(noise, code, attr, quantity)| {
            let code = code.map(|c| c.replace('-', "")).unwrap_or_default();
            CandidateRecord {
                context: normalize_display(&format!("{noise} {code} {attr}")),
                quantity,
                attribute_guess: attr.to_string(),
                source_tag: "prop".into(),
                page: 1,
            }
        })
}

fn arb_settings() -> impl Strategy<Value = MatchSettings> {
    (0u8..=100).prop_map(|fuzzy_min_score| MatchSettings {
        fuzzy_min_score,
        ..MatchSettings::default()
    })
}

fn arb_line() -> impl Strategy<Value = String> {
    prop_oneof![
        3 => r"[A-Za-z0-9ก-ฮ \-]{1,16}",
        2 => r"[0-9]{1,4}",
        1 => Just(String::new()),
    ]
}

// ---------------------------------------------------------------------------
// Properties
// ---------------------------------------------------------------------------

proptest! {
    #![proptest_config(config_256())]

    #[test]
    fn key_normalization_is_idempotent(s in r"[A-Za-z0-9ก-๙ _./\\\-\t]{0,30}") {
        let once = normalize_key(&s);
        prop_assert_eq!(normalize_key(&once), once.clone());
        prop_assert!(!once.chars().any(char::is_whitespace));
    }

    #[test]
    fn display_normalization_is_idempotent(s in r"[A-Za-z0-9ก-๙ \t\n]{0,30}") {
        let once = normalize_display(&s);
        prop_assert_eq!(normalize_display(&once), once.clone());
    }

    #[test]
    fn every_candidate_is_accounted_for(
        catalog in arb_catalog(),
        candidates in proptest::collection::vec(arb_candidate(), 0..20),
        settings in arb_settings(),
    ) {
        let pass = reconcile(&catalog, &candidates, &settings, &TokenSetRatio).unwrap();

        prop_assert_eq!(pass.audit_log.len(), candidates.len());
        prop_assert_eq!(pass.quarantine.len() + pass.summary.resolved, candidates.len());
        prop_assert_eq!(pass.increments.len(), catalog.len());
        prop_assert_eq!(pass.catalog.len(), catalog.len());
    }

    #[test]
    fn quantities_are_conserved(
        catalog in arb_catalog(),
        candidates in proptest::collection::vec(arb_candidate(), 0..20),
        settings in arb_settings(),
    ) {
        let pass = reconcile(&catalog, &candidates, &settings, &TokenSetRatio).unwrap();

        let total: i64 = candidates.iter().map(|c| c.quantity).sum();
        let matched: i64 = pass.increments.iter().sum();
        let held: i64 = pass.quarantine.iter().map(|q| q.quantity).sum();
        prop_assert_eq!(matched + held, total);

        for (i, row) in pass.catalog.iter().enumerate() {
            prop_assert_eq!(row.quantity, catalog[i].quantity + pass.increments[i]);
            prop_assert_eq!(row.code(), catalog[i].code());
        }
    }

    #[test]
    fn confidence_bands_follow_method(
        catalog in arb_catalog(),
        candidates in proptest::collection::vec(arb_candidate(), 0..20),
        settings in arb_settings(),
    ) {
        let pass = reconcile(&catalog, &candidates, &settings, &TokenSetRatio).unwrap();
        for entry in &pass.audit_log {
            match entry.method {
                MatchMethod::CodeAndAttribute => prop_assert_eq!(entry.confidence, 100),
                MatchMethod::CodeOnly => prop_assert_eq!(entry.confidence, 90),
                MatchMethod::Fuzzy => {
                    prop_assert!(entry.confidence <= 89);
                    prop_assert!(entry.confidence >= settings.fuzzy_min_score);
                }
                MatchMethod::Unresolved => {
                    prop_assert_eq!(entry.confidence, 0);
                    prop_assert_eq!(entry.matched_code.as_str(), "-");
                }
            }
        }
    }

    #[test]
    fn reconcile_is_deterministic(
        catalog in arb_catalog(),
        candidates in proptest::collection::vec(arb_candidate(), 0..20),
    ) {
        let settings = MatchSettings::default();
        let a = reconcile(&catalog, &candidates, &settings, &TokenSetRatio).unwrap();
        let b = reconcile(&catalog, &candidates, &settings, &TokenSetRatio).unwrap();
        prop_assert_eq!(a.audit_log, b.audit_log);
        prop_assert_eq!(a.increments, b.increments);
        prop_assert_eq!(a.summary, b.summary);
    }

    #[test]
    fn extraction_only_emits_at_anchors(
        lines in proptest::collection::vec(arb_line(), 0..30),
        window in 1usize..5,
    ) {
        let records: Vec<_> = BlockExtractor::new(lines.iter(), window).collect();
        let anchors = lines
            .iter()
            .filter(|l| parse_quantity(l.trim()).is_some())
            .count();
        prop_assert!(records.len() <= anchors);
        for r in &records {
            prop_assert!(!r.context.is_empty());
            prop_assert!(r.quantity >= 0);
        }
    }
}

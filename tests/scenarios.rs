// tests/scenarios.rs
//
// Handpicked content samples through the public scoring API.

use misinfo_verifier::analyze::heuristic::{FLAG_HEALTH, FLAG_NO_SOURCES, FLAG_SENSATIONAL};
use misinfo_verifier::analyze::{blend, parse_analysis_reply, score_content, BlendInputs};
use misinfo_verifier::Status;

#[test]
fn attributed_who_statement() {
    let r = score_content(
        "Scientists confirm new finding. According to https://who.int, results are preliminary.",
    );
    assert!(r.sources.iter().any(|s| s.name == "who.int"));
    assert!(r
        .analysis
        .highlights
        .iter()
        .any(|h| h.to_lowercase().contains("external references")));
    assert!(!r.analysis.flags.iter().any(|f| f == FLAG_NO_SOURCES));
}

#[test]
fn breaking_cancer_cure_chain_message() {
    let r = score_content(
        "BREAKING: 100% guaranteed cure for cancer, doctors hate this, forward to everyone immediately!!",
    );
    assert_eq!(r.status, Status::False);
    assert!(r.trust_score < 50);
    assert!(r.analysis.flags.iter().any(|f| f == FLAG_SENSATIONAL));
    assert!(r.analysis.flags.iter().any(|f| f == FLAG_HEALTH));
}

#[test]
fn single_clean_link() {
    let r = score_content("Report available at https://example.org/report");
    assert!(matches!(r.status, Status::Verified | Status::Suspicious));
    assert_eq!(r.sources.len(), 1);
    assert!((60..=95).contains(&r.sources[0].credibility));
    assert!(r.analysis.source_quality > 65);
}

#[test]
fn prose_wrapped_oracle_reply() {
    let a = parse_analysis_reply(r#"Sure, here's the analysis: {"trustScore": 42, "flags": ["bias"]}"#);
    assert_eq!(a.trust_score, Some(42));
}

#[test]
fn blend_reference_points() {
    let all = |x| BlendInputs {
        factual_accuracy: x,
        bias: x,
        source_quality: x,
        explicit: None,
    };
    assert_eq!(blend(&all(100), 0, 0), 100);
    assert_eq!(blend(&all(0), 6, 0), 0);
}

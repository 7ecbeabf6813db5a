//! Scoring engine scenarios and properties over generated tick sequences.

use std::time::{Duration, Instant};

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

use cleanliness_monitor::{
    BenchIdentity, ScoringPolicy, ScoringSession, SessionState, TickOutcome, MAX_SCORE,
};

fn new_session(start: Instant) -> ScoringSession {
    ScoringSession::new(
        ScoringPolicy::default(),
        BenchIdentity::new("231549999", "66"),
        start,
    )
}

fn at(start: Instant, secs: u64) -> Instant {
    start + Duration::from_secs(secs)
}

/// Random tick schedule: increasing offsets in milliseconds, random evidence.
fn random_ticks(rng: &mut StdRng, count: usize, max_step_ms: u64) -> Vec<(u64, bool)> {
    let mut offset = 0u64;
    (0..count)
        .map(|_| {
            offset += rng.gen_range(0..=max_step_ms);
            (offset, rng.gen_bool(0.6))
        })
        .collect()
}

#[test]
fn scenario_a_first_detection_deducts() {
    let t0 = Instant::now();
    let mut session = new_session(t0);

    let outcome = session.tick(t0, true);
    assert!(outcome.deducted());
    assert_eq!(session.total_score(), 80);
    assert_eq!(session.event_count(), 1);
    assert_eq!(session.last_event_time(), Some(t0));
}

#[test]
fn scenario_b_detection_inside_cooldown_is_rate_limited() {
    let t0 = Instant::now();
    let mut session = new_session(t0);

    session.tick(t0, true);
    let outcome = session.tick(at(t0, 3), true);
    assert_eq!(outcome, TickOutcome::Alert { event: None });
    assert_eq!(session.total_score(), 80);
    assert_eq!(session.event_count(), 1);
}

#[test]
fn scenario_c_detection_after_cooldown_deducts_again() {
    let t0 = Instant::now();
    let mut session = new_session(t0);

    session.tick(t0, true);
    assert!(session.tick(at(t0, 6), true).deducted());
    assert_eq!(session.total_score(), 60);
    assert_eq!(session.event_count(), 2);
}

#[test]
fn scenario_d_score_floors_at_zero() {
    let t0 = Instant::now();
    let mut session = new_session(t0);

    for secs in [0, 6, 12, 18, 24] {
        assert!(session.tick(at(t0, secs), true).deducted());
    }
    assert_eq!(session.total_score(), 0);

    assert!(session.tick(at(t0, 30), true).deducted());
    assert_eq!(session.total_score(), 0);
    assert_eq!(session.event_count(), 6);
}

#[test]
fn scenario_e_period_end_emits_frozen_report_once() {
    let t0 = Instant::now();
    let mut session = new_session(t0);
    session.tick(at(t0, 2), true);
    session.tick(at(t0, 10), true);

    let outcome = session.tick(at(t0, 31), true);
    let TickOutcome::Ended(report) = outcome else {
        panic!("expected the period to end, got {:?}", outcome);
    };
    assert_eq!(report.cleanliness_score, 60);
    assert_eq!(report.student_id, "231549999");
    assert_eq!(report.bench_id, "66");
    assert_eq!(session.state(), SessionState::Ended);

    for secs in 32..40 {
        assert_eq!(session.tick(at(t0, secs), true), TickOutcome::Idle);
    }
    assert_eq!(session.total_score(), 60);
    assert_eq!(session.event_count(), 2);
}

#[test]
fn score_is_monotone_and_bounded() {
    let mut rng = StdRng::seed_from_u64(7);
    for _ in 0..50 {
        let t0 = Instant::now();
        let mut session = new_session(t0);
        let mut previous = session.total_score();
        for (ms, evidence) in random_ticks(&mut rng, 400, 300) {
            session.tick(t0 + Duration::from_millis(ms), evidence);
            let score = session.total_score();
            assert!(score <= previous);
            assert!(score <= MAX_SCORE);
            previous = score;
        }
    }
}

#[test]
fn deductions_are_spaced_by_more_than_cooldown() {
    let mut rng = StdRng::seed_from_u64(11);
    let cooldown = ScoringPolicy::default().cooldown;
    for _ in 0..50 {
        let t0 = Instant::now();
        let mut session = new_session(t0);
        let mut deductions: Vec<u64> = Vec::new();
        for (ms, evidence) in random_ticks(&mut rng, 400, 250) {
            if session.tick(t0 + Duration::from_millis(ms), evidence).deducted() {
                deductions.push(ms);
            }
        }
        for pair in deductions.windows(2) {
            assert!(Duration::from_millis(pair[1] - pair[0]) > cooldown);
        }
    }
}

#[test]
fn exactly_one_final_report_after_period() {
    let mut rng = StdRng::seed_from_u64(23);
    let period = ScoringPolicy::default().period;
    for _ in 0..50 {
        let t0 = Instant::now();
        let mut session = new_session(t0);
        let mut reports = 0;
        for (ms, evidence) in random_ticks(&mut rng, 600, 200) {
            let elapsed = Duration::from_millis(ms);
            let outcome = session.tick(t0 + elapsed, evidence);
            if let TickOutcome::Ended(_) = outcome {
                reports += 1;
                assert!(elapsed > period);
            }
            if elapsed <= period {
                assert_eq!(session.state(), SessionState::Active);
            }
        }
        let last = t0 + period + Duration::from_secs(1);
        if session.tick(last, false) != TickOutcome::Idle {
            reports += 1;
        }
        assert_eq!(reports, 1);
        assert!(session.final_report_sent());
    }
}

#[test]
fn ended_sessions_ignore_everything() {
    let mut rng = StdRng::seed_from_u64(31);
    let t0 = Instant::now();
    let mut session = new_session(t0);
    session.tick(t0, true);
    session.tick(at(t0, 45), false);
    let frozen = session.summary();

    for (ms, evidence) in random_ticks(&mut rng, 200, 500) {
        let outcome = session.tick(at(t0, 45) + Duration::from_millis(ms), evidence);
        assert!(outcome.is_idle());
    }
    assert_eq!(session.summary(), frozen);
}

#[test]
fn evidence_free_session_keeps_full_score() {
    let t0 = Instant::now();
    let mut session = new_session(t0);
    for secs in 0..=30 {
        assert_eq!(session.tick(at(t0, secs), false), TickOutcome::Clear);
    }
    let TickOutcome::Ended(report) = session.tick(at(t0, 31), false) else {
        panic!("expected the period to end");
    };
    assert_eq!(report.cleanliness_score, MAX_SCORE);
}

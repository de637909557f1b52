use chrono::{Duration, TimeZone, Utc};
use criterion::{criterion_group, criterion_main, BenchmarkId, Criterion};
use std::hint::black_box;

use appointment_gate::{
    detect_conflicts, validate_scheduling, AppointmentStatus, BookingRequest, ConflictCandidate,
    GateConfig, UnitBalance,
};

/// A month of half-hour bookings spread across 20 clients and 8 team members.
fn siblings(count: usize) -> Vec<ConflictCandidate> {
    let base = Utc.with_ymd_and_hms(2026, 3, 1, 8, 0, 0).unwrap();
    (0..count)
        .map(|i| {
            let start = base + Duration::minutes(30 * i as i64);
            ConflictCandidate {
                id: format!("appt-{i}"),
                client_id: format!("client-{}", i % 20),
                team_id: Some(format!("staff-{}", i % 8)),
                start_time: Some(start),
                end_time: Some(start + Duration::minutes(45)),
                status: if i % 10 == 0 {
                    AppointmentStatus::Cancelled
                } else {
                    AppointmentStatus::Scheduled
                },
            }
        })
        .collect()
}

fn bench_conflict_scan(c: &mut Criterion) {
    let mut group = c.benchmark_group("detect_conflicts");
    let request = BookingRequest {
        start_time: Utc.with_ymd_and_hms(2026, 3, 5, 10, 0, 0).unwrap(),
        end_time: Utc.with_ymd_and_hms(2026, 3, 5, 11, 0, 0).unwrap(),
        client_id: "client-3".to_string(),
        team_id: Some("staff-5".to_string()),
        exclude_id: None,
    };

    for count in [100usize, 1_000, 10_000] {
        let data = siblings(count);
        group.bench_with_input(BenchmarkId::from_parameter(count), &data, |b, data| {
            b.iter(|| detect_conflicts(black_box(&request), black_box(data)))
        });
    }
    group.finish();

    let data = siblings(1_000);
    let config = GateConfig::default();
    c.bench_function("validate_scheduling_1000", |b| {
        b.iter(|| {
            validate_scheduling(
                black_box(&request),
                black_box(&data),
                UnitBalance::from_parts(Some(40), Some(4)),
                &config,
            )
        })
    });
}

criterion_group!(benches, bench_conflict_scan);
criterion_main!(benches);

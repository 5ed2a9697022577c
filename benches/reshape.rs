use aq_collector::{Measurement, MeasurementTable, Parameter};
use chrono::{Duration, TimeZone, Utc};
use criterion::{black_box, criterion_group, criterion_main, Criterion};

fn synthetic_rows(hours: i64) -> Vec<Measurement> {
    let start = Utc.with_ymd_and_hms(2024, 3, 1, 0, 0, 0).unwrap();
    let mut rows = Vec::new();
    for hour in 0..hours {
        for (i, parameter) in Parameter::ALL.iter().enumerate() {
            for location in ["Reseda", "Burbank", "North Main Street"] {
                rows.push(Measurement {
                    timestamp: start + Duration::hours(hour),
                    parameter: *parameter,
                    value: (hour as f64) * 0.5 + i as f64,
                    unit: "µg/m³".to_string(),
                    location: location.to_string(),
                    city: Some("Los Angeles".to_string()),
                    country: Some("US".to_string()),
                });
            }
        }
    }
    rows
}

fn bench_reshape(c: &mut Criterion) {
    let rows = synthetic_rows(24 * 30);
    c.bench_function("from_measurements", |b| {
        b.iter(|| MeasurementTable::from_measurements(black_box(&rows), &Parameter::ALL))
    });

    let table = MeasurementTable::from_measurements(&rows, &Parameter::ALL).unwrap();
    c.bench_function("to_long_frame", |b| b.iter(|| black_box(&table).to_long_frame()));
}

criterion_group!(benches, bench_reshape);
criterion_main!(benches);

use chrono::{Duration, NaiveDate, TimeZone, Utc};
use criterion::{black_box, criterion_group, criterion_main, BatchSize, Criterion};
use mealbank::ledger::{
    compute_cycle, progress_for, AppState, Bank, CycleReport, Goals, LedgerMeta, Meal, MealType,
};
use mealbank::storage::{JsonStore, StateStore};
use tempfile::tempdir;

fn build_history(meal_count: usize) -> Vec<Meal> {
    let start = Utc.with_ymd_and_hms(2024, 1, 1, 12, 0, 0).unwrap();
    (0..meal_count)
        .map(|idx| {
            let kind = MealType::ALL[idx % MealType::ALL.len()];
            Meal::new(kind, start + Duration::hours((idx * 7) as i64))
        })
        .collect()
}

fn bench_cycle_accounting(c: &mut Criterion) {
    let meals = build_history(black_box(10_000));
    let anchor = NaiveDate::from_ymd_opt(2025, 1, 1).unwrap();
    let now = Utc.with_ymd_and_hms(2024, 6, 15, 9, 0, 0).unwrap();
    let cycle = compute_cycle(now, anchor, chrono_tz::Europe::Paris);

    c.bench_function("compute_cycle", |b| {
        b.iter(|| black_box(compute_cycle(black_box(now), anchor, chrono_tz::Europe::Paris)))
    });

    c.bench_function("progress_for_10k", |b| {
        b.iter(|| black_box(progress_for(&meals, cycle.start, cycle.end)))
    });

    c.bench_function("cycle_report_10k", |b| {
        b.iter(|| {
            let report = CycleReport::build(cycle, &meals, &Goals::default(), &Bank::new(3, 4, 1));
            black_box(report);
        })
    });
}

fn bench_json_store(c: &mut Criterion) {
    let dir = tempdir().expect("tempdir");
    let store = JsonStore::new(dir.path().to_path_buf(), Some(2)).expect("store");
    let state = AppState::new(LedgerMeta::default(), build_history(10_000));

    c.bench_function("json_store_replace_all_10k", |b| {
        b.iter(|| store.replace_all(&state).expect("replace"))
    });

    store.replace_all(&state).expect("seed");

    c.bench_function("json_store_append_meal_10k", |b| {
        b.iter_batched(
            || Meal::new(MealType::Vegan, Utc::now()),
            |meal| store.append_meal(&meal).expect("append"),
            BatchSize::SmallInput,
        )
    });
}

criterion_group!(benches, bench_cycle_accounting, bench_json_store);
criterion_main!(benches);

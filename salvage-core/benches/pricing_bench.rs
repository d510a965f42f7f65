//! Criterion benchmarks for pricing hot paths.
//!
//! Benchmarks:
//! 1. Statistical analysis (clean, estimate, round) at several listing counts
//! 2. Cleaning stages in isolation
//! 3. Prompt building for the AI path
//! 4. Parallel multi-part analysis

use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion};

use salvage_core::pricing::ai::prompt::build_prompt;
use salvage_core::pricing::{
    ListingFilter, OutlierFilter, PricedItem, RemovalLog, StatisticalPricingAnalyzer,
};
use salvage_core::run::{analyze_all, PartListings};
use salvage_core::{PartQuery, PricingRequest, RawListing, VehicleInfo};

// ── Helpers ──────────────────────────────────────────────────────────

const TITLES: &[&str] = &[
    "2012 Ford F150 5.0L engine motor 98k miles",
    "OEM engine assembly tested",
    "Engine oil filter housing",
    "Engine mount passenger side",
    "Complete engine long block",
];

fn make_listings(n: usize) -> Vec<RawListing> {
    (0..n)
        .map(|i| {
            let price = 800.0 + (i as f64 * 0.37).sin() * 400.0 + (i % 7) as f64 * 25.0;
            let shipping = if i % 3 == 0 { 0.0 } else { 150.0 };
            RawListing::new(TITLES[i % TITLES.len()], price, shipping)
        })
        .collect()
}

fn engine_part() -> PartQuery {
    PartQuery::new("engine", "33615").with_minimum_price(300.0)
}

// ── 1. Statistical analysis ──────────────────────────────────────────

fn bench_statistical(c: &mut Criterion) {
    let mut group = c.benchmark_group("statistical_analysis");
    let analyzer = StatisticalPricingAnalyzer::new();
    let part = engine_part();

    for &count in &[5, 50, 200, 1000] {
        let listings = make_listings(count);
        group.bench_with_input(BenchmarkId::new("engine", count), &count, |b, _| {
            b.iter(|| analyzer.analyze_listings(black_box(&part), black_box(&listings)));
        });
    }

    group.finish();
}

// ── 2. Cleaning stages ───────────────────────────────────────────────

fn bench_outlier(c: &mut Criterion) {
    let items: Vec<PricedItem> = make_listings(200).iter().map(PricedItem::from).collect();

    c.bench_function("iqr_outlier_200", |b| {
        b.iter(|| {
            let mut log = RemovalLog::new();
            let kept = OutlierFilter::new().apply(black_box(items.clone()), &mut log);
            black_box((kept, log));
        });
    });
}

// ── 3. Prompt building ───────────────────────────────────────────────

fn bench_prompt(c: &mut Criterion) {
    let part = engine_part();
    let listings = make_listings(200);
    let mut vehicle = VehicleInfo::new("2012", "Ford", "F-150");
    vehicle.drive_type = Some("4WD/4-Wheel Drive/4x4".into());
    vehicle.engine = Some("5.0L 8-cyl".into());

    c.bench_function("build_prompt_200", |b| {
        b.iter(|| {
            let request = PricingRequest::new(&part, &listings)
                .with_vehicle(&vehicle)
                .with_instructions("Ignore remanufactured units.");
            black_box(build_prompt(black_box(&request)))
        });
    });
}

// ── 4. Multi-part run ────────────────────────────────────────────────

fn bench_analyze_all(c: &mut Criterion) {
    let analyzer = StatisticalPricingAnalyzer::new();
    let inputs: Vec<PartListings> = salvage_core::domain::default_parts()
        .into_iter()
        .map(|part| PartListings {
            part,
            listings: make_listings(200),
        })
        .collect();

    c.bench_function("analyze_all_default_parts_200", |b| {
        b.iter(|| analyze_all(black_box(&inputs), None, None, &analyzer));
    });
}

criterion_group!(
    benches,
    bench_statistical,
    bench_outlier,
    bench_prompt,
    bench_analyze_all,
);
criterion_main!(benches);

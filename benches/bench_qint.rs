use std::hint::black_box;
use std::str::FromStr;

use criterion::{Criterion, criterion_group, criterion_main};
use num_rational::Ratio;
use qint::{QInt, rounding};

fn bench_addition(c: &mut Criterion) {
    c.bench_function("qint_addition", |b| {
        let x = QInt::from_str("123.456789").unwrap();
        let y = QInt::from_str("987.654321").unwrap();
        b.iter(|| black_box(black_box(x).try_add(black_box(y)).unwrap()));
    });
}

fn bench_subtraction(c: &mut Criterion) {
    c.bench_function("qint_subtraction", |b| {
        let x = QInt::from_str("987.654321").unwrap();
        let y = QInt::from_str("123.456789").unwrap();
        b.iter(|| black_box(black_box(x).try_sub(black_box(y)).unwrap()));
    });
}

fn bench_multiplication(c: &mut Criterion) {
    c.bench_function("qint_multiplication", |b| {
        let x = QInt::from_str("123.456789").unwrap();
        let y = QInt::from_str("9.876543").unwrap();
        b.iter(|| black_box(black_box(x).try_mul(black_box(y)).unwrap()));
    });
}

fn bench_multiplication_at(c: &mut Criterion) {
    c.bench_function("qint_multiplication_at_6", |b| {
        let x = QInt::from_str("123.456789").unwrap();
        let y = QInt::from_str("9.876543").unwrap();
        b.iter(|| black_box(black_box(x).mul_at(black_box(y), 6).unwrap()));
    });
}

fn bench_division_at(c: &mut Criterion) {
    c.bench_function("qint_division_at_6", |b| {
        let x = QInt::from_str("123.456789").unwrap();
        let y = QInt::from_str("9.876543").unwrap();
        b.iter(|| black_box(black_box(x).div_at(black_box(y), 6).unwrap()));
    });
}

fn bench_scale_safe_add(c: &mut Criterion) {
    c.bench_function("qint_scale_safe_add", |b| {
        let x = QInt::from_str("123.45").unwrap();
        let y = QInt::from_str("0.000001").unwrap();
        b.iter(|| black_box(black_box(x).scale_safe_add(black_box(y)).unwrap()));
    });
}

fn bench_price_times_ratio(c: &mut Criterion) {
    c.bench_function("qint_price_times_ratio", |b| {
        let price = QInt::from_str("123.45").unwrap();
        let fraction = Ratio::new(2i64, 3);
        b.iter(|| black_box(black_box(price).try_mul(black_box(fraction)).unwrap()));
    });
}

fn bench_bankers_divide(c: &mut Criterion) {
    c.bench_function("qint_bankers_divide", |b| {
        b.iter(|| black_box(rounding::bankers_divide(black_box(123_456_789), black_box(1_000)).unwrap()));
    });
}

fn bench_rounding(c: &mut Criterion) {
    c.bench_function("qint_round_to_2_decimals", |b| {
        let d = QInt::from_str("123.456789").unwrap();
        b.iter(|| black_box(black_box(d).scale(2).unwrap()));
    });
}

fn bench_create_from_f64(c: &mut Criterion) {
    c.bench_function("qint_create_from_f64", |b| {
        b.iter(|| black_box(QInt::create(black_box(123.456789), 6).unwrap()));
    });
}

fn bench_parsing(c: &mut Criterion) {
    c.bench_function("qint_parsing", |b| {
        b.iter(|| black_box(QInt::from_str("123.456789").unwrap()));
    });
}

fn bench_formatting(c: &mut Criterion) {
    c.bench_function("qint_formatting", |b| {
        let d = QInt::from_str("123.456789").unwrap();
        b.iter(|| black_box(format!("{}", d)));
    });
}

fn bench_sum(c: &mut Criterion) {
    c.bench_function("qint_sum_1000_values", |b| {
        let values: Vec<QInt> = (0..1000)
            .map(|i| QInt::from_str(&format!("{}.{:02}", i, i % 100)).unwrap())
            .collect();
        b.iter(|| {
            black_box(
                values
                    .iter()
                    .try_fold(QInt::zero(2), |acc, x| acc.try_add(*x))
                    .unwrap(),
            )
        });
    });
}

fn bench_comparison(c: &mut Criterion) {
    c.bench_function("qint_comparison", |b| {
        let x = QInt::from_str("123.456789").unwrap();
        let y = QInt::from_str("123.456790").unwrap();
        b.iter(|| black_box(black_box(x).try_lt(black_box(y)).unwrap()));
    });
}

fn bench_pow(c: &mut Criterion) {
    c.bench_function("qint_pow", |b| {
        let d = QInt::from_str("1.05").unwrap();
        b.iter(|| black_box(black_box(d).try_pow(5).unwrap()));
    });
}

criterion_group!(
    benches,
    bench_addition,
    bench_subtraction,
    bench_multiplication,
    bench_multiplication_at,
    bench_division_at,
    bench_scale_safe_add,
    bench_price_times_ratio,
    bench_bankers_divide,
    bench_rounding,
    bench_create_from_f64,
    bench_parsing,
    bench_formatting,
    bench_sum,
    bench_comparison,
    bench_pow,
);

criterion_main!(benches);

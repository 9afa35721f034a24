//! Criterion benchmarks for the implicit schemes and the GMRES solver.

use std::hint::black_box;

use criterion::{criterion_group, criterion_main, Criterion};
use nalgebra::{DMatrix, DVector};
use simframe_bench::{diffusion_profile, laplacian};
use simframe_schemes::{gmres, GmresOptions, SchemeKind};

fn bench_implicit_euler_direct_128(c: &mut Criterion) {
    c.bench_function("implicit_euler_direct_128", |b| {
        b.iter(|| {
            let mut p = diffusion_profile(SchemeKind::ImplicitEuler, 128, 1.0, 1.0).unwrap();
            black_box(p.frame.run().unwrap());
        });
    });
}

fn bench_implicit_euler_gmres_128(c: &mut Criterion) {
    c.bench_function("implicit_euler_gmres_128", |b| {
        b.iter(|| {
            let mut p =
                diffusion_profile(SchemeKind::ImplicitEulerGmres, 128, 1.0, 1.0).unwrap();
            black_box(p.frame.run().unwrap());
        });
    });
}

/// Raw GMRES on `I − 0.1·L` for 256 cells.
fn bench_gmres_solve_256(c: &mut Criterion) {
    let n = 256;
    let a = DMatrix::<f64>::identity(n, n) - laplacian(n, 1.0) * 0.1;
    let rhs = DVector::from_fn(n, |i, _| (i as f64 * 0.1).sin());
    let options = GmresOptions::default().with_rtol(1e-8);

    c.bench_function("gmres_solve_256", |b| {
        b.iter(|| {
            let sol = gmres::solve(&a, &rhs, &rhs, &options).unwrap();
            black_box(&sol);
        });
    });
}

criterion_group!(
    benches,
    bench_implicit_euler_direct_128,
    bench_implicit_euler_gmres_128,
    bench_gmres_solve_256
);
criterion_main!(benches);

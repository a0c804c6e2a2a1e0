use criterion::{black_box, criterion_group, criterion_main, Criterion};
use physalia_frag::bow::Bow;
use physalia_frag::library::FragmentLibrary;
use physalia_frag::source::{BowBuilder, BowSource};
use physalia_struct::types::Point3D;

/// Synthesize a library file of `n` fragments of `k` CAs each, shaped as
/// progressively twisted helices so every fragment is distinct.
fn library_text(n: usize, k: usize) -> String {
    let mut text = String::new();
    let mut serial = 1;
    for frag in 0..n {
        let turn = 80.0 + frag as f64 * (40.0 / n as f64);
        for i in 0..k {
            let angle = (i as f64) * turn.to_radians();
            let x = 2.3 * angle.cos();
            let y = 2.3 * angle.sin();
            let z = i as f64 * 1.5;
            text.push_str(&format!(
                "ATOM  {:>5}  CA  ALA A{:>4}    {:>8.3}{:>8.3}{:>8.3}  1.00  0.00\n",
                serial,
                i + 1,
                x,
                y,
                z
            ));
            serial += 1;
        }
        text.push_str("TER\n");
    }
    text
}

struct HelixSource {
    cas: Vec<Point3D>,
}

impl BowSource for HelixSource {
    fn id(&self) -> String {
        "bench".to_string()
    }

    fn atom_chunks(&self) -> Vec<Vec<Point3D>> {
        vec![self.cas.clone()]
    }
}

fn helix_chain(n: usize) -> Vec<Point3D> {
    (0..n)
        .map(|i| {
            let angle = (i as f64) * 97.0_f64.to_radians();
            Point3D::new(2.3 * angle.cos(), 2.3 * angle.sin(), i as f64 * 1.5)
        })
        .collect()
}

fn bench_build(c: &mut Criterion) {
    let mut group = c.benchmark_group("bow_build");
    group.sample_size(20);

    let lib = FragmentLibrary::parse("bench", &library_text(40, 6)).unwrap();
    let source = HelixSource {
        cas: helix_chain(100),
    };

    group.bench_function("100_residues_40_fragments", |b| {
        let mut builder = BowBuilder::new(&lib);
        b.iter(|| builder.build(black_box(&source)))
    });

    group.finish();
}

fn bench_metrics(c: &mut Criterion) {
    let mut group = c.benchmark_group("bow_metrics");

    let mut a = Bow::new(400);
    let mut b = Bow::new(400);
    for i in 0..400 {
        if i % 3 == 0 {
            a.increment(i);
        }
        if i % 5 == 0 {
            b.increment(i);
        }
    }

    group.bench_function("cosine_400", |bench| {
        bench.iter(|| black_box(&a).cosine(black_box(&b)).unwrap())
    });
    group.bench_function("euclid_400", |bench| {
        bench.iter(|| black_box(&a).euclid(black_box(&b)).unwrap())
    });

    group.finish();
}

criterion_group!(benches, bench_build, bench_metrics);
criterion_main!(benches);

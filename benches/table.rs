use criterion::{black_box, criterion_group, criterion_main, Criterion};
use k23_table::{FuncIndex, Limits, Linker, Module, Ref, Store, Table, TableType};
use wasmparser::{RefType, Validator};

fn table(minimum: u32, maximum: Option<u32>) -> Table {
    Table::new(&TableType::new(
        RefType::FUNCREF,
        Limits { minimum, maximum },
    ))
}

pub fn criterion_benchmark(c: &mut Criterion) {
    let mut group = c.benchmark_group("Table");
    group.bench_function("grow 1024 one at a time", |b| {
        b.iter(|| {
            let mut t = table(0, None);
            for _ in 0..1024 {
                black_box(t.grow_with_null(1));
            }
            t
        })
    });
    group.bench_function("get/set", |b| {
        let mut t = table(1024, None);
        let value = Ref::Func(FuncIndex::from_u32(1));
        b.iter(|| {
            for i in 0..1024 {
                t.set(black_box(i), value).unwrap();
                black_box(t.get(black_box(i)).unwrap());
            }
        })
    });
    group.bench_function("write_slice 1024", |b| {
        let mut t = table(1024, None);
        let donor = vec![Ref::Func(FuncIndex::from_u32(7)); 1024];
        b.iter(|| t.write_slice(black_box(&donor), 0, 0, 1024).unwrap())
    });
    group.finish();

    let mut group = c.benchmark_group("Instantiate");
    group.bench_function("active segments", |b| {
        let mut validator = Validator::new();
        let module = Module::from_wat(
            &mut validator,
            r#"
            (module
                (table 64 funcref)
                (func $a)
                (func $b)
                (elem (i32.const 0) func $a $b $a $b $a $b $a $b)
                (elem (i32.const 32) funcref (ref.func $b) (ref.null func) (ref.func $a)))
            "#,
        )
        .unwrap();
        let linker = Linker::new();

        b.iter(|| {
            let mut store = Store::new();
            black_box(linker.instantiate(&mut store, &module).unwrap());
            store
        })
    });
}

criterion_group!(benches, criterion_benchmark);
criterion_main!(benches);

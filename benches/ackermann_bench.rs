use criterion::{Criterion, criterion_group, criterion_main};
use minijit::demos;
use minijit::jit::{Module, Target};
use std::hint::black_box;

fn bench_ackermann(c: &mut Criterion) {
    c.bench_function("ackermann_native_2_3", |b| {
        b.iter(|| demos::ackermann_native(black_box(2), black_box(3)));
    });

    c.bench_function("ackermann_build_and_link", |b| {
        b.iter(|| {
            let mut module = Module::new(Target::X86_64SysV);
            let ack = demos::build_ackermann(&mut module);
            module.link().unwrap();
            black_box(module.get_funcptr(ack));
        });
    });

    c.bench_function("ackermann_jit_2_3", |b| {
        let mut module = Module::new(Target::X86_64SysV);
        let ack = demos::build_ackermann(&mut module);
        module.link().unwrap();
        let entry: unsafe extern "C" fn(i64, i64) -> i64 = unsafe { module.funcptr(ack) };
        b.iter(|| unsafe { entry(black_box(2), black_box(3)) });
    });
}

criterion_group!(benches, bench_ackermann);
criterion_main!(benches);

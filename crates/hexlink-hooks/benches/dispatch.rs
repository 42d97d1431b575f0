//! Benchmarks for firing hook events.

use std::cell::Cell;
use std::rc::Rc;

use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion};

use hexlink_hooks::{EventArg, HookAction, HookResult, HookTable, PriorityHook};

struct Table;

impl HookTable for Table {
    fn has_event(&self, _event: &str) -> bool {
        true
    }

    fn install(&mut self, _event: &str) -> bool {
        true
    }

    fn uninstall(&mut self, _event: &str) -> bool {
        true
    }

    fn hook(&mut self) -> bool {
        true
    }

    fn unhook(&mut self) -> bool {
        true
    }

    fn call_default(&self, _event: &str, args: &[EventArg]) -> i64 {
        args.len() as i64
    }

    fn renew(&self) -> Self {
        Table
    }
}

fn bench_dispatch(c: &mut Criterion) {
    let mut group = c.benchmark_group("dispatch");
    let args = [EventArg::Address(0x401000), EventArg::Int(1)];

    for count in [1usize, 8, 64] {
        let counter = Rc::new(Cell::new(0u64));
        let mut hooks = PriorityHook::new(Table);
        for i in 0..count {
            let counter = counter.clone();
            hooks
                .add_with_priority(
                    "ev_newprc",
                    Rc::new(move |_: &[EventArg]| -> HookResult {
                        counter.set(counter.get() + 1);
                        Ok(HookAction::Continue)
                    }),
                    (i % 7) as i32,
                )
                .unwrap();
        }

        group.bench_with_input(BenchmarkId::new("callbacks", count), &count, |b, _| {
            b.iter(|| hooks.dispatch(black_box("ev_newprc"), black_box(&args)))
        });
    }

    group.finish();
}

criterion_group!(benches, bench_dispatch);
criterion_main!(benches);

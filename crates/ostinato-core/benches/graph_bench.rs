//! Criterion benchmarks for the pipeline graph registry (`ostinato-core::graph`).
//!
//! Two axes:
//!
//! - **Build**: create + connect a linear chain of N components
//! - **Lookup**: driver resolution and id lookup on a populated registry
//!
//! Run with: `cargo bench -p ostinato-core -- graph/`
#![allow(missing_docs)]

use std::sync::Arc;

use criterion::{BenchmarkId, Criterion, black_box, criterion_group, criterion_main};
use ostinato_core::{
    BufferDescriptor, CompDescriptor, ComponentConfig, ComponentOps, ComponentType,
    ConnectDescriptor, CoreId, CountingCache, DriverInfo, DriverList, EntryId, GraphRegistry,
    PipelineId, PoolAllocator, TypeUuid,
};

const CHAIN_LENGTHS: &[u32] = &[4, 16, 64, 256];

struct Nop;
impl ComponentOps for Nop {}

fn nop(_: &ComponentConfig) -> ostinato_core::Result<Box<dyn ComponentOps>> {
    Ok(Box::new(Nop))
}

fn drivers() -> DriverList {
    let mut list = DriverList::new();
    for code in 0..24 {
        list.register(DriverInfo {
            type_code: ComponentType(code),
            uuid: TypeUuid::from_bytes([code as u8; 16]),
            name: "bench",
            factory: nop,
        });
    }
    list
}

/// Builds comp(0) -> buf(1) -> comp(2) -> ... with `len` components.
fn build_chain(len: u32) -> GraphRegistry {
    let mut graph = GraphRegistry::new(
        drivers(),
        Arc::new(PoolAllocator::new(0, 1 << 28)),
        Arc::new(CountingCache::new()),
    );
    let core = CoreId::PRIMARY;
    for i in 0..len {
        let comp = EntryId(i * 2);
        graph
            .create_component(&CompDescriptor::new(
                comp,
                ComponentType::MIXER,
                PipelineId(1),
                0,
            ))
            .unwrap();
        if i > 0 {
            let link = ConnectDescriptor {
                source_id: EntryId(i * 2 - 1),
                sink_id: comp,
            };
            graph.connect(core, &link).unwrap();
        }
        if i + 1 < len {
            let buf = EntryId(i * 2 + 1);
            graph
                .create_buffer(&BufferDescriptor::new(buf, PipelineId(1), 0, 1024))
                .unwrap();
            let link = ConnectDescriptor {
                source_id: comp,
                sink_id: buf,
            };
            graph.connect(core, &link).unwrap();
        }
    }
    graph
}

fn bench_build(c: &mut Criterion) {
    let mut group = c.benchmark_group("graph/build");
    for &len in CHAIN_LENGTHS {
        group.bench_with_input(BenchmarkId::from_parameter(len), &len, |b, &len| {
            b.iter(|| black_box(build_chain(len)));
        });
    }
    group.finish();
}

fn bench_lookup(c: &mut Criterion) {
    let mut group = c.benchmark_group("graph/lookup");
    let list = drivers();
    let by_type = CompDescriptor::new(EntryId(1), ComponentType(23), PipelineId(1), 0);
    let by_uuid = by_type.clone().with_uuid(TypeUuid::from_bytes([23; 16]));
    group.bench_function("driver_by_type", |b| {
        b.iter(|| black_box(list.resolve(black_box(&by_type)).is_ok()));
    });
    group.bench_function("driver_by_uuid", |b| {
        b.iter(|| black_box(list.resolve(black_box(&by_uuid)).is_ok()));
    });

    let graph = build_chain(256);
    group.bench_function("pipe_id", |b| {
        b.iter(|| black_box(graph.pipe_id(black_box(EntryId(301)))));
    });
    group.bench_function("endpoint", |b| {
        b.iter(|| {
            black_box(graph.pipeline_endpoint(PipelineId(1), ostinato_core::EndpointSide::Sink))
        });
    });
    group.finish();
}

criterion_group!(benches, bench_build, bench_lookup);
criterion_main!(benches);

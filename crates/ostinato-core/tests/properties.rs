//! Property-based tests for the ostinato-core graph registry.
//!
//! Drives the registry with randomized request sequences and checks the
//! invariants that must hold after every step: unique ids, rejected requests
//! leave no trace, and `inter_core` matches the endpoint cores.

use std::sync::Arc;

use ostinato_core::{
    BufferDescriptor, CompDescriptor, ComponentConfig, ComponentOps, ComponentType,
    ConnectDescriptor, CoreId, CountingCache, DriverInfo, DriverList, EntryId, GraphRegistry,
    PipelineId, PoolAllocator, Trigger, TypeUuid,
};
use proptest::prelude::*;

struct Nop;
impl ComponentOps for Nop {}

fn nop(_: &ComponentConfig) -> ostinato_core::Result<Box<dyn ComponentOps>> {
    Ok(Box::new(Nop))
}

fn registry() -> GraphRegistry {
    let mut drivers = DriverList::new();
    drivers.register(DriverInfo {
        type_code: ComponentType::MIXER,
        uuid: TypeUuid::from_bytes([4; 16]),
        name: "mixer",
        factory: nop,
    });
    GraphRegistry::new(
        drivers,
        Arc::new(PoolAllocator::new(0x1000, 1 << 22)),
        Arc::new(CountingCache::new()),
    )
    .with_core_count(2)
}

#[derive(Clone, Debug)]
enum Op {
    Component(u32, u32),
    Buffer(u32, u32),
    Connect(u32, u32, u32),
    Trigger(u32, u32, usize),
    FreeBuffer(u32, u32),
    FreeComponent(u32, u32),
}

fn op() -> impl Strategy<Value = Op> {
    let id = 1u32..12;
    let core = 0u32..2;
    prop_oneof![
        (id.clone(), core.clone()).prop_map(|(i, c)| Op::Component(i, c)),
        (id.clone(), core.clone()).prop_map(|(i, c)| Op::Buffer(i, c)),
        (core.clone(), id.clone(), id.clone()).prop_map(|(c, a, b)| Op::Connect(c, a, b)),
        (core.clone(), id.clone(), 0usize..7).prop_map(|(c, i, t)| Op::Trigger(c, i, t)),
        (core.clone(), id.clone()).prop_map(|(c, i)| Op::FreeBuffer(c, i)),
        (core, id).prop_map(|(c, i)| Op::FreeComponent(c, i)),
    ]
}

const TRIGGERS: [Trigger; 7] = [
    Trigger::Prepare,
    Trigger::Start,
    Trigger::Pause,
    Trigger::Release,
    Trigger::Stop,
    Trigger::Xrun,
    Trigger::Reset,
];

fn core(raw: u32) -> CoreId {
    CoreId::new(raw).unwrap()
}

fn run(graph: &mut GraphRegistry, op: &Op) -> bool {
    match *op {
        Op::Component(id, c) => graph
            .create_component(&CompDescriptor::new(
                EntryId(id),
                ComponentType::MIXER,
                PipelineId(1),
                c,
            ))
            .is_ok(),
        Op::Buffer(id, c) => graph
            .create_buffer(&BufferDescriptor::new(EntryId(id), PipelineId(1), c, 256))
            .is_ok(),
        Op::Connect(c, a, b) => graph
            .connect(
                core(c),
                &ConnectDescriptor {
                    source_id: EntryId(a),
                    sink_id: EntryId(b),
                },
            )
            .is_ok(),
        Op::Trigger(c, id, t) => graph.trigger(core(c), EntryId(id), TRIGGERS[t]).is_ok(),
        Op::FreeBuffer(c, id) => graph.free_buffer(core(c), EntryId(id)).is_ok(),
        Op::FreeComponent(c, id) => graph.free_component(core(c), EntryId(id)).is_ok(),
    }
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(300))]

    /// Failed requests never change the registry, and every buffer's
    /// `inter_core` flag is set whenever a connected endpoint sits on
    /// another core.
    #[test]
    fn registry_invariants_hold(ops in prop::collection::vec(op(), 1..60)) {
        let mut graph = registry();
        for op in &ops {
            let before = graph.summaries();
            if !run(&mut graph, op) {
                prop_assert_eq!(&graph.summaries(), &before, "failed {:?} mutated the graph", op);
            }

            let ids: Vec<_> = graph.iter().map(|e| e.header().id).collect();
            let mut sorted = ids.clone();
            sorted.dedup();
            prop_assert_eq!(ids.len(), sorted.len());

            for buf in graph.iter().filter_map(|e| e.as_buffer()) {
                for end in [buf.source(), buf.sink()].into_iter().flatten() {
                    let comp = graph.component(end);
                    prop_assert!(comp.is_some(), "{:?} links to missing {}", buf.id(), end);
                    let comp = comp.unwrap();
                    if comp.core() != buf.core() {
                        prop_assert!(buf.is_inter_core());
                        prop_assert!(comp.is_shared());
                    }
                }
            }
        }
    }

    /// Creating the same id twice always fails the second time, whatever
    /// kind either request was for.
    #[test]
    fn duplicate_ids_rejected(id in 1u32..100, first_is_buffer: bool, second_is_buffer: bool) {
        let mut graph = registry();
        let create = |graph: &mut GraphRegistry, buffer: bool| {
            if buffer {
                graph.create_buffer(&BufferDescriptor::new(EntryId(id), PipelineId(1), 0, 64))
            } else {
                graph
                    .create_component(&CompDescriptor::new(
                        EntryId(id),
                        ComponentType::MIXER,
                        PipelineId(1),
                        0,
                    ))
                    .map(|_| ())
            }
        };
        prop_assert!(create(&mut graph, first_is_buffer).is_ok());
        let snapshot = graph.summaries();
        prop_assert_eq!(
            create(&mut graph, second_is_buffer),
            Err(ostinato_core::Error::DuplicateId(EntryId(id)))
        );
        prop_assert_eq!(graph.summaries(), snapshot);
    }
}

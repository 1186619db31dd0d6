use criterion::{Criterion, black_box, criterion_group, criterion_main};

use arbor::render::framegraph::{FrameGraph, Resource, ResourceDescription};

struct Blob(u64);

impl ResourceDescription for Blob {
    type Actual = Vec<u8>;

    fn realize(&self) -> anyhow::Result<Vec<u8>> {
        Ok(vec![0; self.0 as usize])
    }

    fn size(&self) -> u64 {
        self.0
    }
}

/// A chain of `len` passes, each reading its predecessor's output, with a
/// dead side branch every fourth pass.
fn chain(len: usize) -> FrameGraph {
    let mut graph = FrameGraph::new();
    let output = graph
        .add_retained_resource("output", Blob(0), Some(Vec::new()))
        .unwrap();

    let mut previous: Option<Resource<Blob>> = None;
    for i in 0..len {
        let last = i + 1 == len;
        let handle = graph
            .add_fn_task(
                format!("pass_{i}"),
                None::<Resource<Blob>>,
                move |out, builder| {
                    if let Some(previous) = previous {
                        builder.read(previous)?;
                    }
                    if last {
                        builder.write(output)?;
                    } else {
                        *out = Some(builder.create(format!("res_{i}"), Blob(256)));
                    }
                    if i % 4 == 0 {
                        builder.create(format!("dead_{i}"), Blob(64));
                    }
                    Ok(())
                },
                |_, _| Ok(()),
            )
            .unwrap();
        previous = *graph.task(handle).unwrap().data();
    }
    graph
}

fn bench_compile_chain_small(c: &mut Criterion) {
    c.bench_function("framegraph_compile_16_passes", |b| {
        let mut graph = chain(16);
        b.iter(|| {
            graph.compile();
            black_box(graph.timeline());
        });
    });
}

fn bench_compile_chain_large(c: &mut Criterion) {
    c.bench_function("framegraph_compile_512_passes", |b| {
        let mut graph = chain(512);
        b.iter(|| {
            graph.compile();
            black_box(graph.timeline());
        });
    });
}

fn bench_build_compile_execute(c: &mut Criterion) {
    c.bench_function("framegraph_frame_64_passes", |b| {
        b.iter(|| {
            let mut graph = chain(64);
            graph.compile();
            graph.execute().unwrap();
            black_box(graph.stats());
        });
    });
}

criterion_group!(
    benches,
    bench_compile_chain_small,
    bench_compile_chain_large,
    bench_build_compile_execute
);
criterion_main!(benches);

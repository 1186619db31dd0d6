mod common;

use std::{cell::Cell, collections::HashMap, rc::Rc};

use rstest::rstest;

use arbor::render::framegraph::{
    CullingPolicy, FrameGraphConfig, GraphError, Resource, ResourceId, TimelineStats,
};
use common::{Harness, Tracked, derealize, execute, realize};

#[rstest]
#[case::consumer_writes_output(false)]
#[case::consumer_cull_immune(true)]
fn depth_is_released_after_its_only_reader(#[case] immune: bool) {
    let mut h = Harness::new();
    let backbuffer = h.retained("backbuffer");

    let (_, created) = h.add("G", h.pass().create("Depth"));
    let depth = created[0];

    let mut lighting = h.pass().read(depth);
    lighting = if immune {
        lighting.cull_immune()
    } else {
        lighting.write(backbuffer)
    };
    h.add("L", lighting);
    h.graph.compile();

    assert_eq!(h.step_names(), ["G", "L"]);
    let timeline = h.graph.timeline();
    assert_eq!(h.names(&timeline[0].realize), ["Depth"]);
    assert!(timeline[0].derealize.is_empty());
    assert!(timeline[1].realize.is_empty());
    assert_eq!(h.names(&timeline[1].derealize), ["Depth"]);

    h.graph.execute().unwrap();
    assert_eq!(
        h.take_events(),
        [realize("Depth"), execute("G"), execute("L"), derealize("Depth")]
    );
}

#[test]
fn unread_output_culls_its_creator() {
    let mut h = Harness::new();
    let (pass, created) = h.add("S", h.pass().create("Ambient"));
    h.graph.compile();

    assert!(h.graph.timeline().is_empty());
    assert!(h.graph.is_culled(pass).unwrap());
    assert_eq!(h.graph.resource_ref_count(created[0].id()).unwrap(), 0);

    h.graph.execute().unwrap();
    assert!(h.take_events().is_empty());
}

#[test]
fn cull_immune_creator_realizes_and_releases_in_one_step() {
    let mut h = Harness::new();
    h.add("S", h.pass().create("Ambient").cull_immune());
    h.graph.compile();

    assert_eq!(h.step_names(), ["S"]);
    let step = &h.graph.timeline()[0];
    assert_eq!(h.names(&step.realize), ["Ambient"]);
    assert_eq!(h.names(&step.derealize), ["Ambient"]);

    h.graph.execute().unwrap();
    assert_eq!(
        h.take_events(),
        [realize("Ambient"), execute("S"), derealize("Ambient")]
    );
}

#[rstest]
#[case::transient_roots(CullingPolicy::TransientRoots, false, &["A", "B"])]
#[case::transient_roots_immune(CullingPolicy::TransientRoots, true, &["A", "B"])]
#[case::retained_roots(CullingPolicy::UnreadRetainedRoots, false, &[])]
#[case::retained_roots_immune(CullingPolicy::UnreadRetainedRoots, true, &["A", "B"])]
fn writers_of_unread_retained_output(
    #[case] culling: CullingPolicy,
    #[case] immune: bool,
    #[case] expected: &[&str],
) {
    let mut h = Harness::with_config(FrameGraphConfig::default().culling(culling));
    let output = h.retained("Output");

    for name in ["A", "B"] {
        let mut pass = h.pass().write(output);
        if immune {
            pass = pass.cull_immune();
        }
        h.add(name, pass);
    }
    h.graph.compile();

    assert_eq!(h.step_names(), expected);
    for step in h.graph.timeline() {
        assert!(step.realize.is_empty());
        assert!(step.derealize.is_empty());
    }

    h.graph.execute().unwrap();
    assert!(h.graph.is_realized(output.id()).unwrap());
}

/// shadow ──► lighting ──► composite ──► (backbuffer)
/// gbuffer ─┘     ▲
/// ssao ──────────┘ (only when enabled)
/// debug: reads gbuffer, output unread
fn deferred_frame(h: &mut Harness, ssao_enabled: bool) {
    let backbuffer = h.retained("backbuffer");

    let (_, shadow) = h.add("shadow", h.pass().create_sized("shadow_map", 64));
    let (_, gbuffer) = h.add(
        "gbuffer",
        h.pass()
            .create_sized("albedo", 32)
            .create_sized("normal", 32)
            .create_sized("depth", 16),
    );
    let (_, ssao) = h.add(
        "ssao",
        h.pass()
            .read(gbuffer[1])
            .read(gbuffer[2])
            .create_sized("occlusion", 8),
    );

    let mut lighting = h
        .pass()
        .read(shadow[0])
        .read(gbuffer[0])
        .read(gbuffer[1])
        .read(gbuffer[2])
        .create_sized("hdr", 64);
    if ssao_enabled {
        lighting = lighting.read(ssao[0]);
    }
    let (_, lit) = h.add("lighting", lighting);

    h.add(
        "debug",
        h.pass().read(gbuffer[1]).create_sized("debug_view", 32),
    );
    h.add("composite", h.pass().read(lit[0]).write(backbuffer));
}

#[rstest]
#[case::ssao_enabled(true, &["shadow", "gbuffer", "ssao", "lighting", "composite"])]
#[case::ssao_disabled(false, &["shadow", "gbuffer", "lighting", "composite"])]
fn deferred_frame_culls_unused_branches(#[case] ssao: bool, #[case] expected: &[&str]) {
    let mut h = Harness::new();
    deferred_frame(&mut h, ssao);
    h.graph.compile();

    assert_eq!(h.step_names(), expected);

    let stats = h.graph.stats();
    assert_eq!(stats.registered_passes, 6);
    assert_eq!(stats.surviving_passes, expected.len());
    assert_eq!(stats.transient_resources, 7);
    assert_eq!(stats.culled_resources, if ssao { 1 } else { 2 });
}

#[rstest]
#[case(true)]
#[case(false)]
fn timeline_properties_hold(#[case] ssao: bool) {
    let mut h = Harness::new();
    deferred_frame(&mut h, ssao);
    h.graph.compile();
    let timeline = h.graph.timeline().to_vec();

    // ordering preserved
    let indices: Vec<usize> = timeline.iter().map(|step| step.pass.index()).collect();
    assert!(indices.windows(2).all(|pair| pair[0] < pair[1]));

    // every realized resource is derealized exactly once, at or after its realize
    let mut realized_at: HashMap<ResourceId, usize> = HashMap::new();
    let mut derealized_at: HashMap<ResourceId, usize> = HashMap::new();
    for (index, step) in timeline.iter().enumerate() {
        for &id in &step.realize {
            assert!(realized_at.insert(id, index).is_none());
        }
        for &id in &step.derealize {
            assert!(derealized_at.insert(id, index).is_none());
        }
    }
    assert_eq!(realized_at.len(), derealized_at.len());
    for (id, realized) in &realized_at {
        assert!(derealized_at[id] >= *realized);
    }

    // unread transients never appear unless their creator is cull-immune
    for id in h.graph.resource_ids() {
        if h.graph.is_transient(id).unwrap() && h.graph.readers(id).unwrap().is_empty() {
            assert!(!realized_at.contains_key(&id));
            assert!(!derealized_at.contains_key(&id));
        }
    }

    // compiling again changes nothing
    h.graph.compile();
    assert_eq!(h.graph.timeline(), timeline.as_slice());
}

#[test]
fn execute_leaves_no_transient_alive() {
    let mut h = Harness::new();
    deferred_frame(&mut h, true);
    h.graph.compile();
    h.graph.execute().unwrap();

    let events = h.take_events();
    let realizes = events
        .iter()
        .filter(|event| matches!(event, common::Event::Realize(_)))
        .count();
    let derealizes = events
        .iter()
        .filter(|event| matches!(event, common::Event::Derealize(_)))
        .count();
    assert_eq!(realizes, 6);
    assert_eq!(realizes, derealizes);

    for id in h.graph.resource_ids() {
        if h.graph.is_transient(id).unwrap() {
            assert!(!h.graph.is_realized(id).unwrap());
        }
    }
}

#[test]
fn peak_transient_bytes_follows_lifetimes() {
    let mut h = Harness::new();
    deferred_frame(&mut h, false);
    h.graph.compile();

    // shadow_map(64) + gbuffer(80) + hdr(64) are alive together at lighting
    assert_eq!(
        h.graph.stats(),
        TimelineStats {
            registered_passes: 6,
            surviving_passes: 4,
            culled_passes: 2,
            transient_resources: 7,
            culled_resources: 2,
            peak_transient_bytes: 208,
        }
    );
}

#[test]
fn cull_immunity_wins_over_reference_count() {
    let mut h = Harness::new();
    let (reader, _) = h.add("reader", h.pass().cull_immune());
    let (lonely, _) = h.add("lonely", h.pass());
    h.graph.compile();

    assert_eq!(h.graph.pass_ref_count(reader).unwrap(), 0);
    assert!(!h.graph.is_culled(reader).unwrap());
    assert!(h.graph.is_culled(lonely).unwrap());
    assert_eq!(h.step_names(), ["reader"]);
}

#[test]
fn writer_of_unread_transient_is_culled_with_its_inputs() {
    let mut h = Harness::new();
    let (r, ys) = h.add("R", h.pass().create("Y"));
    let (p, xs) = h.add("P", h.pass().create("X"));
    let (q, _) = h.add("Q", h.pass().read(ys[0]).write(xs[0]));
    h.graph.compile();

    assert!(h.graph.timeline().is_empty());
    for pass in [r, p, q] {
        assert!(h.graph.is_culled(pass).unwrap());
    }
    assert_eq!(h.graph.resource_ref_count(ys[0].id()).unwrap(), 0);
    assert_eq!(h.graph.stats().surviving_passes, 0);
}

#[derive(Default)]
struct GBufferOutputs {
    color: Option<Resource<Tracked>>,
    velocity: Option<Resource<Tracked>>,
}

#[test]
fn unread_output_of_surviving_pass_is_optional() {
    let mut h = Harness::new();
    let color = h.tracked("color");
    let velocity = h.tracked("velocity");
    let skipped = Rc::new(Cell::new(false));
    let flag = skipped.clone();

    let gbuffer = h
        .graph
        .add_fn_task(
            "gbuffer",
            GBufferOutputs::default(),
            move |outputs, builder| {
                outputs.color = Some(builder.create("color", color));
                outputs.velocity = Some(builder.create("velocity", velocity));
                Ok(())
            },
            move |outputs, ctx| {
                let color = outputs.color.expect("declared in setup");
                let velocity = outputs.velocity.expect("declared in setup");
                ctx.get(color)?;
                assert!(!ctx.is_realized(velocity)?);
                if ctx.try_get(velocity)?.is_none() {
                    flag.set(true);
                }
                Ok(())
            },
        )
        .unwrap();
    let color = h.graph.task(gbuffer).unwrap().data().color.unwrap();
    h.add("present", h.pass().read(color).cull_immune());
    h.graph.compile();

    assert_eq!(h.step_names(), ["gbuffer", "present"]);
    assert_eq!(h.names(&h.graph.timeline()[0].realize), ["color"]);

    h.graph.execute().unwrap();
    assert!(skipped.get());
    assert_eq!(
        h.take_events(),
        [realize("color"), execute("present"), derealize("color")]
    );
}

#[test]
fn culled_reader_does_not_extend_lifetime() {
    let mut h = Harness::new();
    let output = h.retained("output");
    let (_, created) = h.add("producer", h.pass().create("color"));
    let color = created[0];
    h.add("consumer", h.pass().read(color).write(output));
    h.add("inspector", h.pass().read(color).create("histogram"));
    h.graph.compile();

    assert_eq!(h.step_names(), ["producer", "consumer"]);
    assert_eq!(h.names(&h.graph.timeline()[1].derealize), ["color"]);
}

#[test]
fn read_write_in_place_derealizes_once() {
    let mut h = Harness::new();
    let output = h.retained("output");
    let (_, created) = h.add("scene", h.pass().create("hdr"));
    let hdr = created[0];
    h.add("bloom", h.pass().read(hdr).write(hdr));
    h.add("tonemap", h.pass().read(hdr).write(output));
    h.graph.compile();

    assert_eq!(h.step_names(), ["scene", "bloom", "tonemap"]);
    let timeline = h.graph.timeline();
    assert!(timeline[1].derealize.is_empty());
    assert_eq!(h.names(&timeline[2].derealize), ["hdr"]);
    assert_eq!(timeline[2].waits.as_slice(), &[timeline[0].pass, timeline[1].pass]);

    h.graph.execute().unwrap();
    assert_eq!(
        h.take_events(),
        [
            realize("hdr"),
            execute("scene"),
            execute("bloom"),
            execute("tonemap"),
            derealize("hdr"),
        ]
    );
}

#[test]
fn producer_registered_late_is_not_waited_on() {
    let mut h = Harness::new();
    let output = h.retained("output");
    let shared = h.retained("shared");
    h.add("early", h.pass().read(shared).write(output));
    h.add("late", h.pass().write(shared));
    h.graph.compile();

    assert_eq!(h.step_names(), ["early", "late"]);
    assert!(h.graph.timeline()[0].waits.is_empty());
}

#[test]
fn realize_failure_aborts_frame_and_releases_transients() {
    let mut h = Harness::new();
    let output = h.retained("output");
    let (_, first) = h.add("first", h.pass().create("ok"));
    let (_, second) = h.add("second", h.pass().read(first[0]).create_failing("huge"));
    h.add(
        "third",
        h.pass().read(first[0]).read(second[0]).write(output),
    );
    h.graph.compile();

    let err = h.graph.execute().unwrap_err();
    assert!(matches!(&err, GraphError::Realize { resource, .. } if resource == "huge"));
    assert_eq!(
        h.take_events(),
        [realize("ok"), execute("first"), derealize("ok")]
    );
    for id in h.graph.resource_ids() {
        if h.graph.is_transient(id).unwrap() {
            assert!(!h.graph.is_realized(id).unwrap());
        }
    }
}

#[test]
fn task_failure_is_reported_with_pass_name() {
    let mut h = Harness::new();
    let output = h.retained("output");
    let (_, created) = h.add("first", h.pass().create("color"));
    h.add("broken", h.pass().read(created[0]).write(output).failing());
    h.graph.compile();

    let err = h.graph.execute().unwrap_err();
    assert!(matches!(&err, GraphError::TaskFailed { pass, .. } if pass == "broken"));
    assert_eq!(
        h.take_events(),
        [
            realize("color"),
            execute("first"),
            execute("broken"),
            derealize("color"),
        ]
    );
}

#[test]
fn retained_resource_without_actual_is_realized_immediately() {
    let mut h = Harness::new();
    let description = h.tracked("history");
    let history = h
        .graph
        .add_retained_resource("history", description, None)
        .unwrap();

    assert_eq!(h.take_events(), [realize("history")]);
    assert_eq!(h.graph.get(history).unwrap(), "history");
    assert!(!h.graph.is_transient(history.id()).unwrap());

    h.graph.clear();
    assert!(h.take_events().is_empty());
}

#[test]
fn stale_handles_are_rejected_after_clear() {
    let mut h = Harness::new();
    let (_, created) = h.add("first", h.pass().create("color"));
    h.graph.clear();

    let second = h.pass().read(created[0]);
    let err = h.graph.add_render_task("second", second).unwrap_err();
    assert!(matches!(
        err,
        GraphError::StaleHandle {
            handle_epoch: 0,
            graph_epoch: 1
        }
    ));
    assert_eq!(h.graph.pass_count(), 0);
}

#[test]
fn setup_failure_rolls_back_declarations() {
    let mut h = Harness::new();
    let (_, created) = h.add("first", h.pass().create("color"));
    let color = created[0];

    h.graph.clear();
    let (_, created) = h.add("first", h.pass().create("color"));
    let fresh = created[0];

    let bad = h.pass().create("temp").read(fresh).read(color);
    let err = h.graph.add_render_task("bad", bad).unwrap_err();
    assert!(matches!(err, GraphError::StaleHandle { .. }));
    assert_eq!(h.graph.pass_count(), 1);
    assert_eq!(h.graph.resource_count(), 1);
    assert!(h.graph.readers(fresh.id()).unwrap().is_empty());
}

#[test]
fn execute_before_compile_is_an_error() {
    let mut h = Harness::new();
    h.add("first", h.pass().create("color").cull_immune());
    assert!(matches!(h.graph.execute(), Err(GraphError::NotCompiled)));

    h.graph.compile();
    h.graph.execute().unwrap();
    h.add("second", h.pass().cull_immune());
    assert!(matches!(h.graph.execute(), Err(GraphError::NotCompiled)));
}

#[test]
fn blackboard_survives_until_clear() {
    let mut h = Harness::new();
    let output = h.retained("output");
    h.graph.blackboard_mut().insert("output", output);

    let found = h
        .graph
        .blackboard()
        .get::<common::Tracked>("output")
        .unwrap();
    assert_eq!(found, output);

    h.graph.clear();
    assert!(h.graph.blackboard().is_empty());
    assert!(matches!(
        h.graph.blackboard().get::<common::Tracked>("output"),
        Err(GraphError::MissingBlackboardEntry(_))
    ));
}

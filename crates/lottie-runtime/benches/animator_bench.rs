use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion};
use lottie_runtime::data::{BezierTangent, Keyframe};
use lottie_runtime::{AnimatedProperty, AnimationGroup, EasingRegistry, PlayOptions};
use serde_json::json;

const FRAME: f32 = 1.0 / 60.0;

fn eased_keyframes(count: usize) -> Vec<Keyframe<f32>> {
    (0..count)
        .map(|i| {
            let mut kf = Keyframe::at(i as f32 * 10.0, (i % 7) as f32 * 15.0);
            kf.o = Some(BezierTangent::new(0.33, 0.0));
            kf.i = Some(BezierTangent::new(0.67, 1.0));
            kf
        })
        .collect()
}

fn bench_keyframe_evaluation(c: &mut Criterion) {
    let mut group = c.benchmark_group("keyframe_evaluation");
    for count in [2usize, 16, 128] {
        let mut registry = EasingRegistry::new();
        let keyframes = eased_keyframes(count);
        let mut property =
            AnimatedProperty::from_keyframes(&keyframes, &|v: &f32| *v, 0.0, &mut registry);
        let last = (count - 1) as f32 * 10.0;
        group.bench_with_input(BenchmarkId::from_parameter(count), &last, |b, last| {
            let mut frame = 0.0_f32;
            b.iter(|| {
                frame = (frame + 0.37) % last;
                black_box(property.evaluate(black_box(frame)))
            });
        });
    }
    group.finish();
}

/// Shape layers each holding an animated group, a repeater and a stroke.
fn busy_document(layers: usize) -> String {
    let layers: Vec<_> = (0..layers)
        .map(|i| {
            json!({
                "ty": 4, "ind": i + 1, "nm": format!("layer {i}"), "ip": 0, "op": 120,
                "ks": {"r": {"a": 1, "k": [{"t": 0, "s": [0]}, {"t": 120, "s": [360]}]}},
                "shapes": [{"ty": "gr", "it": [
                    {"ty": "sr", "sy": 1, "p": {"a": 0, "k": [0, 0]}, "pt": {"a": 0, "k": 5},
                     "or": {"a": 1, "k": [{"t": 0, "s": [20]}, {"t": 60, "s": [40]}, {"t": 120, "s": [20]}]},
                     "ir": {"a": 0, "k": 10}, "r": {"a": 0, "k": 0}},
                    {"ty": "st", "c": {"a": 0, "k": [0, 0, 0, 1]}, "o": {"a": 0, "k": 100}, "w": {"a": 0, "k": 2}},
                    {"ty": "rp", "c": {"a": 0, "k": 6}, "o": {"a": 0, "k": 0},
                     "tr": {"r": {"a": 0, "k": 60}, "so": {"a": 0, "k": 100}, "eo": {"a": 0, "k": 30}}},
                    {"ty": "tr", "p": {"a": 0, "k": [i * 10, 0]}}
                ]}]
            })
        })
        .collect();
    json!({"fr": 60, "ip": 0, "op": 120, "w": 512, "h": 512, "layers": layers}).to_string()
}

fn bench_group_tick(c: &mut Criterion) {
    let mut group = c.benchmark_group("group_tick");
    for layers in [1usize, 10, 50] {
        let text = busy_document(layers);
        let options = PlayOptions {
            infinite: true,
            ..Default::default()
        };
        let mut animation = AnimationGroup::from_json(&text, options).expect("bench document");
        group.bench_function(BenchmarkId::new("tick", layers), |b| {
            b.iter(|| black_box(animation.tick(black_box(FRAME))));
        });
        group.bench_function(BenchmarkId::new("tick_and_render", layers), |b| {
            b.iter(|| {
                animation.tick(FRAME);
                black_box(animation.render_tree())
            });
        });
    }
    group.finish();
}

criterion_group!(benches, bench_keyframe_evaluation, bench_group_tick);
criterion_main!(benches);

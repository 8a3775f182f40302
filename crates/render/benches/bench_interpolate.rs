use std::hint::black_box;
use std::time::Instant;

use boxfall_common::{BodyId, Pose};
use boxfall_kernel::WorldFrame;
use boxfall_render::{FrameBuffer, interpolate};
use glam::{Quat, Vec3};

fn make_frame(time: f64, body_count: u32, offset: f32) -> WorldFrame {
    let bodies = (0..body_count)
        .map(|i| {
            let pose = Pose::new(
                Vec3::new(i as f32, offset, -(i as f32)),
                Quat::from_rotation_y(offset + i as f32 * 0.01),
            );
            (BodyId::from_parts(i, 0), pose)
        })
        .collect();
    WorldFrame { time, bodies }
}

fn bench_interpolate(body_count: u32, iterations: usize) {
    let prev = make_frame(0.0, body_count, 0.0);
    let curr = make_frame(1.0 / 60.0, body_count, 0.1);

    let start = Instant::now();
    for i in 0..iterations {
        let t = (i % 16) as f64 / 16.0 / 60.0;
        black_box(interpolate(black_box(&prev), black_box(&curr), t));
    }
    let elapsed = start.elapsed();
    let per_iter = elapsed / iterations as u32;
    println!(
        "  interpolate ({body_count} bodies, {iterations} iters): {per_iter:?}/iter, total {elapsed:?}"
    );
}

fn bench_push_resolve(body_count: u32, iterations: usize) {
    let mut buffer = FrameBuffer::new();
    let start = Instant::now();
    for i in 0..iterations {
        let time = i as f64 / 60.0;
        buffer.push(make_frame(time, body_count, i as f32 * 0.01));
        black_box(buffer.resolve(time - 1.0 / 120.0));
    }
    let elapsed = start.elapsed();
    let per_iter = elapsed / iterations as u32;
    println!(
        "  push+resolve ({body_count} bodies, {iterations} iters): {per_iter:?}/iter, total {elapsed:?}"
    );
}

fn main() {
    println!("=== boxfall-render benchmarks ===");
    for count in [3, 100, 1_000, 10_000] {
        bench_interpolate(count, 1_000);
    }
    for count in [3, 1_000] {
        bench_push_resolve(count, 500);
    }
}

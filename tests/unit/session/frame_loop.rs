use super::*;
use crate::foundation::core::{Rgba8, Size};
use crate::session::source::{LatestFrameSlot, SequenceSource};

const CONTAINER: Size = Size::new(1000.0, 1000.0);

fn backdrop(color: Rgb8, subject: Rgba8) -> Frame {
    let mut f = Frame::solid(6, 6, color.with_alpha(255)).unwrap();
    f.set_pixel(2, 2, subject);
    f.set_pixel(3, 2, subject);
    f
}

struct Stalled;

impl FrameSource for Stalled {
    fn latest_frame(&mut self) -> Option<Frame> {
        None
    }
}

#[test]
fn idle_loop_processes_nothing() {
    let mut l = FrameLoop::new(CompositorState::default());
    let mut src = SequenceSource::new([backdrop(Rgb8::new(0, 255, 0), Rgba8::new(255, 0, 0, 255))]);
    assert_eq!(l.tick(&mut src, &CONTAINER).unwrap(), TickOutcome::Idle);
    assert_eq!(src.remaining(), 1);
}

#[test]
fn first_tick_samples_then_runs() {
    let mut l = FrameLoop::new(CompositorState::default());
    l.start();
    assert_eq!(l.loop_state(), LoopState::Sampling);

    let green = Rgb8::new(0, 255, 0);
    let mut src = SequenceSource::new([backdrop(green, Rgba8::new(255, 0, 0, 255))]);
    let out = l.tick(&mut src, &CONTAINER).unwrap();

    assert_eq!(l.loop_state(), LoopState::Running);
    assert_eq!(l.session(), SessionState::Sampled(green));
    let TickOutcome::Presented(p) = out else {
        panic!("expected a presented tick, got {out:?}");
    };
    assert_eq!(p.stats.keyed_pixels, 34);
    assert_eq!((p.geometry.width, p.geometry.height), (6, 6));
    assert_eq!(l.surface().frame().pixel(0, 0).map(|p| p.a), Some(0));
    assert_eq!(l.surface().frame().pixel(2, 2).map(|p| p.a), Some(255));
}

#[test]
fn background_is_not_resampled_mid_session() {
    let mut l = FrameLoop::new(CompositorState::default());
    l.start();
    let green = Rgb8::new(0, 255, 0);
    let blue = Rgb8::new(0, 0, 255);
    let mut src = SequenceSource::new([
        backdrop(green, Rgba8::new(255, 0, 0, 255)),
        backdrop(blue, Rgba8::new(255, 0, 0, 255)),
    ]);
    l.tick(&mut src, &CONTAINER).unwrap();
    let out = l.tick(&mut src, &CONTAINER).unwrap();
    assert_eq!(l.background(), Some(green));
    let TickOutcome::Presented(p) = out else {
        panic!("expected a presented tick");
    };
    assert_eq!(p.stats.keyed_pixels, 0);
}

#[test]
fn stalled_source_skips_and_keeps_surface() {
    let mut l = FrameLoop::new(CompositorState::default());
    l.start();
    assert_eq!(l.tick(&mut Stalled, &CONTAINER).unwrap(), TickOutcome::Skipped);
    assert_eq!(l.loop_state(), LoopState::Sampling);
    assert_eq!(l.surface().presented_count(), 0);
}

#[test]
fn ended_source_returns_loop_to_idle() {
    let mut l = FrameLoop::new(CompositorState::default());
    l.start();
    let mut src = SequenceSource::new(Vec::new());
    assert_eq!(l.tick(&mut src, &CONTAINER).unwrap(), TickOutcome::Idle);
    assert_eq!(l.loop_state(), LoopState::Idle);
    assert!(!l.resume());
}

#[test]
fn pause_and_resume_keep_background() {
    let mut l = FrameLoop::new(CompositorState::default());
    l.start();
    let green = Rgb8::new(0, 255, 0);
    let mut src = LatestFrameSlot::new();
    src.publisher()
        .publish(backdrop(green, Rgba8::new(255, 0, 0, 255)));
    l.tick(&mut src, &CONTAINER).unwrap();

    l.pause();
    assert_eq!(l.loop_state(), LoopState::Idle);
    assert!(l.resume());
    assert_eq!(l.loop_state(), LoopState::Running);
    assert_eq!(l.background(), Some(green));
}

#[test]
fn restart_samples_the_new_stream() {
    let mut l = FrameLoop::new(CompositorState::default());
    l.start();
    let green = Rgb8::new(0, 255, 0);
    let blue = Rgb8::new(0, 0, 255);
    let mut first = SequenceSource::new([backdrop(green, Rgba8::new(255, 0, 0, 255))]);
    l.tick(&mut first, &CONTAINER).unwrap();

    l.restart();
    assert_eq!(l.loop_state(), LoopState::Sampling);
    assert_eq!(l.background(), None);

    let mut second = SequenceSource::new([backdrop(blue, Rgba8::new(255, 0, 0, 255))]);
    l.tick(&mut second, &CONTAINER).unwrap();
    assert_eq!(l.background(), Some(blue));
}

#[test]
fn background_override_skips_sampling() {
    let mut state = CompositorState::default();
    let red = Rgb8::new(255, 0, 0);
    state.set_background_override(Some(red));
    let mut l = FrameLoop::new(state);
    l.start();
    assert_eq!(l.loop_state(), LoopState::Running);

    let mut src = SequenceSource::new([backdrop(Rgb8::new(0, 255, 0), red.with_alpha(255))]);
    let TickOutcome::Presented(p) = l.tick(&mut src, &CONTAINER).unwrap() else {
        panic!("expected a presented tick");
    };
    assert_eq!(p.stats.keyed_pixels, 2);
}

#[test]
fn stop_handle_lets_in_flight_tick_present() {
    let mut l = FrameLoop::new(CompositorState::default());
    l.start();
    let handle = l.stop_handle();
    let frames = (0..5).map(|_| backdrop(Rgb8::new(0, 255, 0), Rgba8::new(9, 9, 9, 255)));
    let mut src = SequenceSource::new(frames);

    let mut presented = 0;
    let stats = l
        .run(&mut src, &CONTAINER, &mut || true, |_, _| {
            presented += 1;
            handle.request_stop();
        })
        .unwrap();

    assert_eq!(presented, 1);
    assert_eq!(stats.presented, 1);
    assert_eq!(l.loop_state(), LoopState::Idle);
    assert_eq!(src.remaining(), 4);
}

#[test]
fn run_drains_a_sequence_and_goes_idle() {
    let mut l = FrameLoop::with_threading(
        CompositorState::default(),
        &PipelineThreading {
            parallel: true,
            threads: Some(2),
        },
    )
    .unwrap();
    l.start();
    let frames = (0..3).map(|_| backdrop(Rgb8::new(0, 255, 0), Rgba8::new(9, 9, 9, 255)));
    let mut src = SequenceSource::new(frames);
    let stats = l.run(&mut src, &CONTAINER, &mut || true, |_, _| {}).unwrap();
    assert_eq!(stats.presented, 3);
    assert_eq!(l.loop_state(), LoopState::Idle);
}

#[test]
fn zero_threads_is_rejected() {
    let err = FrameLoop::with_threading(
        CompositorState::default(),
        &PipelineThreading {
            parallel: true,
            threads: Some(0),
        },
    );
    assert!(matches!(err, Err(ChromaError::Validation(_))));
}

#[test]
fn sequential_threading_builds_no_pool() {
    let threading = PipelineThreading {
        parallel: false,
        threads: Some(4),
    };
    assert!(threading.worker_pool().unwrap().is_none());

    let parallel = PipelineThreading {
        parallel: true,
        threads: Some(2),
    };
    let pool = parallel.worker_pool().unwrap().unwrap();
    assert_eq!(pool.current_num_threads(), 2);
}

#[test]
fn geometry_setters_apply_on_next_tick() {
    let mut l = FrameLoop::new(CompositorState::default());
    l.start();
    l.state_mut().set_target_size(12, 3);
    l.state_mut().set_offset(2.0, 1.0).unwrap();
    let mut src = SequenceSource::new([backdrop(Rgb8::new(0, 255, 0), Rgba8::new(9, 9, 9, 255))]);
    let TickOutcome::Presented(p) = l.tick(&mut src, &Size::new(10.0, 100.0)).unwrap() else {
        panic!("expected a presented tick");
    };
    assert!(p.geometry.clamped);
    assert_eq!((p.geometry.width, p.geometry.height), (9, 2));
    assert_eq!(l.state().geometry().canvas_width, 12);
}

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use crate::{
    effects::smooth::{SmoothStats, smooth_edges},
    foundation::core::{Frame, Rgb8},
    foundation::error::{ChromaError, ChromaResult},
    keying::engine::{KeyStats, key_frame},
    keying::sampler::sample_background,
    layout::geometry::{ResolvedGeometry, resolve_geometry},
    render::surface::PresentationSurface,
    session::source::{ContainerBounds, FrameSource},
    session::state::CompositorState,
};

/// Whether the loop is scheduling ticks, and whether it still needs a background sample.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum LoopState {
    /// No ticks are processed.
    Idle,
    /// The next delivered frame will be sampled for the background color.
    Sampling,
    /// Frames are keyed, smoothed and presented.
    Running,
}

/// Per-stream-session data. The background is written once per session.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum SessionState {
    /// No background yet.
    Uninitialized,
    /// Background fixed for the rest of the session.
    Sampled(Rgb8),
}

/// Threading controls for the per-pixel stages.
#[derive(Clone, Debug, Default, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct PipelineThreading {
    /// Fan keying and smoothing out by row on a dedicated rayon pool.
    pub parallel: bool,
    /// Optional explicit worker thread count.
    pub threads: Option<usize>,
}

/// Counters for one presented tick.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct TickStats {
    /// Pixels keyed to alpha 0.
    pub keyed_pixels: u64,
    /// Pixels whose alpha the smoother reduced.
    pub softened_pixels: u64,
}

/// What a presented tick produced, for UI synchronization.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct PresentedFrame {
    /// Effective canvas size and offset after container constraints.
    pub geometry: ResolvedGeometry,
    /// Keying and smoothing counters.
    pub stats: TickStats,
}

/// Result of a single [`FrameLoop::tick`].
#[derive(Clone, Copy, Debug, PartialEq)]
pub enum TickOutcome {
    /// The loop is idle; nothing was processed.
    Idle,
    /// No frame was available; the surface was left as is.
    Skipped,
    /// A frame was composited and presented.
    Presented(PresentedFrame),
}

/// Aggregated counters for [`FrameLoop::run`].
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct RunStats {
    /// Refreshes that ran a tick.
    pub ticks: u64,
    /// Ticks that presented a frame.
    pub presented: u64,
    /// Ticks with no frame available.
    pub skipped: u64,
}

/// Cloneable stop request, honoured between ticks.
#[derive(Clone, Debug, Default)]
pub struct StopHandle(Arc<AtomicBool>);

impl StopHandle {
    /// Ask the loop to stop after the tick in flight.
    pub fn request_stop(&self) {
        self.0.store(true, Ordering::SeqCst);
    }

    /// Whether a stop is pending.
    pub fn is_stop_requested(&self) -> bool {
        self.0.load(Ordering::SeqCst)
    }

    fn reset(&self) {
        self.0.store(false, Ordering::SeqCst);
    }
}

/// The display-refresh callback the loop waits on between ticks.
pub trait RefreshSignal {
    /// Block until the next refresh. Returning `false` ends [`FrameLoop::run`].
    fn wait_for_refresh(&mut self) -> bool;
}

impl<F: FnMut() -> bool> RefreshSignal for F {
    fn wait_for_refresh(&mut self) -> bool {
        self()
    }
}

/// Drives sampling, keying, smoothing and placement once per display refresh.
///
/// `Idle -> Sampling` on [`start`](Self::start), `Sampling -> Running` after the first frame has
/// been sampled, back to `Idle` on pause, stop, or when the source ends. Pausing keeps the sampled
/// background; only a new session (`start`/`restart`) samples again.
pub struct FrameLoop {
    state: CompositorState,
    loop_state: LoopState,
    session: SessionState,
    session_open: bool,
    surface: PresentationSurface,
    pool: Option<rayon::ThreadPool>,
    stop: StopHandle,
}

impl FrameLoop {
    /// Sequential loop.
    pub fn new(state: CompositorState) -> Self {
        let surface = PresentationSurface::new(state.surface_settings());
        Self {
            state,
            loop_state: LoopState::Idle,
            session: SessionState::Uninitialized,
            session_open: false,
            surface,
            pool: None,
            stop: StopHandle::default(),
        }
    }

    /// Loop whose pixel stages run on a dedicated pool when `threading.parallel` is set.
    pub fn with_threading(
        state: CompositorState,
        threading: &PipelineThreading,
    ) -> ChromaResult<Self> {
        let mut this = Self::new(state);
        this.pool = threading.worker_pool()?;
        Ok(this)
    }

    /// Where the loop is in its lifecycle.
    pub fn loop_state(&self) -> LoopState {
        self.loop_state
    }

    /// Per-session sampling state.
    pub fn session(&self) -> SessionState {
        self.session
    }

    /// Background color of the current session, once sampled.
    pub fn background(&self) -> Option<Rgb8> {
        match self.session {
            SessionState::Sampled(c) => Some(c),
            SessionState::Uninitialized => None,
        }
    }

    /// Current configuration.
    pub fn state(&self) -> &CompositorState {
        &self.state
    }

    /// Configuration setters. Changes apply from the next tick.
    pub fn state_mut(&mut self) -> &mut CompositorState {
        &mut self.state
    }

    /// The surface as of the last presented tick.
    pub fn surface(&self) -> &PresentationSurface {
        &self.surface
    }

    /// A handle other threads can use to stop [`run`](Self::run).
    pub fn stop_handle(&self) -> StopHandle {
        self.stop.clone()
    }

    /// Begin a new stream session: forget the previous background and sample again.
    ///
    /// With a background override configured, the session starts already sampled.
    pub fn start(&mut self) {
        self.stop.reset();
        self.session_open = true;
        match self.state.background_override() {
            Some(bg) => {
                self.session = SessionState::Sampled(bg);
                self.transition(LoopState::Running);
            }
            None => {
                self.session = SessionState::Uninitialized;
                self.transition(LoopState::Sampling);
            }
        }
    }

    /// Stop scheduling ticks, keeping the session so [`resume`](Self::resume) continues with the
    /// same background.
    pub fn pause(&mut self) {
        self.transition(LoopState::Idle);
    }

    /// Resume a paused session. Returns `false` when there is no open session to resume.
    pub fn resume(&mut self) -> bool {
        if !self.session_open {
            return false;
        }
        self.stop.reset();
        let next = match self.session {
            SessionState::Sampled(_) => LoopState::Running,
            SessionState::Uninitialized => LoopState::Sampling,
        };
        self.transition(next);
        true
    }

    /// End the session. The next [`start`](Self::start) samples from scratch.
    pub fn stop(&mut self) {
        self.session_open = false;
        self.transition(LoopState::Idle);
    }

    /// Replace the stream: end the current session and start a new one.
    pub fn restart(&mut self) {
        self.stop();
        self.start();
    }

    /// Process the most recent frame from `source` and present it.
    ///
    /// A stalled source skips the tick without touching the surface. A source that has ended
    /// stops the loop.
    #[tracing::instrument(skip_all, fields(state = ?self.loop_state))]
    pub fn tick(
        &mut self,
        source: &mut dyn FrameSource,
        container: &dyn ContainerBounds,
    ) -> ChromaResult<TickOutcome> {
        if self.stop.is_stop_requested() && self.loop_state != LoopState::Idle {
            self.stop();
        }
        if self.loop_state == LoopState::Idle {
            return Ok(TickOutcome::Idle);
        }
        if !source.is_active() {
            tracing::info!("frame source ended");
            self.stop();
            return Ok(TickOutcome::Idle);
        }

        let Some(frame) = source.latest_frame().filter(|f| !f.is_empty()) else {
            tracing::trace!("no frame available; tick skipped");
            return Ok(TickOutcome::Skipped);
        };

        if self.loop_state == LoopState::Sampling {
            let Some(bg) = sample_background(&frame) else {
                return Ok(TickOutcome::Skipped);
            };
            self.session = SessionState::Sampled(bg);
            self.transition(LoopState::Running);
        }
        let SessionState::Sampled(background) = self.session else {
            return Err(ChromaError::evaluation(
                "frame loop is running without a sampled background",
            ));
        };

        let native = frame.size();
        let (composited, key, smooth) = self.composite(frame, background);

        let geometry = resolve_geometry(
            self.state.geometry(),
            native,
            container.bounding_box(),
            self.state.max_container_fraction(),
        );
        self.surface.set_settings(self.state.surface_settings());
        self.surface.present(&composited, &geometry)?;

        let stats = TickStats {
            keyed_pixels: key.keyed_pixels,
            softened_pixels: smooth.softened_pixels,
        };
        tracing::debug!(
            keyed = stats.keyed_pixels,
            softened = stats.softened_pixels,
            width = geometry.width,
            height = geometry.height,
            "frame presented"
        );
        Ok(TickOutcome::Presented(PresentedFrame { geometry, stats }))
    }

    /// Tick once per refresh until the loop goes idle or `refresh` gives up.
    ///
    /// `on_present` sees the surface after every presented tick. A stop requested through a
    /// [`StopHandle`] lets the in-flight tick finish and present before the loop halts.
    pub fn run(
        &mut self,
        source: &mut dyn FrameSource,
        container: &dyn ContainerBounds,
        refresh: &mut dyn RefreshSignal,
        mut on_present: impl FnMut(&PresentationSurface, &PresentedFrame),
    ) -> ChromaResult<RunStats> {
        let mut stats = RunStats::default();
        while self.loop_state != LoopState::Idle && !self.stop.is_stop_requested() {
            if !refresh.wait_for_refresh() {
                break;
            }
            stats.ticks += 1;
            match self.tick(source, container)? {
                TickOutcome::Presented(p) => {
                    stats.presented += 1;
                    on_present(&self.surface, &p);
                }
                TickOutcome::Skipped => stats.skipped += 1,
                TickOutcome::Idle => break,
            }
        }
        if self.stop.is_stop_requested() {
            self.stop();
        }
        Ok(stats)
    }

    fn composite(&self, mut frame: Frame, background: Rgb8) -> (Frame, KeyStats, SmoothStats) {
        let tolerance = self.state.tolerance();
        let strength = self.state.smoothing();
        let parallel = self.pool.is_some();

        let stages = move || {
            let key = key_frame(&mut frame, background, tolerance, parallel);
            if strength > 0.0 {
                let (smoothed, smooth) = smooth_edges(&frame, strength, parallel);
                (smoothed, key, smooth)
            } else {
                (frame, key, SmoothStats::default())
            }
        };

        match &self.pool {
            Some(pool) => pool.install(stages),
            None => stages(),
        }
    }

    fn transition(&mut self, next: LoopState) {
        if self.loop_state != next {
            tracing::info!(from = ?self.loop_state, to = ?next, "frame loop state change");
            self.loop_state = next;
        }
    }
}

impl PipelineThreading {
    /// The pool the pixel stages run on, or `None` for sequential execution.
    fn worker_pool(&self) -> ChromaResult<Option<rayon::ThreadPool>> {
        if !self.parallel {
            return Ok(None);
        }
        let mut builder =
            rayon::ThreadPoolBuilder::new().thread_name(|i| format!("chromakey-px-{i}"));
        match self.threads {
            Some(0) => {
                return Err(ChromaError::validation(
                    "parallel keying needs at least one worker thread",
                ));
            }
            Some(n) => builder = builder.num_threads(n),
            None => {}
        }
        let pool = builder.build().map_err(|e| {
            ChromaError::evaluation(format!("could not start keying worker pool: {e}"))
        })?;
        tracing::debug!(threads = pool.current_num_threads(), "keying worker pool ready");
        Ok(Some(pool))
    }
}

#[cfg(test)]
#[path = "../../tests/unit/session/frame_loop.rs"]
mod tests;

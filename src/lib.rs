//! Real-time chroma-key compositing.
//!
//! A [`FrameLoop`] turns raw video frames into a transparent, positioned overlay once per display
//! refresh:
//!
//! 1. **Sample** (first frame of a session only): the most frequent RGB triple becomes the
//!    background color ([`sample_background`]).
//! 2. **Key**: pixels whose HSV lies within `tolerance` of the background get alpha 0
//!    ([`key_frame`]).
//! 3. **Smooth** (optional): alpha is softened along keyed edges from an immutable snapshot
//!    ([`smooth_edges`]).
//! 4. **Place**: the canvas size is resolved against the container box ([`resolve_geometry`]) and
//!    the result is drawn at the configured offset onto a cleared [`PresentationSurface`].
//!
//! UI controls mutate a [`CompositorState`] through its setters between ticks; a tick never writes
//! it back. The adjusted geometry of every presented tick is reported in [`PresentedFrame`].
//!
//! - **No unsafe**: `unsafe` is forbidden in this crate.
//! - **Straight RGBA8** end-to-end: frames are not premultiplied.
//! - **Deterministic**: parallel and sequential execution produce identical pixels.
#![forbid(unsafe_code)]
#![deny(missing_docs)]

mod color;
mod effects;
mod foundation;
mod keying;
mod layout;
mod render;
mod session;

/// JSON configuration model.
pub mod config;

pub use color::hsv::{Hsv, hsv_to_rgb, rgb_to_hsv};
pub use config::{CompositorConfig, GeometryConfig, KeyingConfig, SurfaceConfig};
pub use effects::composite::{over, over_in_place};
pub use effects::smooth::{NeighborCounts, SmoothStats, neighbor_counts, smooth_edges};
pub use foundation::core::{Frame, Rgb8, Rgba8, Size, Vec2};
pub use foundation::error::{ChromaError, ChromaResult};
pub use keying::engine::{KeyStats, ToleranceWindow, key_frame};
pub use keying::sampler::sample_background;
pub use layout::geometry::{
    DEFAULT_MAX_CONTAINER_FRACTION, GeometryState, ResolvedGeometry, resolve_geometry,
};
pub use render::surface::{PresentationSurface, ScaleFilter, SurfaceSettings};
pub use session::frame_loop::{
    FrameLoop, LoopState, PipelineThreading, PresentedFrame, RefreshSignal, RunStats,
    SessionState, StopHandle, TickOutcome, TickStats,
};
pub use session::source::{
    ContainerBounds, FramePublisher, FrameSource, LatestFrameSlot, SequenceSource,
};
pub use session::state::{CompositorState, DEFAULT_TOLERANCE};

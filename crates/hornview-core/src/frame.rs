//! Per-frame snapshots and redraw requests.

use std::sync::mpsc::{self, Receiver, Sender};

use glam::{Mat4, Vec3};

use crate::options::{MaterialParams, OrthoParams, RenderMode, SceneParams, StereoParams};

/// Everything one frame needs, captured at the moment the frame is requested.
///
/// The renderer only ever reads a snapshot; mutation happens on
/// [`ViewerState`](crate::state::ViewerState) between frames.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FrameParams {
    pub mode: RenderMode,
    pub stereo: StereoParams,
    pub ortho: OrthoParams,
    pub material: MaterialParams,
    pub scene: SceneParams,
    pub background_color: Vec3,
    /// View matrix reported by the orbit controller.
    pub orbit_view: Mat4,
    /// Device-orientation overlay, identity when `None`.
    pub sensor_rotation: Option<Mat4>,
}

/// Why a redraw was requested.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RedrawReason {
    /// First frame after setup.
    InitialLoad,
    /// A parameter setter ran.
    ParameterChanged,
    /// The orbit controller moved.
    OrbitMoved,
    /// A new device-orientation reading arrived.
    SensorReading,
    /// A texture finished decoding.
    TextureLoaded,
    /// The output surface changed size.
    Resized,
}

/// Producer half of the redraw queue.
#[derive(Debug, Clone)]
pub struct RedrawSender {
    tx: Sender<RedrawReason>,
}

impl RedrawSender {
    /// Queues a redraw. Requests are never merged.
    pub fn request(&self, reason: RedrawReason) {
        // The receiver only disappears when the loop has exited.
        if self.tx.send(reason).is_err() {
            log::trace!("redraw request {reason:?} dropped after shutdown");
        }
    }
}

/// Consumer half of the redraw queue, polled by the render loop.
#[derive(Debug)]
pub struct RedrawQueue {
    rx: Receiver<RedrawReason>,
}

impl RedrawQueue {
    /// Creates a connected sender/queue pair.
    #[must_use]
    pub fn new() -> (RedrawSender, RedrawQueue) {
        let (tx, rx) = mpsc::channel();
        (RedrawSender { tx }, RedrawQueue { rx })
    }

    /// Takes every pending request in arrival order.
    pub fn drain(&self) -> Vec<RedrawReason> {
        self.rx.try_iter().collect()
    }
}

/// Rotation for a device-orientation reading in degrees.
///
/// `alpha` turns about Z, then `beta` about the new X, then `gamma` about
/// the new Y.
#[must_use]
pub fn sensor_rotation_from_euler(alpha: f32, beta: f32, gamma: f32) -> Mat4 {
    Mat4::from_rotation_z(alpha.to_radians())
        * Mat4::from_rotation_x(beta.to_radians())
        * Mat4::from_rotation_y(gamma.to_radians())
}

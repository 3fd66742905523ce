//! Volume bounding and mute bookkeeping shared by both controllers.
//!
//! Stores expose a single observed `volume` that is `0` while muted. The
//! level to return to on unmute lives in [`VolumeControls`], so muting and
//! unmuting always round-trips to the exact pre-mute level.

use serde::{Deserialize, Serialize};

/// Volume used when no initial volume is given.
pub const DEFAULT_VOLUME_LEVEL: f64 = 1.0;

/// Clamp a volume into `[0, 1]`. `NaN` counts as silence.
pub fn bounded_volume(volume: f64) -> f64 {
    if volume.is_nan() {
        0.0
    } else {
        volume.clamp(0.0, 1.0)
    }
}

/// Internal volume state.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct VolumeControls {
    /// Level restored on unmute. Never changed by muting.
    pub volume: f64,
    pub muted: bool,
}

impl VolumeControls {
    pub fn new(initial: f64) -> Self {
        let volume = bounded_volume(initial);
        Self {
            volume,
            muted: volume == 0.0,
        }
    }

    /// A deliberate volume change by the user.
    ///
    /// Returns the new observed volume. Muted iff the clamped level is zero;
    /// a non-zero level also becomes the level restored on unmute.
    pub fn request(self, requested: f64) -> (f64, Self) {
        let volume = bounded_volume(requested);
        let remembered = if volume > 0.0 { volume } else { self.volume };
        (
            volume,
            Self {
                volume: remembered,
                muted: volume == 0.0,
            },
        )
    }

    /// Programmatic volume change that does not infer mute state.
    pub fn set(self, requested: f64) -> (f64, Self) {
        let volume = bounded_volume(requested);
        (
            volume,
            Self {
                volume,
                muted: self.muted,
            },
        )
    }

    /// Flip between silent and the remembered level.
    ///
    /// `None` when there is nothing to restore (muted with a remembered level
    /// of zero).
    pub fn toggle_mute(self, observed: f64) -> Option<(f64, Self)> {
        if observed != 0.0 {
            return Some((
                0.0,
                Self {
                    volume: self.volume,
                    muted: true,
                },
            ));
        }

        if self.volume > 0.0 {
            Some((
                self.volume,
                Self {
                    volume: self.volume,
                    muted: false,
                },
            ))
        } else {
            None
        }
    }

    /// Apply a persisted volume on store creation.
    ///
    /// A persisted zero mutes but keeps the remembered level, so the first
    /// unmute still has something to restore.
    pub fn rehydrate(self, persisted: f64) -> (f64, Self) {
        let volume = bounded_volume(persisted);
        if volume == 0.0 {
            (
                0.0,
                Self {
                    volume: self.volume,
                    muted: true,
                },
            )
        } else {
            (volume, Self { volume, muted: false })
        }
    }
}

impl Default for VolumeControls {
    fn default() -> Self {
        Self::new(DEFAULT_VOLUME_LEVEL)
    }
}

/// Controller state that carries an observed volume plus [`VolumeControls`].
///
/// Implemented by both controller states so the volume transitions and the
/// persistence adapter are written once.
pub trait VolumeState: Sized {
    /// Observed volume, `0` while muted.
    fn volume(&self) -> f64;

    fn volume_controls(&self) -> VolumeControls;

    /// Copy of `self` with new volume values. Derived text must follow.
    fn with_volume(&self, volume: f64, controls: VolumeControls) -> Self;
}

pub(crate) fn request_volume<S: VolumeState>(state: &S, requested: f64) -> S {
    let (volume, controls) = state.volume_controls().request(requested);
    state.with_volume(volume, controls)
}

pub(crate) fn set_volume<S: VolumeState>(state: &S, requested: f64) -> S {
    let (volume, controls) = state.volume_controls().set(requested);
    state.with_volume(volume, controls)
}

pub(crate) fn toggle_mute<S: VolumeState>(state: &S) -> Option<S> {
    let (volume, controls) = state.volume_controls().toggle_mute(state.volume())?;
    Some(state.with_volume(volume, controls))
}

pub(crate) fn rehydrate<S: VolumeState>(state: &S, persisted: f64) -> S {
    let (volume, controls) = state.volume_controls().rehydrate(persisted);
    state.with_volume(volume, controls)
}

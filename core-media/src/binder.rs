//! # Effect Binder
//!
//! Couples a controller store to a live media element:
//!
//! - every store transition is diffed against the previous snapshot and the
//!   resulting [`ElementEffect`]s are applied to the element
//! - keyboard shortcuts on the element's key target call back into the
//!   controller
//!
//! Effects go through a per-binding [`SerialQueue`], so the element sees them
//! strictly in transition order even when an individual call (fullscreen,
//! `play()`) resolves asynchronously. A failing effect is logged and the
//! rest of the batch still runs.
//!
//! A binder holds at most one binding. Binding again while bound fails with
//! [`MediaError::AlreadyBound`]; after [`EffectBinder::destroy`] the binder
//! can be bound again.

use bridge_traits::platform::PlatformSendSync;
use bridge_traits::{KeyEventTarget, KeyListener, KeyboardEvent, ListenerHandle, MediaElement};
use parking_lot::Mutex;
use std::sync::Arc;
use tracing::{debug, info, warn};
use uuid::Uuid;

use crate::error::{MediaError, Result};
use crate::queue::SerialQueue;
use crate::store::{Store, Subscription};
use crate::volume::VolumeState;

/// Attribute set on the key target so it can receive keyboard focus.
pub const TABINDEX_ATTRIBUTE: &str = "tabindex";

/// One imperative change to the media element.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum ElementEffect {
    SetVolume(f64),
    SetMuted(bool),
    Play,
    Pause,
    /// Enter or leave fullscreen, decided from the element when applied
    ToggleFullscreen,
    /// Enter or leave picture-in-picture, decided from the element when applied
    TogglePictureInPicture,
}

impl ElementEffect {
    pub fn name(&self) -> &'static str {
        match self {
            ElementEffect::SetVolume(_) => "set_volume",
            ElementEffect::SetMuted(_) => "set_muted",
            ElementEffect::Play => "play",
            ElementEffect::Pause => "pause",
            ElementEffect::ToggleFullscreen => "toggle_fullscreen",
            ElementEffect::TogglePictureInPicture => "toggle_picture_in_picture",
        }
    }

    pub async fn apply(&self, element: &dyn MediaElement) -> bridge_traits::error::Result<()> {
        match *self {
            ElementEffect::SetVolume(volume) => element.set_volume(volume).await,
            ElementEffect::SetMuted(muted) => element.set_muted(muted).await,
            ElementEffect::Play => element.play().await,
            ElementEffect::Pause => element.pause().await,
            ElementEffect::ToggleFullscreen => {
                if element.is_fullscreen() {
                    element.exit_fullscreen().await
                } else {
                    element.request_fullscreen().await
                }
            }
            ElementEffect::TogglePictureInPicture => {
                if element.is_picture_in_picture() {
                    element.exit_picture_in_picture().await
                } else {
                    element.request_picture_in_picture().await
                }
            }
        }
    }
}

/// A controller the binder can drive.
pub trait BindableController: Clone + PlatformSendSync + 'static {
    type State: PlatformSendSync + 'static;

    /// Label used in logs and queue names, e.g. `"broadcast"`.
    const LABEL: &'static str;

    fn store(&self) -> &Store<Self::State>;

    /// Element mutations needed to go from `previous` to `current`, in the
    /// order they must be applied.
    fn effects(current: &Self::State, previous: &Self::State) -> Vec<ElementEffect>;

    /// Handle a key code. Returns `true` if the key is a shortcut.
    fn handle_hotkey(&self, code: &str) -> bool;

    /// Called after an effect was applied successfully, so the controller can
    /// record what the element actually did.
    fn effect_applied(&self, _effect: ElementEffect, _element: &dyn MediaElement) {}

    /// Called after an effect failed. The element is unchanged as far as
    /// the binder knows.
    fn effect_failed(&self, _effect: ElementEffect, _element: &dyn MediaElement) {}

    /// Called once the binding is in place.
    fn bound(&self) {}
}

/// Options for [`EffectBinder::bind`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BinderOptions {
    /// Attach keyboard shortcuts
    pub hotkeys: bool,
}

impl Default for BinderOptions {
    fn default() -> Self {
        Self { hotkeys: true }
    }
}

struct Binding {
    key_target: Option<Arc<dyn KeyEventTarget>>,
    listener: Option<ListenerHandle>,
    subscription: Subscription,
    queue: SerialQueue,
}

/// Binds one controller to one media element at a time.
pub struct EffectBinder {
    id: Uuid,
    binding: Mutex<Option<Binding>>,
}

impl Default for EffectBinder {
    fn default() -> Self {
        Self::new()
    }
}

impl EffectBinder {
    pub fn new() -> Self {
        Self {
            id: Uuid::new_v4(),
            binding: Mutex::new(None),
        }
    }

    pub fn id(&self) -> Uuid {
        self.id
    }

    pub fn is_bound(&self) -> bool {
        self.binding.lock().is_some()
    }

    /// Bind `controller` to `element`.
    ///
    /// Attaches hotkeys (when enabled), calls `load()` on the element and
    /// subscribes to every store transition. Failures to attach hotkeys or to
    /// load are logged; only a second bind and a missing async runtime are
    /// errors.
    pub fn bind<C>(
        &self,
        element: Arc<dyn MediaElement>,
        controller: C,
        options: BinderOptions,
    ) -> Result<()>
    where
        C: BindableController,
    {
        let mut slot = self.binding.lock();
        if slot.is_some() {
            return Err(MediaError::AlreadyBound);
        }

        let queue = SerialQueue::start(format!("{}-effects-{}", C::LABEL, self.id))?;

        let (key_target, listener) = if options.hotkeys {
            attach_hotkeys(&element, &controller)
        } else {
            (None, None)
        };

        if let Err(e) = element.load() {
            warn!(binder = %self.id, error = %e, "Media element load() failed");
        }

        let subscription = {
            let queue = queue.clone();
            let element = Arc::clone(&element);
            let reporter = controller.clone();
            controller.store().subscribe(Arc::new(move |current: &C::State, previous: &C::State| {
                let effects = C::effects(current, previous);
                if effects.is_empty() {
                    return;
                }

                let element = Arc::clone(&element);
                let reporter = reporter.clone();
                queue.enqueue(move || async move {
                    apply_effects(effects, element.as_ref(), &reporter).await;
                });
            }))
        };

        *slot = Some(Binding {
            key_target,
            listener,
            subscription,
            queue,
        });
        drop(slot);

        info!(binder = %self.id, controller = C::LABEL, hotkeys = options.hotkeys, "Bound media element");
        controller.bound();
        Ok(())
    }

    /// Wait for every effect queued so far to be applied.
    pub async fn flush(&self) {
        let queue = self.binding.lock().as_ref().map(|b| b.queue.clone());
        if let Some(queue) = queue {
            queue.flush().await;
        }
    }

    /// Detach hotkeys and stop reacting to the store.
    ///
    /// Effects already queued still run. Calling `destroy` on an unbound
    /// binder does nothing.
    pub fn destroy(&self) {
        let Some(binding) = self.binding.lock().take() else {
            debug!(binder = %self.id, "destroy() on unbound binder");
            return;
        };

        if let (Some(target), Some(handle)) = (&binding.key_target, binding.listener) {
            match target.remove_keyup_listener(handle) {
                Ok(true) => {}
                Ok(false) => debug!(binder = %self.id, %handle, "Hotkey listener was already removed"),
                Err(e) => warn!(binder = %self.id, error = %e, "Failed to remove hotkey listener"),
            }
        }

        binding.subscription.unsubscribe();
        binding.queue.close();

        info!(binder = %self.id, pending = binding.queue.pending(), "Destroyed binding");
    }
}

impl Drop for EffectBinder {
    fn drop(&mut self) {
        self.destroy();
    }
}

/// Bind `controller` to `element` with a fresh binder.
pub fn bind<C: BindableController>(
    element: Arc<dyn MediaElement>,
    controller: C,
    options: BinderOptions,
) -> Result<EffectBinder> {
    let binder = EffectBinder::new();
    binder.bind(element, controller, options)?;
    Ok(binder)
}

fn attach_hotkeys<C: BindableController>(
    element: &Arc<dyn MediaElement>,
    controller: &C,
) -> (Option<Arc<dyn KeyEventTarget>>, Option<ListenerHandle>) {
    let target = element.key_target();

    let handler = controller.clone();
    let listener: KeyListener = Arc::new(move |event: &KeyboardEvent| handler.handle_hotkey(&event.code));

    let handle = match target.add_keyup_listener(listener) {
        Ok(handle) => handle,
        Err(e) => {
            warn!(error = %e, "Failed to attach hotkey listener");
            return (None, None);
        }
    };

    if let Err(e) = target.set_attribute(TABINDEX_ATTRIBUTE, "0") {
        warn!(error = %e, "Failed to make key target focusable");
    }

    (Some(target), Some(handle))
}

/// Element volume and mute changes between two snapshots.
///
/// Unmuting without an observed volume change (the element was left at its
/// old level) re-applies the remembered level.
pub fn volume_effects<S: VolumeState>(current: &S, previous: &S) -> Vec<ElementEffect> {
    if current.volume() != previous.volume() {
        return vec![
            ElementEffect::SetVolume(current.volume()),
            ElementEffect::SetMuted(current.volume() == 0.0),
        ];
    }

    let controls = current.volume_controls();
    if !controls.muted && previous.volume_controls().muted {
        return vec![
            ElementEffect::SetVolume(controls.volume),
            ElementEffect::SetMuted(false),
        ];
    }

    Vec::new()
}

async fn apply_effects<C: BindableController>(
    effects: Vec<ElementEffect>,
    element: &dyn MediaElement,
    controller: &C,
) {
    for effect in effects {
        match effect.apply(element).await {
            Ok(()) => controller.effect_applied(effect, element),
            Err(e) => {
                warn!(effect = effect.name(), error = %e, "Media element effect failed");
                controller.effect_failed(effect, element);
            }
        }
    }
}

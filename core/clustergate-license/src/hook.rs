//! Notification of license changes.
//!
//! Components that cache entitlement decisions register a listener with the
//! engine at startup instead of the engine depending on them.

/// Receives a call after every successful activation write.
///
/// Called synchronously on the activating thread, so implementations must
/// return quickly and must not call back into activation.
pub trait LicenseListener: Send + Sync {
    /// The persisted license has been replaced.
    fn license_changed(&self);
}

/// Listener that ignores notifications.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoopListener;

impl LicenseListener for NoopListener {
    fn license_changed(&self) {}
}

impl<F> LicenseListener for F
where
    F: Fn() + Send + Sync,
{
    fn license_changed(&self) {
        self()
    }
}

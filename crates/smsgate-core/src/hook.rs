use crate::model::OutgoingRequest;
use crate::SmsError;

/// Per-gateway post-processing applied to a built request before dispatch.
///
/// Providers with bespoke auth schemes implement this instead of changing the
/// payload builder.
pub trait RequestHook: Send + Sync {
    /// Stable hook name used in logs, e.g. "twilio-basic-auth".
    fn name(&self) -> &'static str;

    fn apply(&self, request: &mut OutgoingRequest) -> Result<(), SmsError>;
}

//! External dispatch channels.

use crate::error::Result;
use crate::types::ContactHandle;
use std::sync::Arc;

/// Hands an order summary to a vendor out of band.
///
/// Success means the hand-off was invoked, not that the vendor received it.
pub trait DispatchChannel: Send + Sync {
    fn dispatch(&self, contact: &ContactHandle, payload: &str) -> Result<()>;
}

impl<C: DispatchChannel + ?Sized> DispatchChannel for Arc<C> {
    fn dispatch(&self, contact: &ContactHandle, payload: &str) -> Result<()> {
        (**self).dispatch(contact, payload)
    }
}

impl<C: DispatchChannel + ?Sized> DispatchChannel for &C {
    fn dispatch(&self, contact: &ContactHandle, payload: &str) -> Result<()> {
        (**self).dispatch(contact, payload)
    }
}

/// Opens a URL somewhere the user can act on it (a browser tab, an intent).
pub trait LinkOpener: Send + Sync {
    fn open(&self, url: &str) -> Result<()>;
}

impl<F> LinkOpener for F
where
    F: Fn(&str) -> Result<()> + Send + Sync,
{
    fn open(&self, url: &str) -> Result<()> {
        self(url)
    }
}

/// Default base for click-to-chat links.
pub const WHATSAPP_BASE_URL: &str = "https://wa.me";

/// Sends orders as WhatsApp click-to-chat links.
pub struct WhatsAppChannel<O> {
    opener: O,
    base_url: String,
}

impl<O: LinkOpener> WhatsAppChannel<O> {
    pub fn new(opener: O) -> Self {
        Self::with_base_url(opener, WHATSAPP_BASE_URL)
    }

    pub fn with_base_url(opener: O, base_url: impl Into<String>) -> Self {
        Self {
            opener,
            base_url: base_url.into(),
        }
    }

    /// The link that opens a chat with `contact` prefilled with `payload`.
    pub fn link(&self, contact: &ContactHandle, payload: &str) -> String {
        format!(
            "{}/{}?text={}",
            self.base_url.trim_end_matches('/'),
            contact.digits(),
            urlencoding::encode(payload)
        )
    }
}

impl<O: LinkOpener> DispatchChannel for WhatsAppChannel<O> {
    fn dispatch(&self, contact: &ContactHandle, payload: &str) -> Result<()> {
        let url = self.link(contact, payload);
        self.opener.open(&url)
    }
}

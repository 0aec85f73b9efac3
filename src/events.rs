//! Publish/subscribe channel for the two site-wide signals.
//!
//! Delivery is synchronous and follows registration order. The listener list
//! is snapshotted before delivery, so listeners may subscribe or emit without
//! deadlocking; new listeners take effect from the next emit.

use std::sync::{Arc, Mutex, PoisonError};

use tracing::debug;

use crate::i18n::{Language, TranslationDictionary};

#[derive(Debug, Clone, PartialEq)]
pub enum Signal {
    /// New main-content markup is attached. No payload.
    PageContentLoaded,
    /// A language was applied to the document.
    LanguageChanged {
        language: Language,
        dictionary: TranslationDictionary,
    },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SignalKind {
    PageContentLoaded,
    LanguageChanged,
}

impl Signal {
    pub fn kind(&self) -> SignalKind {
        match self {
            Signal::PageContentLoaded => SignalKind::PageContentLoaded,
            Signal::LanguageChanged { .. } => SignalKind::LanguageChanged,
        }
    }
}

impl SignalKind {
    /// Event name as the page markup knows it.
    pub fn name(self) -> &'static str {
        match self {
            SignalKind::PageContentLoaded => "pageContentLoaded",
            SignalKind::LanguageChanged => "languageChanged",
        }
    }
}

pub type Listener = Arc<dyn Fn(&Signal) + Send + Sync>;

struct Registration {
    kind: SignalKind,
    listener: Listener,
}

#[derive(Default)]
pub struct EventBus {
    registrations: Mutex<Vec<Registration>>,
}

impl EventBus {
    pub fn new() -> Self {
        Self::default()
    }

    /// Listeners live as long as the bus.
    pub fn subscribe(&self, kind: SignalKind, listener: impl Fn(&Signal) + Send + Sync + 'static) {
        self.lock().push(Registration {
            kind,
            listener: Arc::new(listener),
        });
    }

    /// Deliver `signal` to every current listener of its kind; returns how
    /// many were called.
    pub fn emit(&self, signal: &Signal) -> usize {
        let kind = signal.kind();
        let listeners: Vec<Listener> = self
            .lock()
            .iter()
            .filter(|r| r.kind == kind)
            .map(|r| Arc::clone(&r.listener))
            .collect();

        debug!("Dispatching {} to {} listeners", kind.name(), listeners.len());
        for listener in &listeners {
            listener(signal);
        }
        listeners.len()
    }

    pub fn listener_count(&self, kind: SignalKind) -> usize {
        self.lock().iter().filter(|r| r.kind == kind).count()
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, Vec<Registration>> {
        self.registrations.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

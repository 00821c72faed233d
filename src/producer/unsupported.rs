//! Producer that never admits subscribers

use crate::context::Context;
use crate::producer::error::SubscribeError;
use crate::producer::traits::SubscribeSupport;
use crate::subscriber::SubscriberSink;
use std::error::Error;
use std::marker::PhantomData;

/// Rejects every attempt with [`SubscribeError::Unsupported`]
pub struct UnsupportedProducer<V, E> {
    reason: String,
    _signals: PhantomData<fn() -> (V, E)>,
}

impl<V, E> UnsupportedProducer<V, E> {
    pub fn new(reason: impl Into<String>) -> Self {
        Self {
            reason: reason.into(),
            _signals: PhantomData,
        }
    }
}

impl<V, E> SubscribeSupport<V, E> for UnsupportedProducer<V, E>
where
    E: Error + Send + Sync + 'static,
{
    fn supports_subscription(&self) -> bool {
        false
    }

    fn unsupported_reason(&self) -> String {
        self.reason.clone()
    }

    fn attach(&self, subscriber: SubscriberSink<V, E>, _ctx: Context) {
        subscriber.reject(SubscribeError::Unsupported {
            message: self.reason.clone(),
        });
    }
}

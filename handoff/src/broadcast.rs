//! difusion a varios consumidores
//!
//! Un [`BlockingChannel`] reparte cada valor a un solo consumidor. Cuando
//! varios hilos necesitan ver todos los valores, cada uno se suscribe y recibe
//! su propia cola privada.

use crate::channels::{BlockingChannel, PopOrder, RecvError, RecvTimeoutError, TryRecvError};
use crate::sync::lock;
use std::sync::{Arc, Mutex, Weak};
use std::time::Duration;
use tracing::trace;

const HUB_LOCK: &str = "suscriptores";

#[derive(Debug)]
struct Hub<T> {
    subscribers: Vec<Weak<BlockingChannel<T>>>,
    closed: bool,
}

/// Publica cada valor en la cola de cada suscriptor vivo.
#[derive(Debug)]
pub struct Broadcast<T> {
    hub: Mutex<Hub<T>>,
}

impl<T: Clone> Default for Broadcast<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T: Clone> Broadcast<T> {
    pub fn new() -> Self {
        Self {
            hub: Mutex::new(Hub {
                subscribers: Vec::new(),
                closed: false,
            }),
        }
    }

    /// Registra un suscriptor nuevo.
    ///
    /// Solo ve lo publicado despues de este llamado. Si el hub ya esta
    /// cerrado la suscripcion nace cerrada.
    pub fn subscribe(&self) -> Subscription<T> {
        let channel = Arc::new(BlockingChannel::with_order(PopOrder::Fifo));
        let mut hub = lock(&self.hub, HUB_LOCK);
        if hub.closed {
            channel.close();
        } else {
            hub.subscribers.push(Arc::downgrade(&channel));
        }
        Subscription { channel }
    }

    /// Entrega una copia de `value` a cada suscriptor vivo y devuelve cuantos
    /// la recibieron.
    pub fn publish(&self, value: T) -> usize {
        // el envio ocurre fuera del lock del hub para no anidar locks
        let live: Vec<Arc<BlockingChannel<T>>> = {
            let mut hub = lock(&self.hub, HUB_LOCK);
            if hub.closed {
                return 0;
            }
            let before = hub.subscribers.len();
            hub.subscribers.retain(|w| w.strong_count() > 0);
            if hub.subscribers.len() != before {
                trace!(pruned = before - hub.subscribers.len(), "suscriptores descartados");
            }
            hub.subscribers.iter().filter_map(Weak::upgrade).collect()
        };

        let mut delivered = 0;
        for channel in &live {
            if channel.send(value.clone()).is_ok() {
                delivered += 1;
            }
        }
        delivered
    }

    /// Cierra el hub y todas las suscripciones vivas.
    pub fn close(&self) {
        let live: Vec<Arc<BlockingChannel<T>>> = {
            let mut hub = lock(&self.hub, HUB_LOCK);
            hub.closed = true;
            hub.subscribers.drain(..).filter_map(|w| w.upgrade()).collect()
        };
        for channel in live {
            channel.close();
        }
    }

    pub fn is_closed(&self) -> bool {
        lock(&self.hub, HUB_LOCK).closed
    }

    pub fn subscriber_count(&self) -> usize {
        lock(&self.hub, HUB_LOCK)
            .subscribers
            .iter()
            .filter(|w| w.strong_count() > 0)
            .count()
    }
}

/// Cola privada de un suscriptor. Al soltarla el hub la olvida.
#[derive(Debug)]
pub struct Subscription<T> {
    channel: Arc<BlockingChannel<T>>,
}

impl<T> Subscription<T> {
    pub fn receive(&self) -> Result<T, RecvError> {
        self.channel.receive()
    }

    pub fn try_receive(&self) -> Result<T, TryRecvError> {
        self.channel.try_receive()
    }

    pub fn receive_timeout(&self, timeout: Duration) -> Result<T, RecvTimeoutError> {
        self.channel.receive_timeout(timeout)
    }

    /// valores publicados que este suscriptor aun no leyo
    pub fn pending(&self) -> usize {
        self.channel.len()
    }

    pub fn is_closed(&self) -> bool {
        self.channel.is_closed()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::thread;

    #[test]
    fn test_every_subscriber_sees_every_value() {
        let hub = Broadcast::new();
        let a = hub.subscribe();
        let b = hub.subscribe();

        for i in 0..5 {
            assert_eq!(hub.publish(i), 2);
        }

        let got_a: Vec<i32> = (0..5).map(|_| a.receive().unwrap()).collect();
        let got_b: Vec<i32> = (0..5).map(|_| b.receive().unwrap()).collect();
        assert_eq!(got_a, vec![0, 1, 2, 3, 4]);
        assert_eq!(got_a, got_b);
    }

    #[test]
    fn test_late_subscriber_misses_earlier_values() {
        let hub = Broadcast::new();
        hub.publish("antes");
        let sub = hub.subscribe();
        hub.publish("despues");
        assert_eq!(sub.receive(), Ok("despues"));
        assert_eq!(sub.pending(), 0);
    }

    #[test]
    fn test_dropped_subscription_is_pruned() {
        let hub = Broadcast::new();
        let keep = hub.subscribe();
        let gone = hub.subscribe();
        assert_eq!(hub.subscriber_count(), 2);

        drop(gone);
        assert_eq!(hub.subscriber_count(), 1);
        assert_eq!(hub.publish(7u8), 1);
        assert_eq!(keep.receive(), Ok(7));
    }

    #[test]
    fn test_close_releases_blocked_subscribers() {
        let hub = Arc::new(Broadcast::<u32>::new());
        let waiters: Vec<_> = (0..3)
            .map(|_| {
                let sub = hub.subscribe();
                thread::spawn(move || sub.receive())
            })
            .collect();

        thread::sleep(Duration::from_millis(20));
        hub.close();

        for w in waiters {
            assert_eq!(w.join().unwrap(), Err(RecvError::Closed));
        }
        assert!(hub.is_closed());
        assert_eq!(hub.publish(1), 0);
        assert!(hub.subscribe().is_closed());
    }
}

//! canal bloqueante de entrega entre hilos
//!
//! Cada valor enviado lo recibe exactamente un consumidor y luego desaparece
//! de la cola. `send` nunca bloquea; `receive` suspende al hilo hasta que hay
//! un valor o el canal se cierra.

use crate::sync::{lock, wait, wait_timeout};
use std::collections::VecDeque;
use std::sync::{Condvar, Mutex};
use std::time::{Duration, Instant};
use thiserror::Error;
use tracing::trace;

const QUEUE_LOCK: &str = "cola del canal";

/// Orden en que `receive` saca los valores pendientes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum PopOrder {
    /// el mas antiguo primero
    #[default]
    Fifo,
    /// el mas reciente primero; un consumidor atrasado ve el ultimo cambio
    /// antes que los anteriores
    Lifo,
}

/// `send` sobre un canal cerrado; devuelve el valor al caller.
#[derive(Debug, Error, PartialEq, Eq)]
#[error("envio sobre un canal cerrado")]
pub struct SendError<T>(pub T);

#[derive(Debug, Clone, Copy, Error, PartialEq, Eq)]
pub enum RecvError {
    #[error("canal cerrado y vacio")]
    Closed,
}

#[derive(Debug, Clone, Copy, Error, PartialEq, Eq)]
pub enum TryRecvError {
    #[error("canal vacio")]
    Empty,
    #[error("canal cerrado y vacio")]
    Closed,
}

#[derive(Debug, Clone, Copy, Error, PartialEq, Eq)]
pub enum RecvTimeoutError {
    #[error("tiempo de espera agotado")]
    Timeout,
    #[error("canal cerrado y vacio")]
    Closed,
}

#[derive(Debug)]
struct Queue<T> {
    items: VecDeque<T>,
    closed: bool,
}

impl<T> Queue<T> {
    fn pop(&mut self, order: PopOrder) -> Option<T> {
        match order {
            PopOrder::Fifo => self.items.pop_front(),
            PopOrder::Lifo => self.items.pop_back(),
        }
    }
}

/// Cola sin limite de capacidad con `receive` bloqueante.
///
/// Toda mutacion ocurre bajo un unico lock interno. Los consumidores esperan
/// en una condvar y reevaluan la condicion al despertar.
#[derive(Debug)]
pub struct BlockingChannel<T> {
    queue: Mutex<Queue<T>>,
    ready: Condvar,
    order: PopOrder,
}

impl<T> Default for BlockingChannel<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T> BlockingChannel<T> {
    /// Canal FIFO vacio.
    pub fn new() -> Self {
        Self::with_order(PopOrder::Fifo)
    }

    pub fn with_order(order: PopOrder) -> Self {
        Self {
            queue: Mutex::new(Queue {
                items: VecDeque::new(),
                closed: false,
            }),
            ready: Condvar::new(),
            order,
        }
    }

    pub fn order(&self) -> PopOrder {
        self.order
    }

    /// Encola `value` al final y despierta a un consumidor.
    ///
    /// No bloquea mas alla del lock interno. Falla solo si el canal ya fue
    /// cerrado, y en ese caso devuelve el valor.
    pub fn send(&self, value: T) -> Result<(), SendError<T>> {
        {
            let mut queue = lock(&self.queue, QUEUE_LOCK);
            if queue.closed {
                trace!("envio descartado: canal cerrado");
                return Err(SendError(value));
            }
            queue.items.push_back(value);
        }
        self.ready.notify_one();
        Ok(())
    }

    /// Bloquea hasta que haya un valor y lo saca segun [`PopOrder`].
    ///
    /// Despues de `close` sigue entregando lo pendiente; devuelve
    /// `RecvError::Closed` solo cuando el canal esta cerrado y vacio.
    pub fn receive(&self) -> Result<T, RecvError> {
        let mut queue = lock(&self.queue, QUEUE_LOCK);
        loop {
            if let Some(value) = queue.pop(self.order) {
                return Ok(value);
            }
            if queue.closed {
                return Err(RecvError::Closed);
            }
            queue = wait(&self.ready, queue, QUEUE_LOCK);
        }
    }

    pub fn try_receive(&self) -> Result<T, TryRecvError> {
        let mut queue = lock(&self.queue, QUEUE_LOCK);
        match queue.pop(self.order) {
            Some(value) => Ok(value),
            None if queue.closed => Err(TryRecvError::Closed),
            None => Err(TryRecvError::Empty),
        }
    }

    /// Como [`receive`](Self::receive) pero se rinde al pasar `timeout`.
    ///
    /// Un plazo que no cabe en un `Instant` equivale a esperar sin limite.
    pub fn receive_timeout(&self, timeout: Duration) -> Result<T, RecvTimeoutError> {
        let Some(deadline) = Instant::now().checked_add(timeout) else {
            return self.receive().map_err(|RecvError::Closed| RecvTimeoutError::Closed);
        };
        let mut queue = lock(&self.queue, QUEUE_LOCK);
        loop {
            if let Some(value) = queue.pop(self.order) {
                return Ok(value);
            }
            if queue.closed {
                return Err(RecvTimeoutError::Closed);
            }
            let now = Instant::now();
            if now >= deadline {
                return Err(RecvTimeoutError::Timeout);
            }
            let (guard, _) = wait_timeout(&self.ready, queue, deadline - now, QUEUE_LOCK);
            queue = guard;
        }
    }

    /// Cierra el canal y despierta a todos los consumidores.
    ///
    /// Los valores pendientes se siguen entregando.
    pub fn close(&self) {
        {
            let mut queue = lock(&self.queue, QUEUE_LOCK);
            if queue.closed {
                return;
            }
            queue.closed = true;
        }
        self.ready.notify_all();
    }

    pub fn is_closed(&self) -> bool {
        lock(&self.queue, QUEUE_LOCK).closed
    }

    pub fn len(&self) -> usize {
        lock(&self.queue, QUEUE_LOCK).items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

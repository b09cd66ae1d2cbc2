//! senal de parada cooperativa

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

/// Bandera compartida que pide a un hilo de fondo que termine.
///
/// El hilo la consulta en sus puntos de corte; levantarla no interrumpe nada
/// por si sola.
#[derive(Debug, Clone, Default)]
pub struct StopToken {
    stopped: Arc<AtomicBool>,
}

impl StopToken {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn stop(&self) {
        self.stopped.store(true, Ordering::Release);
    }

    pub fn is_stopped(&self) -> bool {
        self.stopped.load(Ordering::Acquire)
    }
}

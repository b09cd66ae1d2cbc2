//! reloj inyectable para la espera entre fases
//!
//! El hilo del semaforo solo mide tiempo y duerme a traves de [`Clock`]. En
//! produccion es el reloj del sistema; en pruebas [`ManualClock`] avanza un
//! tiempo virtual y cuenta cuantas veces se durmio.

use handoff::sync::lock;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Mutex;
use std::thread;
use std::time::{Duration, Instant};

pub trait Clock: Send + Sync + 'static {
    fn now(&self) -> Instant;
    fn sleep(&self, duration: Duration);
}

#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> Instant {
        Instant::now()
    }

    fn sleep(&self, duration: Duration) {
        thread::sleep(duration);
    }
}

/// Reloj de tiempo virtual: `sleep` adelanta el reloj en vez de bloquear.
#[derive(Debug)]
pub struct ManualClock {
    origin: Instant,
    offset: Mutex<Duration>,
    sleeps: AtomicU64,
    reads: AtomicU64,
}

impl Default for ManualClock {
    fn default() -> Self {
        Self::new()
    }
}

impl ManualClock {
    pub fn new() -> Self {
        Self {
            origin: Instant::now(),
            offset: Mutex::new(Duration::ZERO),
            sleeps: AtomicU64::new(0),
            reads: AtomicU64::new(0),
        }
    }

    /// adelanta el reloj sin contar como sleep
    pub fn advance(&self, duration: Duration) {
        *lock(&self.offset, "reloj manual") += duration;
    }

    /// tiempo virtual transcurrido desde la creacion
    pub fn elapsed(&self) -> Duration {
        *lock(&self.offset, "reloj manual")
    }

    pub fn sleep_count(&self) -> u64 {
        self.sleeps.load(Ordering::Relaxed)
    }

    pub fn read_count(&self) -> u64 {
        self.reads.load(Ordering::Relaxed)
    }
}

impl Clock for ManualClock {
    fn now(&self) -> Instant {
        self.reads.fetch_add(1, Ordering::Relaxed);
        self.origin + self.elapsed()
    }

    fn sleep(&self, duration: Duration) {
        self.sleeps.fetch_add(1, Ordering::Relaxed);
        self.advance(duration);
        // ceder para que otros hilos de la prueba avancen
        thread::yield_now();
    }
}

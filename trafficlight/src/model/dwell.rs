// fuentes de duracion de cada fase

use crate::error::ConfigError;
use rand::rngs::StdRng;
use rand::SeedableRng;
use rand_distr::{Distribution, Uniform};
use std::time::Duration;

/// Entrega cuanto dura la fase siguiente.
///
/// El hilo del semaforo es dueno de su fuente, por eso `&mut self` y `Send`.
pub trait DwellSource: Send + 'static {
    fn next_dwell(&mut self) -> Duration;
}

/// Duracion uniforme en `[min, max]`, muestreada en segundos.
#[derive(Debug, Clone)]
pub struct UniformDwell {
    rng: StdRng,
    dist: Uniform<f64>,
}

impl UniformDwell {
    /// Semilla tomada del sistema operativo.
    pub fn new(min: Duration, max: Duration) -> Result<Self, ConfigError> {
        Self::with_rng(min, max, StdRng::from_os_rng())
    }

    /// Misma semilla, misma secuencia de duraciones.
    pub fn seeded(min: Duration, max: Duration, seed: u64) -> Result<Self, ConfigError> {
        Self::with_rng(min, max, StdRng::seed_from_u64(seed))
    }

    fn with_rng(min: Duration, max: Duration, rng: StdRng) -> Result<Self, ConfigError> {
        if min > max {
            return Err(ConfigError::InvalidDwellRange { min, max });
        }
        let dist = Uniform::new_inclusive(min.as_secs_f64(), max.as_secs_f64())?;
        Ok(Self { rng, dist })
    }
}

impl DwellSource for UniformDwell {
    fn next_dwell(&mut self) -> Duration {
        Duration::from_secs_f64(self.dist.sample(&mut self.rng))
    }
}

/// Siempre la misma duracion.
#[derive(Debug, Clone, Copy)]
pub struct FixedDwell(pub Duration);

impl DwellSource for FixedDwell {
    fn next_dwell(&mut self) -> Duration {
        self.0
    }
}

/// Recorre una lista de duraciones en ciclo. Vacia equivale a cero.
#[derive(Debug, Clone)]
pub struct SequenceDwell {
    durations: Vec<Duration>,
    next: usize,
}

impl SequenceDwell {
    pub fn new(durations: Vec<Duration>) -> Self {
        Self { durations, next: 0 }
    }
}

impl DwellSource for SequenceDwell {
    fn next_dwell(&mut self) -> Duration {
        if self.durations.is_empty() {
            return Duration::ZERO;
        }
        let d = self.durations[self.next];
        self.next = (self.next + 1) % self.durations.len();
        d
    }
}

use crate::error::ConfigError;
use crate::model::UniformDwell;
use handoff::PopOrder;
use std::time::Duration;

pub const DEFAULT_MIN_DWELL: Duration = Duration::from_secs(4);
pub const DEFAULT_MAX_DWELL: Duration = Duration::from_secs(6);
pub const DEFAULT_TICK: Duration = Duration::from_millis(1);

/// Parametros de un semaforo
#[derive(Debug, Clone)]
pub struct LightConfig {
    pub id: u32,
    /// duracion minima de una fase
    pub min_dwell: Duration,
    /// duracion maxima de una fase
    pub max_dwell: Duration,
    /// cada cuanto despierta el hilo a revisar si ya paso la fase
    pub tick: Duration,
    /// semilla fija para tiempos reproducibles
    pub seed: Option<u64>,
    /// orden de entrega del canal de cambios
    pub pop_order: PopOrder,
}

impl Default for LightConfig {
    fn default() -> Self {
        Self {
            id: 1,
            min_dwell: DEFAULT_MIN_DWELL,
            max_dwell: DEFAULT_MAX_DWELL,
            tick: DEFAULT_TICK,
            seed: None,
            pop_order: PopOrder::Fifo,
        }
    }
}

impl LightConfig {
    pub fn with_id(mut self, id: u32) -> Self {
        self.id = id;
        self
    }

    pub fn with_dwell(mut self, min: Duration, max: Duration) -> Self {
        self.min_dwell = min;
        self.max_dwell = max;
        self
    }

    pub fn with_tick(mut self, tick: Duration) -> Self {
        self.tick = tick;
        self
    }

    pub fn with_seed(mut self, seed: u64) -> Self {
        self.seed = Some(seed);
        self
    }

    pub fn with_pop_order(mut self, order: PopOrder) -> Self {
        self.pop_order = order;
        self
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.min_dwell > self.max_dwell {
            return Err(ConfigError::InvalidDwellRange {
                min: self.min_dwell,
                max: self.max_dwell,
            });
        }
        if self.tick.is_zero() {
            return Err(ConfigError::ZeroTick);
        }
        Ok(())
    }

    /// Fuente uniforme sobre el rango configurado, con semilla si la hay.
    pub fn dwell_source(&self) -> Result<UniformDwell, ConfigError> {
        match self.seed {
            Some(seed) => UniformDwell::seeded(self.min_dwell, self.max_dwell, seed),
            None => UniformDwell::new(self.min_dwell, self.max_dwell),
        }
    }
}

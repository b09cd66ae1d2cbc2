// errores del semaforo y de su configuracion

use std::time::Duration;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("rango de espera invalido: minimo {min:?} mayor que maximo {max:?}")]
    InvalidDwellRange { min: Duration, max: Duration },

    #[error("el tick de espera debe ser mayor que cero")]
    ZeroTick,

    #[error("distribucion de espera invalida: {0}")]
    Distribution(#[from] rand::distr::uniform::Error),
}

#[derive(Debug, Error)]
pub enum LightError {
    #[error("el semaforo {0} ya fue iniciado")]
    AlreadyStarted(u32),

    #[error("el semaforo {0} esta detenido")]
    Stopped(u32),

    #[error("no se pudo crear el hilo del semaforo: {0}")]
    Spawn(#[from] std::io::Error),
}

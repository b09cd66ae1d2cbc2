// modulo raiz de trafficlight
// un semaforo que cambia de fase en su propio hilo y avisa cada cambio

pub mod clock;
pub mod config;
pub mod error;
pub mod light;
pub mod log;
pub mod model;

// reexports comodos
pub use clock::{Clock, ManualClock, SystemClock};
pub use config::LightConfig;
pub use error::{ConfigError, LightError};
pub use light::{Lifecycle, PhaseWatcher, TrafficLight};
pub use model::*;

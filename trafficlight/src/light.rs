//! semaforo con hilo propio que alterna entre rojo y verde
//!
//! El semaforo ofrece dos vistas con locks independientes que nunca se
//! toman a la vez:
//!
//! - `current_phase` devuelve el estado confirmado mas reciente.
//! - el canal de cambios y los observadores reciben eventos, es decir la
//!   fase que dejo cada transicion en el momento en que ocurrio.
//!
//! Un consumidor lento puede estar leyendo un evento viejo mientras el estado
//! ya cambio otra vez. Estado y eventos responden preguntas distintas; unirlos
//! cambiaria el contrato de `wait_for_phase`.

use crate::clock::{Clock, SystemClock};
use crate::config::LightConfig;
use crate::error::{ConfigError, LightError};
use crate::model::{DwellSource, Phase};
use handoff::sync::lock;
use handoff::{BlockingChannel, Broadcast, RecvTimeoutError, StopToken, Subscription};
use std::fmt;
use std::panic;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex};
use std::thread::{self, JoinHandle};
use std::time::{Duration, Instant};
use tracing::{debug, info, warn};

const PHASE_LOCK: &str = "fase del semaforo";
const STAGE_LOCK: &str = "ciclo de vida del semaforo";

/// Etapa de vida del semaforo. Solo avanza: Created -> Running -> Stopped.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Lifecycle {
    Created,
    Running,
    Stopped,
}

enum Stage {
    Created {
        dwell: Box<dyn DwellSource>,
        clock: Arc<dyn Clock>,
    },
    Running(JoinHandle<()>),
    Stopped,
}

struct LightShared {
    phase: Mutex<Phase>,
    /// cola de entrega: cada evento lo consume un solo lector
    transitions: BlockingChannel<Phase>,
    /// difusion: cada observador ve todos los eventos
    watchers: Broadcast<Phase>,
    committed: AtomicU64,
}

/// Un semaforo independiente.
///
/// Se crea en rojo. `start` lanza el hilo que alterna la fase; `stop` (o
/// soltar el semaforo) lo detiene y libera a quien este esperando.
pub struct TrafficLight {
    id: u32,
    tick: Duration,
    shared: Arc<LightShared>,
    stage: Mutex<Stage>,
    stop: StopToken,
}

impl TrafficLight {
    /// Semaforo con duraciones uniformes segun `config` y reloj del sistema.
    pub fn new(config: &LightConfig) -> Result<Self, ConfigError> {
        let dwell = config.dwell_source()?;
        Self::with_parts(config, dwell, Arc::new(SystemClock))
    }

    /// Semaforo con fuente de duraciones y reloj inyectados.
    pub fn with_parts(
        config: &LightConfig,
        dwell: impl DwellSource,
        clock: Arc<dyn Clock>,
    ) -> Result<Self, ConfigError> {
        config.validate()?;
        Ok(Self {
            id: config.id,
            tick: config.tick,
            shared: Arc::new(LightShared {
                phase: Mutex::new(Phase::Red),
                transitions: BlockingChannel::with_order(config.pop_order),
                watchers: Broadcast::new(),
                committed: AtomicU64::new(0),
            }),
            stage: Mutex::new(Stage::Created {
                dwell: Box::new(dwell),
                clock,
            }),
            stop: StopToken::new(),
        })
    }

    pub fn id(&self) -> u32 {
        self.id
    }

    /// Lanza el hilo que alterna las fases. Solo se permite una vez.
    pub fn start(&self) -> Result<(), LightError> {
        let mut stage = lock(&self.stage, STAGE_LOCK);
        let (dwell, clock) = match std::mem::replace(&mut *stage, Stage::Stopped) {
            Stage::Created { dwell, clock } => (dwell, clock),
            running @ Stage::Running(_) => {
                *stage = running;
                return Err(LightError::AlreadyStarted(self.id));
            }
            Stage::Stopped => return Err(LightError::Stopped(self.id)),
        };

        let cycler = Cycler {
            id: self.id,
            tick: self.tick,
            shared: Arc::clone(&self.shared),
            stop: self.stop.clone(),
            dwell,
            clock,
        };
        let spawned = thread::Builder::new()
            .name(format!("semaforo-{}", self.id))
            .spawn(move || cycler.run());

        match spawned {
            Ok(handle) => {
                *stage = Stage::Running(handle);
                info!(light = self.id, "semaforo iniciado");
                Ok(())
            }
            Err(err) => {
                drop(stage);
                self.stop.stop();
                self.close_streams();
                Err(LightError::Spawn(err))
            }
        }
    }

    /// Detiene el hilo de ciclo, espera a que termine y cierra los canales.
    ///
    /// Quien este bloqueado esperando una fase recibe `LightError::Stopped`.
    /// Si el hilo de ciclo entro en panico, el panico se propaga aqui.
    pub fn stop(&self) {
        let previous = std::mem::replace(&mut *lock(&self.stage, STAGE_LOCK), Stage::Stopped);
        if let Stage::Stopped = previous {
            return;
        }

        self.stop.stop();
        let outcome = match previous {
            Stage::Running(handle) => handle.join(),
            _ => Ok(()),
        };
        self.close_streams();

        match outcome {
            Ok(()) => info!(
                light = self.id,
                transitions = self.transition_count(),
                "semaforo detenido"
            ),
            Err(payload) if thread::panicking() => {
                warn!(light = self.id, "hilo de ciclo fallo durante otro panico");
                drop(payload);
            }
            Err(payload) => panic::resume_unwind(payload),
        }
    }

    /// Un hilo de ciclo que murio por panico cuenta como detenido, aunque el
    /// panico solo se propague en `stop`.
    pub fn lifecycle(&self) -> Lifecycle {
        match *lock(&self.stage, STAGE_LOCK) {
            Stage::Created { .. } => Lifecycle::Created,
            Stage::Running(ref handle) if handle.is_finished() => Lifecycle::Stopped,
            Stage::Running(_) => Lifecycle::Running,
            Stage::Stopped => Lifecycle::Stopped,
        }
    }

    /// Fase confirmada mas reciente.
    pub fn current_phase(&self) -> Phase {
        *lock(&self.shared.phase, PHASE_LOCK)
    }

    /// cuantas transiciones se han confirmado
    pub fn transition_count(&self) -> u64 {
        self.shared.committed.load(Ordering::Acquire)
    }

    /// Saca un evento del canal de cambios compartido, bloqueando si no hay.
    pub fn next_transition(&self) -> Result<Phase, LightError> {
        self.shared
            .transitions
            .receive()
            .map_err(|_| LightError::Stopped(self.id))
    }

    /// Consume eventos del canal compartido hasta ver `target`.
    ///
    /// Pensado para un solo lector: si varios hilos esperan a la vez se
    /// reparten los eventos y alguno puede perderse el que buscaba. Para
    /// varios lectores usar [`subscribe`](Self::subscribe).
    pub fn wait_for_phase(&self, target: Phase) -> Result<(), LightError> {
        while self.next_transition()? != target {}
        Ok(())
    }

    pub fn wait_for_green(&self) -> Result<(), LightError> {
        self.wait_for_phase(Phase::Green)
    }

    /// Como [`wait_for_phase`](Self::wait_for_phase) con plazo. `Ok(false)` si
    /// el plazo vencio sin ver `target`. Un plazo que no cabe en un `Instant`
    /// equivale a esperar sin limite.
    pub fn wait_for_phase_timeout(
        &self,
        target: Phase,
        timeout: Duration,
    ) -> Result<bool, LightError> {
        let Some(deadline) = Instant::now().checked_add(timeout) else {
            return self.wait_for_phase(target).map(|()| true);
        };
        loop {
            let remaining = deadline.saturating_duration_since(Instant::now());
            match self.shared.transitions.receive_timeout(remaining) {
                Ok(phase) if phase == target => return Ok(true),
                Ok(_) => continue,
                Err(RecvTimeoutError::Timeout) => return Ok(false),
                Err(RecvTimeoutError::Closed) => return Err(LightError::Stopped(self.id)),
            }
        }
    }

    /// Observador propio que recibe todas las transiciones posteriores.
    pub fn subscribe(&self) -> PhaseWatcher {
        PhaseWatcher {
            light: self.id,
            subscription: self.shared.watchers.subscribe(),
        }
    }

    fn close_streams(&self) {
        self.shared.transitions.close();
        self.shared.watchers.close();
    }
}

impl Drop for TrafficLight {
    fn drop(&mut self) {
        self.stop();
    }
}

impl fmt::Debug for TrafficLight {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TrafficLight")
            .field("id", &self.id)
            .field("phase", &self.current_phase())
            .field("lifecycle", &self.lifecycle())
            .field("transitions", &self.transition_count())
            .finish()
    }
}

/// Cola privada de transiciones de un semaforo.
///
/// A diferencia de `TrafficLight::wait_for_phase`, varios observadores pueden
/// esperar a la vez y cada uno ve todos los cambios.
#[derive(Debug)]
pub struct PhaseWatcher {
    light: u32,
    subscription: Subscription<Phase>,
}

impl PhaseWatcher {
    pub fn next_transition(&self) -> Result<Phase, LightError> {
        self.subscription
            .receive()
            .map_err(|_| LightError::Stopped(self.light))
    }

    /// `Ok(None)` si no hubo transicion dentro del plazo.
    pub fn next_transition_timeout(&self, timeout: Duration) -> Result<Option<Phase>, LightError> {
        match self.subscription.receive_timeout(timeout) {
            Ok(phase) => Ok(Some(phase)),
            Err(RecvTimeoutError::Timeout) => Ok(None),
            Err(RecvTimeoutError::Closed) => Err(LightError::Stopped(self.light)),
        }
    }

    pub fn wait_for(&self, target: Phase) -> Result<(), LightError> {
        while self.next_transition()? != target {}
        Ok(())
    }

    pub fn pending(&self) -> usize {
        self.subscription.pending()
    }
}

/// Estado que se mueve al hilo de ciclo.
struct Cycler {
    id: u32,
    tick: Duration,
    shared: Arc<LightShared>,
    stop: StopToken,
    dwell: Box<dyn DwellSource>,
    clock: Arc<dyn Clock>,
}

/// Cierra ambas colas si el hilo de ciclo muere por panico, para que nadie
/// quede esperando un cambio que no va a llegar.
struct CloseOnPanic<'a>(&'a LightShared);

impl Drop for CloseOnPanic<'_> {
    fn drop(&mut self) {
        if thread::panicking() {
            self.0.transitions.close();
            self.0.watchers.close();
        }
    }
}

impl Cycler {
    fn run(mut self) {
        let shared = Arc::clone(&self.shared);
        let _guard = CloseOnPanic(&shared);
        debug!(light = self.id, "hilo de ciclo arrancando");
        loop {
            let dwell = self.dwell.next_dwell();
            if !self.wait_dwell(dwell) || self.stop.is_stopped() {
                break;
            }

            let next = {
                let mut phase = lock(&self.shared.phase, PHASE_LOCK);
                *phase = phase.toggled();
                self.shared.committed.fetch_add(1, Ordering::Release);
                *phase
            };

            // el lock de fase ya se solto; los envios toman solo el de cada cola
            if self.shared.transitions.send(next).is_err() {
                break;
            }
            let watchers = self.shared.watchers.publish(next);
            debug!(
                light = self.id,
                phase = %next,
                ?dwell,
                watchers,
                "cambio de fase"
            );
        }
        debug!(light = self.id, "hilo de ciclo terminado");
    }

    /// Duerme de a un tick hasta cumplir `dwell`. Siempre duerme al menos un
    /// tick. Devuelve false si se pidio parar.
    fn wait_dwell(&self, dwell: Duration) -> bool {
        let started = self.clock.now();
        loop {
            if self.stop.is_stopped() {
                return false;
            }
            self.clock.sleep(self.tick);
            if self.clock.now().saturating_duration_since(started) >= dwell {
                return true;
            }
        }
    }
}

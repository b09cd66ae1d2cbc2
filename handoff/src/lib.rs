//! handoff: primitivas de sincronizacion entre hilos del sistema
//! canal bloqueante, difusion a suscriptores y senal de parada

pub mod broadcast;
pub mod channels;
pub mod signals;
pub mod sync;

pub use broadcast::{Broadcast, Subscription};
pub use channels::{
    BlockingChannel, PopOrder, RecvError, RecvTimeoutError, SendError, TryRecvError,
};
pub use signals::StopToken;

//! helpers de lock sobre std::sync
//!
//! Un mutex envenenado significa que otro hilo entro en panico con el estado
//! a medio modificar. No hay forma segura de seguir, asi que estos helpers
//! convierten el envenenamiento en un panico con el nombre del lock en vez de
//! devolver un error que alguien podria ignorar.

use std::sync::{Condvar, Mutex, MutexGuard, WaitTimeoutResult};
use std::time::Duration;

/// Adquiere `mutex` o entra en panico si esta envenenado.
pub fn lock<'a, T>(mutex: &'a Mutex<T>, name: &str) -> MutexGuard<'a, T> {
    match mutex.lock() {
        Ok(guard) => guard,
        Err(_) => panic!("lock '{}' envenenado: otro hilo fallo sosteniendolo", name),
    }
}

/// Suspende el hilo en `condvar` liberando `guard` mientras espera.
///
/// Puede despertar sin que la condicion sea cierta; el caller vuelve a
/// evaluar su predicado.
pub fn wait<'a, T>(condvar: &Condvar, guard: MutexGuard<'a, T>, name: &str) -> MutexGuard<'a, T> {
    match condvar.wait(guard) {
        Ok(guard) => guard,
        Err(_) => panic!("lock '{}' envenenado durante la espera", name),
    }
}

/// Igual que [`wait`] pero con limite de tiempo.
pub fn wait_timeout<'a, T>(
    condvar: &Condvar,
    guard: MutexGuard<'a, T>,
    timeout: Duration,
    name: &str,
) -> (MutexGuard<'a, T>, WaitTimeoutResult) {
    match condvar.wait_timeout(guard, timeout) {
        Ok(pair) => pair,
        Err(_) => panic!("lock '{}' envenenado durante la espera", name),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;
    use std::thread;

    #[test]
    fn test_lock_gives_access() {
        let mutex = Mutex::new(41);
        {
            let mut guard = lock(&mutex, "contador");
            *guard += 1;
        }
        assert_eq!(*lock(&mutex, "contador"), 42);
    }

    #[test]
    fn test_poisoned_lock_panics_with_name() {
        let mutex = Arc::new(Mutex::new(0));
        let m = Arc::clone(&mutex);
        let _ = thread::spawn(move || {
            let _guard = m.lock().unwrap();
            panic!("fallo a proposito");
        })
        .join();

        let result = std::panic::catch_unwind(|| {
            let _guard = lock(&mutex, "fase");
        });
        let payload = result.expect_err("un lock envenenado debe ser fatal");
        let msg = payload
            .downcast_ref::<String>()
            .cloned()
            .unwrap_or_default();
        assert!(msg.contains("fase"), "mensaje inesperado: {}", msg);
    }

    #[test]
    fn test_wait_timeout_expires() {
        let mutex = Mutex::new(false);
        let condvar = Condvar::new();
        let guard = lock(&mutex, "flag");
        let (_guard, res) = wait_timeout(&condvar, guard, Duration::from_millis(5), "flag");
        assert!(res.timed_out());
    }
}

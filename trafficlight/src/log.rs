// trafficlight/src/log.rs
// Instala el subscriber de tracing una sola vez. Respeta RUST_LOG; si no esta
// definido usa `info`. Llamarlo de nuevo no hace nada.

use once_cell::sync::OnceCell;
use tracing_subscriber::EnvFilter;

static LOGGING: OnceCell<()> = OnceCell::new();

const DEFAULT_FILTER: &str = "info";

pub fn init_logging() {
    LOGGING.get_or_init(|| {
        let filter = EnvFilter::try_from_default_env()
            .unwrap_or_else(|_| EnvFilter::new(DEFAULT_FILTER));
        // si otro subscriber global ya existe (tests, binario anfitrion) se respeta
        let _ = tracing_subscriber::fmt()
            .with_env_filter(filter)
            .with_thread_names(true)
            .try_init();
    });
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_init_logging_is_idempotent() {
        init_logging();
        init_logging();
        assert!(LOGGING.get().is_some());
    }
}

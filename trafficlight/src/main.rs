// ============================================================================
// main.rs - Semaforo en su propio hilo con vehiculos esperando verde
// ============================================================================

use std::sync::Arc;
use std::thread;

use tracing::{error, info};
use trafficlight::log::init_logging;
use trafficlight::{LightConfig, Phase, TrafficLight};

const VEHICLES: u32 = 2;
const CROSSINGS_PER_VEHICLE: u32 = 2;

fn main() {
    init_logging();

    info!("╔════════════════════════════════════════════════════════════╗");
    info!("║              Semaforo - Simulacion                         ║");
    info!("╚════════════════════════════════════════════════════════════╝");

    let config = LightConfig::default();
    let light = match TrafficLight::new(&config) {
        Ok(light) => Arc::new(light),
        Err(err) => {
            error!("configuracion invalida: {}", err);
            std::process::exit(1);
        }
    };
    info!(
        "semaforo {} en {} (fases de {:?} a {:?})",
        light.id(),
        light.current_phase(),
        config.min_dwell,
        config.max_dwell
    );

    // los observadores se registran antes de arrancar para no perder cambios
    let vehicles: Vec<_> = (1..=VEHICLES)
        .map(|n| {
            let watcher = light.subscribe();
            let light = Arc::clone(&light);
            thread::Builder::new()
                .name(format!("vehiculo-{}", n))
                .spawn(move || {
                    for crossing in 1..=CROSSINGS_PER_VEHICLE {
                        info!("🚗 vehiculo {} espera verde (cruce {})", n, crossing);
                        if let Err(err) = watcher.wait_for(Phase::Green) {
                            error!("vehiculo {}: {}", n, err);
                            return;
                        }
                        info!(
                            "✅ vehiculo {} cruza, semaforo en {}",
                            n,
                            light.current_phase()
                        );
                    }
                })
        })
        .collect();

    if let Err(err) = light.start() {
        error!("no se pudo iniciar el semaforo: {}", err);
        std::process::exit(1);
    }

    for vehicle in vehicles {
        match vehicle {
            Ok(handle) => {
                if handle.join().is_err() {
                    error!("un vehiculo termino con panico");
                }
            }
            Err(err) => error!("no se pudo crear el vehiculo: {}", err),
        }
    }

    light.stop();
    info!(
        "\n✅ simulacion terminada: {} cambios de fase",
        light.transition_count()
    );
}

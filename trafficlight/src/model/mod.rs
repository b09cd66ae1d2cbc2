// reune las piezas del modelo

mod dwell;
mod phase;

pub use dwell::{DwellSource, FixedDwell, SequenceDwell, UniformDwell};
pub use phase::Phase;

// fases del semaforo

use std::fmt;

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub enum Phase {
    #[default]
    Red,
    Green,
}

impl Phase {
    /// la otra fase
    pub fn toggled(self) -> Self {
        match self {
            Phase::Red => Phase::Green,
            Phase::Green => Phase::Red,
        }
    }

    pub fn is_green(self) -> bool {
        self == Phase::Green
    }
}

impl fmt::Display for Phase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Phase::Red => write!(f, "rojo"),
            Phase::Green => write!(f, "verde"),
        }
    }
}

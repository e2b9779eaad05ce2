// Domain layer: models and ports. Concrete adapters live under core/ and config/.

pub mod model;
pub mod ports;

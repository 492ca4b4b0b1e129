// Domain layer: report models and ports (warehouse + settings). No transport concerns here.

pub mod model;
pub mod ports;

//! Types and dispatch tables generated from the schemas in `schemas/`.

include!(concat!(env!("OUT_DIR"), "/basic.rs"));
include!(concat!(env!("OUT_DIR"), "/calc.rs"));


pub mod action {
    pub mod cli;
    pub mod interactive;
}

pub mod config {
    pub mod config;
    pub mod ports;
}

pub mod core {
    pub mod classify;
    pub mod compat;
    pub mod convert;
    pub mod detect;
    pub mod naming;
    pub mod pipeline;
}

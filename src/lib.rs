pub mod choke {
    pub mod allocator;
    pub mod auction;
    pub mod models;
    pub mod prop_share;
    pub mod reciprocity;
}

pub mod core_models {
    pub mod entities;
    pub mod errors;
    pub mod history;
}

pub mod config;
pub mod mocks;
pub mod peer;
pub mod piece_picker;
pub mod swarm;

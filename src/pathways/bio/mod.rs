pub mod interactions;
pub mod interaction_network;

mod setups;

pub use kitchen_world::KitchenWorld;

use cucumber::given;
use kitchen_engine::db_types::SettingsUpdate;

use crate::{cucumber::KitchenWorld, support::KitchenSystem};

#[given("a fresh kitchen")]
async fn fresh_kitchen(world: &mut KitchenWorld) {
    let system = KitchenSystem::new().await;
    world.system = Some(system);
}

#[given(expr = "the menu has {string} at {int} EGP")]
async fn menu_item(world: &mut KitchenWorld, name: String, price: i64) {
    let item = world.kitchen().menu_item(&name, price).await;
    world.menu.insert(name, item);
}

#[given(expr = "a customer named {string}")]
async fn customer(world: &mut KitchenWorld, name: String) {
    let user = world.kitchen().customer(&name).await;
    world.users.insert(name, user);
}

#[given(expr = "an admin named {string}")]
async fn admin(world: &mut KitchenWorld, name: String) {
    let user = world.kitchen().admin(&name).await;
    world.users.insert(name, user);
}

#[given(expr = "at most {int} of any item per cart")]
async fn max_quantity(world: &mut KitchenWorld, max: i64) {
    let update = SettingsUpdate { max_quantity_per_item: Some(max), ..Default::default() };
    world.kitchen().settings.update_settings(update).await.expect("Error updating settings");
}

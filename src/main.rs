//! Demo: a guest fills a cart, signs in, and keeps shopping.
//!
//! Runs against the in-process server cart unless `CART_API_BASE_URL` is set.

use cart_sync::config::CartConfig;
use cart_sync::lifecycle::{setup_tracing, CartSystem};
use cart_sync::model::CartItem;
use tracing::{info, Instrument};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    setup_tracing();

    let config = CartConfig::from_env()?;
    info!(?config, "Starting cart demo");

    let system = CartSystem::from_config(&config)?;
    let cart = system.coordinator.clone();

    let span = tracing::info_span!("guest_session");
    async {
        cart.add_to_cart(CartItem::new("tee-01", "Linen Tee", 24.0).with_size("M"), 2)?;
        cart.add_one(CartItem::new("cap-07", "Canvas Cap", 18.5).with_color("olive"))?;
        cart.add_one(CartItem::new("tee-01", "Linen Tee", 24.0).with_size("M"))?;
        info!(
            lines = cart.lines().len(),
            count = cart.cart_count(),
            total = cart.cart_total(),
            "Guest cart ready"
        );
        Ok::<_, cart_sync::coordinator::CartError>(())
    }
    .instrument(span)
    .await?;

    let span = tracing::info_span!("login");
    let outcome = cart.set_authenticated(true).instrument(span).await;
    info!(?outcome, lines = cart.lines().len(), "Login sync done");

    let span = tracing::info_span!("member_session");
    async {
        cart.update_quantity("cap-07", 3);
        cart.remove_from_cart("tee-01");
        cart.flush_remote().await;
        let outcome = cart.refresh_cart().await;
        info!(
            ?outcome,
            count = cart.cart_count(),
            total = cart.cart_total(),
            "Cart after refresh"
        );
    }
    .instrument(span)
    .await;

    drop(cart);
    system.shutdown().await?;

    info!("Demo completed");
    Ok(())
}

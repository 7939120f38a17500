use serde::{Deserialize, Serialize};

/// A purchasable item variant held in the cart.
///
/// Two lines are the same line when their [`LineKey`] matches, i.e. the same
/// `product_id`, `size` and `color`. The wire format uses camelCase field
/// names (`productId`, ...) and tolerates missing optional strings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CartLine {
    pub product_id: String,
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub image: String,
    pub price: f64,
    pub quantity: u32,
    #[serde(default)]
    pub size: String,
    #[serde(default)]
    pub color: String,
}

/// Identity of a cart line: `(product_id, size, color)`.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct LineKey {
    pub product_id: String,
    pub size: String,
    pub color: String,
}

impl CartLine {
    /// Builds a line from an item and an explicit quantity.
    pub fn from_item(item: CartItem, quantity: u32) -> Self {
        Self {
            product_id: item.product_id,
            name: item.name,
            image: item.image,
            price: item.price,
            quantity,
            size: item.size.unwrap_or_default(),
            color: item.color.unwrap_or_default(),
        }
    }

    pub fn key(&self) -> LineKey {
        LineKey {
            product_id: self.product_id.clone(),
            size: self.size.clone(),
            color: self.color.clone(),
        }
    }

    /// Returns `true` if this line has the given identity.
    pub fn matches(&self, key: &LineKey) -> bool {
        self.product_id == key.product_id && self.size == key.size && self.color == key.color
    }

    /// `price * quantity` for this line.
    pub fn subtotal(&self) -> f64 {
        self.price * f64::from(self.quantity)
    }
}

/// Input to [`CartCoordinator::add_to_cart`](crate::coordinator::CartCoordinator::add_to_cart).
///
/// `size` and `color` are optional; `None` normalizes to an empty string so
/// that "no size" and `""` are the same variant.
#[derive(Debug, Clone, PartialEq)]
pub struct CartItem {
    pub product_id: String,
    pub name: String,
    pub image: String,
    pub price: f64,
    pub size: Option<String>,
    pub color: Option<String>,
}

impl CartItem {
    /// Creates an item with no size or color.
    pub fn new(product_id: impl Into<String>, name: impl Into<String>, price: f64) -> Self {
        Self {
            product_id: product_id.into(),
            name: name.into(),
            image: String::new(),
            price,
            size: None,
            color: None,
        }
    }

    pub fn with_image(mut self, image: impl Into<String>) -> Self {
        self.image = image.into();
        self
    }

    pub fn with_size(mut self, size: impl Into<String>) -> Self {
        self.size = Some(size.into());
        self
    }

    pub fn with_color(mut self, color: impl Into<String>) -> Self {
        self.color = Some(color.into());
        self
    }

    /// Identity this item will have once it is in the cart.
    pub fn key(&self) -> LineKey {
        LineKey {
            product_id: self.product_id.clone(),
            size: self.size.clone().unwrap_or_default(),
            color: self.color.clone().unwrap_or_default(),
        }
    }
}

/// Sum of `price * quantity` over `lines`.
pub fn cart_total(lines: &[CartLine]) -> f64 {
    lines.iter().map(CartLine::subtotal).sum()
}

/// Sum of quantities over `lines`.
pub fn cart_count(lines: &[CartLine]) -> u32 {
    lines.iter().map(|line| line.quantity).sum()
}

/// Adds `incoming` into `lines`: an existing line with the same key has its
/// quantity increased, otherwise `incoming` is appended.
///
/// Returns the resulting quantity of the affected line and whether it was newly appended.
pub fn merge_line(lines: &mut Vec<CartLine>, incoming: CartLine) -> (u32, bool) {
    let key = incoming.key();
    match lines.iter_mut().find(|line| line.matches(&key)) {
        Some(existing) => {
            existing.quantity = existing.quantity.saturating_add(incoming.quantity);
            (existing.quantity, false)
        }
        None => {
            let quantity = incoming.quantity;
            lines.push(incoming);
            (quantity, true)
        }
    }
}

/// Drops zero-quantity lines and folds lines sharing a key into the first
/// of them, keeping first-seen order.
pub fn normalize_lines(lines: impl IntoIterator<Item = CartLine>) -> Vec<CartLine> {
    let mut normalized = Vec::new();
    for line in lines.into_iter().filter(|line| line.quantity > 0) {
        merge_line(&mut normalized, line);
    }
    normalized
}

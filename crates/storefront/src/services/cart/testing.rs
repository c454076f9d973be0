//! In-memory `CartBackend` that records every call.

#![allow(clippy::unwrap_used)]

use std::collections::BTreeMap;
use std::sync::{Arc, Mutex};

use mercado_core::{AuthToken, CartId, ItemId, LineItemId, OrderId, OrderStatus, Price};

use tokio::sync::Notify;

use super::CartBackend;
use crate::commerce::{
    CartUpdate, CommerceError, NewCartItem, Order, OrderLine, PaymentRequest, ShopCart,
    ShopCartItem,
};

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Call {
    CreateCart,
    GetCart(CartId),
    UpdateCart(CartId, CartUpdate),
    FindCartItem(CartId, ItemId),
    CreateCartItem(NewCartItem),
    UpdateQuantity(LineItemId, u32),
    RemoveCartItem(LineItemId),
    PayCart(CartId),
}

impl Call {
    const fn name(&self) -> &'static str {
        match self {
            Self::CreateCart => "create_cart",
            Self::GetCart(_) => "get_cart",
            Self::UpdateCart(..) => "update_cart",
            Self::FindCartItem(..) => "find_cart_item",
            Self::CreateCartItem(_) => "create_cart_item",
            Self::UpdateQuantity(..) => "update_quantity",
            Self::RemoveCartItem(_) => "remove_cart_item",
            Self::PayCart(_) => "pay_cart",
        }
    }
}

#[derive(Default)]
struct State {
    carts: BTreeMap<CartId, ShopCart>,
    calls: Vec<Call>,
    next_id: u32,
    fail_on: Option<&'static str>,
}

impl State {
    fn record(&mut self, call: Call) -> Result<(), CommerceError> {
        let name = call.name();
        self.calls.push(call);
        if self.fail_on == Some(name) {
            return Err(CommerceError::Api {
                status: 503,
                message: format!("{name} failed"),
            });
        }
        Ok(())
    }

    fn next(&mut self, prefix: &str) -> String {
        self.next_id += 1;
        format!("{prefix}{}", self.next_id)
    }

    fn missing(what: impl std::fmt::Display) -> CommerceError {
        CommerceError::Api {
            status: 404,
            message: format!("{what} not found"),
        }
    }

    fn line_mut(&mut self, id: &LineItemId) -> Option<&mut ShopCartItem> {
        self.carts
            .values_mut()
            .flat_map(|cart| cart.items.iter_mut())
            .find(|line| &line.id == id)
    }
}

/// Fake commerce backend keeping carts in memory.
#[derive(Default)]
pub struct RecordingBackend {
    state: Mutex<State>,
    get_cart_gate: Mutex<Option<(Arc<Notify>, Arc<Notify>)>>,
}

impl RecordingBackend {
    pub fn new() -> Self {
        Self::default()
    }

    /// Backend with an existing, empty cart.
    pub fn with_cart(id: &str) -> Self {
        let backend = Self::new();
        backend.state.lock().unwrap().carts.insert(
            CartId::new(id),
            ShopCart {
                id: CartId::new(id),
                items: Vec::new(),
                for_delivery: false,
                for_pickup: false,
                shipment_address: None,
                external_reference: None,
            },
        );
        backend
    }

    /// Put a line into a cart without recording a call.
    pub fn seed_line(&self, cart: &str, line: &str, item: &str, quantity: u32, price: &str) {
        let mut state = self.state.lock().unwrap();
        let cart_id = CartId::new(cart);
        state.carts.get_mut(&cart_id).unwrap().items.push(ShopCartItem {
            id: LineItemId::new(line),
            cart: cart_id,
            item: ItemId::new(item),
            quantity,
            price: price.parse().unwrap(),
            materials: Vec::new(),
        });
    }

    /// Make every call of the named operation fail after being recorded.
    pub fn fail_on(&self, operation: &'static str) {
        self.state.lock().unwrap().fail_on = Some(operation);
    }

    /// Hold the next `get_cart` after it has read the cart.
    ///
    /// The first `Notify` fires once the read is done; the call returns
    /// after the second is notified.
    pub fn pause_next_get_cart(&self) -> (Arc<Notify>, Arc<Notify>) {
        let reached = Arc::new(Notify::new());
        let release = Arc::new(Notify::new());
        *self.get_cart_gate.lock().unwrap() = Some((Arc::clone(&reached), Arc::clone(&release)));
        (reached, release)
    }

    pub fn calls(&self) -> Vec<Call> {
        self.state.lock().unwrap().calls.clone()
    }

    pub fn clear_calls(&self) {
        self.state.lock().unwrap().calls.clear();
    }

    pub fn cart(&self, id: &str) -> ShopCart {
        self.state.lock().unwrap().carts[&CartId::new(id)].clone()
    }
}

impl CartBackend for RecordingBackend {
    async fn create_cart(&self, _token: Option<&AuthToken>) -> Result<ShopCart, CommerceError> {
        let mut state = self.state.lock().unwrap();
        state.record(Call::CreateCart)?;
        let id = CartId::new(state.next("c"));
        let cart = ShopCart {
            id: id.clone(),
            items: Vec::new(),
            for_delivery: false,
            for_pickup: false,
            shipment_address: None,
            external_reference: None,
        };
        state.carts.insert(id, cart.clone());
        Ok(cart)
    }

    async fn get_cart(
        &self,
        _token: Option<&AuthToken>,
        cart_id: &CartId,
    ) -> Result<Option<ShopCart>, CommerceError> {
        let cart = {
            let mut state = self.state.lock().unwrap();
            state.record(Call::GetCart(cart_id.clone()))?;
            state.carts.get(cart_id).cloned()
        };
        let gate = self.get_cart_gate.lock().unwrap().take();
        if let Some((reached, release)) = gate {
            reached.notify_one();
            release.notified().await;
        }
        Ok(cart)
    }

    async fn update_cart(
        &self,
        _token: Option<&AuthToken>,
        cart_id: &CartId,
        update: &CartUpdate,
    ) -> Result<ShopCart, CommerceError> {
        let mut state = self.state.lock().unwrap();
        state.record(Call::UpdateCart(cart_id.clone(), update.clone()))?;
        let cart = state
            .carts
            .get_mut(cart_id)
            .ok_or_else(|| State::missing(cart_id))?;
        if let Some(flag) = update.for_delivery {
            cart.for_delivery = flag;
        }
        if let Some(flag) = update.for_pickup {
            cart.for_pickup = flag;
        }
        if let Some(address) = &update.shipment_address {
            cart.shipment_address.clone_from(address);
        }
        if let Some(reference) = &update.external_reference {
            cart.external_reference.clone_from(reference);
        }
        Ok(cart.clone())
    }

    async fn find_cart_item(
        &self,
        _token: Option<&AuthToken>,
        cart_id: &CartId,
        item: &ItemId,
    ) -> Result<Option<ShopCartItem>, CommerceError> {
        let mut state = self.state.lock().unwrap();
        state.record(Call::FindCartItem(cart_id.clone(), item.clone()))?;
        Ok(state
            .carts
            .get(cart_id)
            .and_then(|cart| cart.line_for(item))
            .cloned())
    }

    async fn create_cart_item(
        &self,
        _token: Option<&AuthToken>,
        line: &NewCartItem,
    ) -> Result<ShopCartItem, CommerceError> {
        let mut state = self.state.lock().unwrap();
        state.record(Call::CreateCartItem(line.clone()))?;
        let created = ShopCartItem {
            id: LineItemId::new(state.next("l")),
            cart: line.cart.clone(),
            item: line.item.clone(),
            quantity: line.quantity,
            price: line.price.unwrap_or(Price::ZERO),
            materials: line.materials.clone(),
        };
        state
            .carts
            .get_mut(&line.cart)
            .ok_or_else(|| State::missing(&line.cart))?
            .items
            .push(created.clone());
        Ok(created)
    }

    async fn update_cart_item_quantity(
        &self,
        _token: Option<&AuthToken>,
        line: &LineItemId,
        quantity: u32,
    ) -> Result<ShopCartItem, CommerceError> {
        let mut state = self.state.lock().unwrap();
        state.record(Call::UpdateQuantity(line.clone(), quantity))?;
        let existing = state
            .line_mut(line)
            .ok_or_else(|| State::missing(line))?;
        existing.quantity = quantity;
        Ok(existing.clone())
    }

    async fn remove_cart_item(
        &self,
        _token: Option<&AuthToken>,
        line: &LineItemId,
    ) -> Result<(), CommerceError> {
        let mut state = self.state.lock().unwrap();
        state.record(Call::RemoveCartItem(line.clone()))?;
        for cart in state.carts.values_mut() {
            cart.items.retain(|existing| &existing.id != line);
        }
        Ok(())
    }

    async fn pay_cart(
        &self,
        _token: Option<&AuthToken>,
        cart_id: &CartId,
        _payment: &PaymentRequest,
    ) -> Result<Order, CommerceError> {
        let mut state = self.state.lock().unwrap();
        state.record(Call::PayCart(cart_id.clone()))?;
        let cart = state
            .carts
            .remove(cart_id)
            .ok_or_else(|| State::missing(cart_id))?;
        Ok(Order {
            id: OrderId::new(format!("o-{cart_id}")),
            status: OrderStatus::Paid,
            total: cart.subtotal().unwrap(),
            items: cart
                .items
                .iter()
                .map(|line| OrderLine {
                    item: line.item.clone(),
                    quantity: line.quantity,
                    price: line.price,
                })
                .collect(),
            shipment_address: cart.shipment_address,
            for_delivery: cart.for_delivery,
            for_pickup: cart.for_pickup,
            created_at: None,
        })
    }
}

use std::sync::Arc;

use pocketshop_core::{Order, OrderId};
use tokio::sync::watch;

use crate::error::Error;
use crate::orders::OrderService;

/// What the order history screen shows.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct OrdersViewState {
    pub orders: Vec<Order>,
    pub is_loading: bool,
    pub is_refreshing: bool,
    pub error: Option<String>,
}

impl OrdersViewState {
    /// Loaded successfully and there is nothing to show.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        !self.is_loading && !self.is_refreshing && self.error.is_none() && self.orders.is_empty()
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum OrdersIntent {
    Load,
    /// Reload while keeping the current list on screen.
    Refresh,
    Cancel(OrderId),
    Reorder(OrderId),
    ClearError,
}

/// Turns order history intents into [`OrdersViewState`]s.
#[derive(Clone)]
pub struct OrdersViewModel {
    orders: OrderService,
    state: Arc<watch::Sender<OrdersViewState>>,
}

impl OrdersViewModel {
    #[must_use]
    pub fn new(orders: OrderService) -> Self {
        let (state, _rx) = watch::channel(OrdersViewState::default());
        Self {
            orders,
            state: Arc::new(state),
        }
    }

    #[must_use]
    pub fn state(&self) -> OrdersViewState {
        self.state.borrow().clone()
    }

    #[must_use]
    pub fn subscribe(&self) -> watch::Receiver<OrdersViewState> {
        self.state.subscribe()
    }

    /// Run an intent to completion and return the state it settled on.
    pub async fn dispatch(&self, intent: OrdersIntent) -> OrdersViewState {
        match intent {
            OrdersIntent::Load => {
                self.state.send_modify(|s| {
                    s.is_loading = true;
                    s.error = None;
                });
                self.reload().await;
            }
            OrdersIntent::Refresh => {
                self.state.send_modify(|s| s.is_refreshing = true);
                self.reload().await;
            }
            OrdersIntent::Cancel(order_id) => {
                let order = self.state.borrow().orders.iter().find(|o| o.id == order_id).cloned();
                let result = match order {
                    Some(order) => self.orders.cancel(&order).await,
                    None => Err(Error::OrderNotFound(order_id)),
                };
                self.after_action(result).await;
            }
            OrdersIntent::Reorder(order_id) => {
                let result = self.orders.reorder(&order_id).await.map(|_| ());
                self.after_action(result).await;
            }
            OrdersIntent::ClearError => self.state.send_modify(|s| s.error = None),
        }
        self.state()
    }

    async fn reload(&self) {
        let result = self.orders.my_orders().await;
        self.state.send_modify(|s| {
            s.is_loading = false;
            s.is_refreshing = false;
            match &result {
                Ok(orders) => {
                    s.orders.clone_from(orders);
                    s.error = None;
                }
                Err(err) => s.error = Some(err.user_message()),
            }
        });
        if let Err(err) = result {
            err.report();
        }
    }

    async fn after_action(&self, result: Result<(), Error>) {
        match result {
            Ok(()) => self.reload().await,
            Err(err) => {
                err.report();
                self.state.send_modify(|s| s.error = Some(err.user_message()));
            }
        }
    }
}

impl std::fmt::Debug for OrdersViewModel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("OrdersViewModel")
            .field("state", &*self.state.borrow())
            .finish_non_exhaustive()
    }
}

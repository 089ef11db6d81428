//! In-memory Remote Store data with call recording and fault injection.
//!
//! Both test doubles ([`crate::FakeRemoteStore`] and [`crate::server`]) sit
//! on top of one [`Backend`], so the same scenario can run in-process or
//! over real HTTP.

use std::collections::HashMap;
use std::sync::{Mutex, MutexGuard, PoisonError};

use pocketshop_core::{
    ApiResponse, CartItem, CartItemId, Favorite, FavoriteId, NewCartItem, NewFavorite, NewOrder,
    Order, OrderId, OrderStatus, Product, ProductId, RegisterRequest, Timestamp, User, UserId,
};
use uuid::Uuid;

/// Remote Store endpoints, used to target faults and count calls.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Endpoint {
    Products,
    Product,
    Users,
    CreateUser,
    Favorites,
    AddFavorite,
    DeleteFavorite,
    Cart,
    CreateCartItem,
    UpdateCartItem,
    DeleteCartItem,
    ClearCart,
    CreateOrder,
    UserOrders,
    Orders,
    CancelOrder,
    Reorder,
}

/// One recorded call.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Call {
    Products,
    Product(ProductId),
    Users,
    CreateUser(String),
    Favorites(UserId),
    AddFavorite(ProductId),
    DeleteFavorite(FavoriteId),
    Cart(UserId),
    CreateCartItem(ProductId, u32),
    UpdateCartItem(CartItemId, u32),
    DeleteCartItem(CartItemId),
    ClearCart(UserId),
    CreateOrder(UserId),
    UserOrders(UserId),
    Orders,
    CancelOrder(OrderId),
    Reorder(OrderId),
}

impl Call {
    #[must_use]
    pub const fn endpoint(&self) -> Endpoint {
        match self {
            Self::Products => Endpoint::Products,
            Self::Product(_) => Endpoint::Product,
            Self::Users => Endpoint::Users,
            Self::CreateUser(_) => Endpoint::CreateUser,
            Self::Favorites(_) => Endpoint::Favorites,
            Self::AddFavorite(_) => Endpoint::AddFavorite,
            Self::DeleteFavorite(_) => Endpoint::DeleteFavorite,
            Self::Cart(_) => Endpoint::Cart,
            Self::CreateCartItem(..) => Endpoint::CreateCartItem,
            Self::UpdateCartItem(..) => Endpoint::UpdateCartItem,
            Self::DeleteCartItem(_) => Endpoint::DeleteCartItem,
            Self::ClearCart(_) => Endpoint::ClearCart,
            Self::CreateOrder(_) => Endpoint::CreateOrder,
            Self::UserOrders(_) => Endpoint::UserOrders,
            Self::Orders => Endpoint::Orders,
            Self::CancelOrder(_) => Endpoint::CancelOrder,
            Self::Reorder(_) => Endpoint::Reorder,
        }
    }
}

/// How a call fails. Natural rejections (unknown ids) use `Status` too.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Fault {
    /// Answer with this HTTP status.
    Status(u16),
    /// Drop the connection.
    Disconnect,
    /// Never answer in time.
    Timeout,
    /// Answer 200 with a body that is not the expected JSON.
    Malformed,
}

#[derive(Debug, Clone, Copy)]
struct FaultRule {
    endpoint: Endpoint,
    /// 1-based call number to fail, or every call.
    nth: Option<usize>,
    fault: Fault,
}

#[derive(Debug, Default)]
struct BackendState {
    products: Vec<Product>,
    users: Vec<User>,
    cart: Vec<CartItem>,
    orders: Vec<Order>,
    favorites: Vec<Favorite>,
    calls: Vec<Call>,
    counts: HashMap<Endpoint, usize>,
    rules: Vec<FaultRule>,
    bulk_clear_unsupported: bool,
}

/// Shared, mutable backend data.
#[derive(Debug, Default)]
pub struct Backend {
    state: Mutex<BackendState>,
}

fn new_id(prefix: &str) -> String {
    format!("{prefix}-{}", Uuid::new_v4().simple())
}

impl Backend {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> MutexGuard<'_, BackendState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    // =========================================================================
    // Seeding and inspection
    // =========================================================================

    pub fn add_product(&self, product: Product) {
        self.lock().products.push(product);
    }

    pub fn remove_product(&self, id: &ProductId) {
        self.lock().products.retain(|p| &p.id != id);
    }

    pub fn add_user(&self, user: User) {
        self.lock().users.push(user);
    }

    pub fn add_cart_item(&self, item: CartItem) {
        self.lock().cart.push(item);
    }

    pub fn add_order(&self, order: Order) {
        self.lock().orders.push(order);
    }

    /// Make `DELETE cart?userId` answer 404, like a deployment without the
    /// bulk endpoint.
    pub fn disable_bulk_clear(&self) {
        self.lock().bulk_clear_unsupported = true;
    }

    /// Fail every call to `endpoint`.
    pub fn fail(&self, endpoint: Endpoint, fault: Fault) {
        self.lock().rules.push(FaultRule {
            endpoint,
            nth: None,
            fault,
        });
    }

    /// Fail only the `nth` (1-based) call to `endpoint`.
    pub fn fail_nth(&self, endpoint: Endpoint, nth: usize, fault: Fault) {
        self.lock().rules.push(FaultRule {
            endpoint,
            nth: Some(nth),
            fault,
        });
    }

    pub fn clear_faults(&self) {
        self.lock().rules.clear();
    }

    /// Server-side cart of `user_id`, in insertion order.
    #[must_use]
    pub fn cart_of(&self, user_id: &UserId) -> Vec<CartItem> {
        self.lock()
            .cart
            .iter()
            .filter(|item| &item.user_id == user_id)
            .cloned()
            .collect()
    }

    #[must_use]
    pub fn orders_snapshot(&self) -> Vec<Order> {
        self.lock().orders.clone()
    }

    #[must_use]
    pub fn favorites_snapshot(&self) -> Vec<Favorite> {
        self.lock().favorites.clone()
    }

    #[must_use]
    pub fn users_snapshot(&self) -> Vec<User> {
        self.lock().users.clone()
    }

    /// Every call so far, in order.
    #[must_use]
    pub fn calls(&self) -> Vec<Call> {
        self.lock().calls.clone()
    }

    #[must_use]
    pub fn call_count(&self) -> usize {
        self.lock().calls.len()
    }

    #[must_use]
    pub fn calls_to(&self, endpoint: Endpoint) -> usize {
        self.lock().counts.get(&endpoint).copied().unwrap_or(0)
    }

    pub fn reset_calls(&self) {
        let mut state = self.lock();
        state.calls.clear();
        state.counts.clear();
    }

    // =========================================================================
    // Operations
    // =========================================================================

    /// Record a call and return the injected fault, if one applies.
    fn begin(state: &mut BackendState, call: Call) -> Result<(), Fault> {
        let endpoint = call.endpoint();
        state.calls.push(call);
        let count = state.counts.entry(endpoint).or_insert(0);
        *count += 1;
        let count = *count;
        state
            .rules
            .iter()
            .find(|rule| rule.endpoint == endpoint && rule.nth.is_none_or(|nth| nth == count))
            .map_or(Ok(()), |rule| Err(rule.fault))
    }

    /// # Errors
    ///
    /// Returns the injected fault, if any.
    pub fn products(&self) -> Result<Vec<Product>, Fault> {
        let mut state = self.lock();
        Self::begin(&mut state, Call::Products)?;
        Ok(state.products.clone())
    }

    /// # Errors
    ///
    /// 404 for an unknown product, or the injected fault.
    pub fn product(&self, id: &ProductId) -> Result<Product, Fault> {
        let mut state = self.lock();
        Self::begin(&mut state, Call::Product(id.clone()))?;
        state
            .products
            .iter()
            .find(|p| &p.id == id)
            .cloned()
            .ok_or(Fault::Status(404))
    }

    /// # Errors
    ///
    /// Returns the injected fault, if any.
    pub fn users(&self) -> Result<Vec<User>, Fault> {
        let mut state = self.lock();
        Self::begin(&mut state, Call::Users)?;
        Ok(state.users.clone())
    }

    /// # Errors
    ///
    /// 409 if the email is taken, or the injected fault.
    pub fn create_user(&self, request: &RegisterRequest) -> Result<User, Fault> {
        let mut state = self.lock();
        Self::begin(&mut state, Call::CreateUser(request.email.clone()))?;
        if state
            .users
            .iter()
            .any(|u| u.email.eq_ignore_ascii_case(&request.email))
        {
            return Err(Fault::Status(409));
        }
        let user = User {
            id: UserId::new(new_id("user")),
            first_name: request.first_name.clone(),
            last_name: request.last_name.clone(),
            email: request.email.clone(),
            password: request.password.clone(),
            phone: request.phone.clone(),
            address: request.address.clone(),
        };
        state.users.push(user.clone());
        Ok(user)
    }

    /// # Errors
    ///
    /// Returns the injected fault, if any.
    pub fn favorites(&self, user_id: &UserId) -> Result<Vec<Favorite>, Fault> {
        let mut state = self.lock();
        Self::begin(&mut state, Call::Favorites(user_id.clone()))?;
        Ok(state
            .favorites
            .iter()
            .filter(|f| &f.user_id == user_id)
            .cloned()
            .collect())
    }

    /// # Errors
    ///
    /// Returns the injected fault, if any.
    pub fn add_favorite(&self, favorite: &NewFavorite) -> Result<Favorite, Fault> {
        let mut state = self.lock();
        Self::begin(&mut state, Call::AddFavorite(favorite.product_id.clone()))?;
        let favorite = Favorite {
            id: FavoriteId::new(new_id("fav")),
            user_id: favorite.user_id.clone(),
            product_id: favorite.product_id.clone(),
        };
        state.favorites.push(favorite.clone());
        Ok(favorite)
    }

    /// # Errors
    ///
    /// 404 for an unknown favorite, or the injected fault.
    pub fn delete_favorite(&self, id: &FavoriteId) -> Result<(), Fault> {
        let mut state = self.lock();
        Self::begin(&mut state, Call::DeleteFavorite(id.clone()))?;
        let before = state.favorites.len();
        state.favorites.retain(|f| &f.id != id);
        if state.favorites.len() == before {
            return Err(Fault::Status(404));
        }
        Ok(())
    }

    /// # Errors
    ///
    /// Returns the injected fault, if any.
    pub fn cart(&self, user_id: &UserId) -> Result<Vec<CartItem>, Fault> {
        let mut state = self.lock();
        Self::begin(&mut state, Call::Cart(user_id.clone()))?;
        Ok(state
            .cart
            .iter()
            .filter(|item| &item.user_id == user_id)
            .cloned()
            .collect())
    }

    /// # Errors
    ///
    /// Returns the injected fault, if any.
    pub fn create_cart_item(&self, item: &NewCartItem) -> Result<CartItem, Fault> {
        let mut state = self.lock();
        Self::begin(
            &mut state,
            Call::CreateCartItem(item.product.id.clone(), item.quantity),
        )?;
        let item = CartItem {
            id: CartItemId::new(new_id("cart")),
            user_id: item.user_id.clone(),
            product: item.product.clone(),
            quantity: item.quantity,
            created_at: Some(item.created_at.clone()),
        };
        state.cart.push(item.clone());
        Ok(item)
    }

    /// # Errors
    ///
    /// 404 for an unknown item, or the injected fault.
    pub fn update_cart_item(&self, item: &CartItem) -> Result<CartItem, Fault> {
        let mut state = self.lock();
        Self::begin(&mut state, Call::UpdateCartItem(item.id.clone(), item.quantity))?;
        let stored = state
            .cart
            .iter_mut()
            .find(|existing| existing.id == item.id)
            .ok_or(Fault::Status(404))?;
        stored.quantity = item.quantity;
        Ok(stored.clone())
    }

    /// # Errors
    ///
    /// 404 for an unknown item, or the injected fault.
    pub fn delete_cart_item(&self, id: &CartItemId) -> Result<(), Fault> {
        let mut state = self.lock();
        Self::begin(&mut state, Call::DeleteCartItem(id.clone()))?;
        let before = state.cart.len();
        state.cart.retain(|item| &item.id != id);
        if state.cart.len() == before {
            return Err(Fault::Status(404));
        }
        Ok(())
    }

    /// # Errors
    ///
    /// 404 when bulk clear is disabled, or the injected fault.
    pub fn clear_cart(&self, user_id: &UserId) -> Result<(), Fault> {
        let mut state = self.lock();
        Self::begin(&mut state, Call::ClearCart(user_id.clone()))?;
        if state.bulk_clear_unsupported {
            return Err(Fault::Status(404));
        }
        state.cart.retain(|item| &item.user_id != user_id);
        Ok(())
    }

    /// # Errors
    ///
    /// Returns the injected fault, if any.
    pub fn create_order(&self, order: &NewOrder) -> Result<Order, Fault> {
        let mut state = self.lock();
        Self::begin(&mut state, Call::CreateOrder(order.user_id.clone()))?;
        let order = Order {
            id: OrderId::new(new_id("order")),
            user_id: order.user_id.clone(),
            products: order.products.clone(),
            shipping_address: order.shipping_address.clone(),
            total: order.total,
            date: order.date.clone(),
            status: order.status.clone(),
        };
        state.orders.push(order.clone());
        Ok(order)
    }

    /// # Errors
    ///
    /// Returns the injected fault, if any.
    pub fn user_orders(&self, user_id: &UserId) -> Result<Vec<Order>, Fault> {
        let mut state = self.lock();
        Self::begin(&mut state, Call::UserOrders(user_id.clone()))?;
        Ok(state
            .orders
            .iter()
            .filter(|o| &o.user_id == user_id)
            .cloned()
            .collect())
    }

    /// # Errors
    ///
    /// Returns the injected fault, if any.
    pub fn orders(&self) -> Result<Vec<Order>, Fault> {
        let mut state = self.lock();
        Self::begin(&mut state, Call::Orders)?;
        Ok(state.orders.clone())
    }

    /// Cancel a pending order. Non-pending orders are declined with
    /// `success: false`.
    ///
    /// # Errors
    ///
    /// 404 for an unknown order, or the injected fault.
    pub fn cancel_order(&self, id: &OrderId) -> Result<ApiResponse, Fault> {
        let mut state = self.lock();
        Self::begin(&mut state, Call::CancelOrder(id.clone()))?;
        let order = state
            .orders
            .iter_mut()
            .find(|o| &o.id == id)
            .ok_or(Fault::Status(404))?;
        if order.status != OrderStatus::Pending {
            return Ok(ApiResponse {
                success: false,
                message: Some(format!("Order is {}", order.status)),
            });
        }
        order.status = OrderStatus::Cancelled;
        Ok(ApiResponse {
            success: true,
            message: None,
        })
    }

    /// Copy an order's lines into a new pending order.
    ///
    /// # Errors
    ///
    /// 404 for an unknown order, 409 if a product left the catalog, or the
    /// injected fault.
    pub fn reorder(&self, id: &OrderId) -> Result<Order, Fault> {
        let mut state = self.lock();
        Self::begin(&mut state, Call::Reorder(id.clone()))?;
        let original = state
            .orders
            .iter()
            .find(|o| &o.id == id)
            .cloned()
            .ok_or(Fault::Status(404))?;
        let available = original
            .products
            .iter()
            .all(|line| state.products.iter().any(|p| p.id == line.product_id));
        if !available {
            return Err(Fault::Status(409));
        }
        let order = Order {
            id: OrderId::new(new_id("order")),
            date: Timestamp::now(),
            status: OrderStatus::Pending,
            ..original
        };
        state.orders.push(order.clone());
        Ok(order)
    }
}

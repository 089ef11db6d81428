//! Property tests: after any sequence of cart operations, successful or
//! rejected, the local snapshot matches the server cart and its derived
//! values match its lines.

use pocketshop_core::{CartItem, Product};
use pocketshop_integration_tests::fixtures::product;
use pocketshop_integration_tests::{Endpoint, Fault, Harness};
use proptest::prelude::*;
use rust_decimal::Decimal;

#[derive(Debug, Clone)]
enum Op {
    Add { product: usize, quantity: u32 },
    Set { product: usize, quantity: i64 },
    Remove { product: usize },
    Clear { bulk: bool },
    Load,
}

#[derive(Debug, Clone)]
struct Step {
    op: Op,
    /// Make the server reject this step.
    reject: bool,
}

fn catalog() -> Vec<Product> {
    vec![
        product("p0", 1999),
        product("p1", 10),
        product("p2", 37_900),
        product("p3", 250),
    ]
}

fn op_strategy() -> impl Strategy<Value = Op> {
    prop_oneof![
        4 => (0..4usize, 1..5u32).prop_map(|(product, quantity)| Op::Add { product, quantity }),
        2 => (0..4usize, -1..6i64).prop_map(|(product, quantity)| Op::Set { product, quantity }),
        1 => (0..4usize).prop_map(|product| Op::Remove { product }),
        1 => any::<bool>().prop_map(|bulk| Op::Clear { bulk }),
        1 => Just(Op::Load),
    ]
}

fn step_strategy() -> impl Strategy<Value = Step> {
    (op_strategy(), prop::bool::weighted(0.2)).prop_map(|(op, reject)| Step { op, reject })
}

fn sorted(mut items: Vec<CartItem>) -> Vec<CartItem> {
    items.sort_by(|a, b| a.id.as_str().cmp(b.id.as_str()));
    items
}

async fn run(steps: Vec<Step>) -> Result<(), TestCaseError> {
    let h = Harness::logged_in();
    let products = catalog();
    let cart = h.state.cart();

    for step in steps {
        let rejected_endpoints: &[Endpoint] = match &step.op {
            Op::Add { .. } => &[Endpoint::CreateCartItem, Endpoint::UpdateCartItem],
            Op::Set { .. } => &[Endpoint::UpdateCartItem, Endpoint::DeleteCartItem],
            Op::Remove { .. } => &[Endpoint::DeleteCartItem],
            // Bulk endpoint only, so the item-by-item fallback still runs
            Op::Clear { .. } => &[Endpoint::ClearCart],
            Op::Load => &[Endpoint::Cart],
        };
        if step.reject {
            for endpoint in rejected_endpoints {
                h.backend.fail(*endpoint, Fault::Status(500));
            }
        }

        let line_for = |index: usize| {
            let snapshot = cart.snapshot();
            products
                .get(index)
                .and_then(|p| snapshot.find_product(&p.id).map(|item| item.id.clone()))
        };

        let _ = match &step.op {
            Op::Add { product, quantity } => match products.get(*product) {
                Some(p) => cart.add(p, *quantity).await.map(|_| ()),
                None => Ok(()),
            },
            Op::Set { product, quantity } => match line_for(*product) {
                Some(id) => cart.update_quantity(&id, *quantity).await,
                None => Ok(()),
            },
            Op::Remove { product } => match line_for(*product) {
                Some(id) => cart.remove(&id).await,
                None => Ok(()),
            },
            Op::Clear { bulk } => {
                if !bulk {
                    h.backend.disable_bulk_clear();
                }
                cart.clear().await
            }
            Op::Load => cart.load().await,
        };
        h.backend.clear_faults();

        let snapshot = cart.snapshot();
        prop_assert_eq!(
            sorted(snapshot.items().to_vec()),
            sorted(h.backend.cart_of(&h.user.id)),
            "after {:?}",
            step
        );

        let mut seen = std::collections::HashSet::new();
        for item in snapshot.items() {
            prop_assert!(seen.insert(item.product.id.clone()), "duplicate line for {}", item.product.id);
        }
        let total: Decimal = snapshot
            .items()
            .iter()
            .map(|item| item.product.price * Decimal::from(item.quantity))
            .sum();
        let count: u64 = snapshot.items().iter().map(|item| u64::from(item.quantity)).sum();
        prop_assert_eq!(cart.total(), total);
        prop_assert_eq!(cart.item_count(), count);
    }
    Ok(())
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(64))]

    #[test]
    fn prop_snapshot_tracks_server_cart(steps in prop::collection::vec(step_strategy(), 1..30)) {
        let runtime = tokio::runtime::Builder::new_current_thread()
            .enable_all()
            .build()
            .expect("runtime");
        runtime.block_on(run(steps))?;
    }
}

//! Exhaustive checks of the order status state machine through the
//! aggregate.

use common::CustomerId;
use domain::{Currency, DomainError, Money, Order, OrderItem, OrderStatus};

fn order_in(status: OrderStatus) -> Order {
    let mut order = Order::new(
        CustomerId::new(),
        "Alice Souza",
        "alice@example.com",
        vec![OrderItem::new(
            "SKU-001",
            "Widget",
            1,
            Money::from_cents(4600, Currency::BRL).unwrap(),
        )],
    )
    .unwrap();

    match status {
        OrderStatus::Pending => {}
        OrderStatus::PaymentPending => {
            order.attach_payment_id("PAY-0001").unwrap();
            order.transition(OrderStatus::PaymentPending).unwrap();
        }
        OrderStatus::Paid => order.mark_as_paid("PAY-0001").unwrap(),
        OrderStatus::PaymentFailed => order.mark_as_payment_failed().unwrap(),
        OrderStatus::Canceled => order.cancel().unwrap(),
    }
    order
}

#[test]
fn every_status_pair_matches_the_transition_table() {
    for from in OrderStatus::ALL {
        for to in OrderStatus::ALL {
            let mut order = order_in(from);
            let before = order.updated_at;
            let result = order.transition(to);

            if from.can_transition_to(to) {
                assert!(
                    result.is_ok(),
                    "{from} -> {to} should be allowed"
                );
                assert_eq!(order.status, to);
                assert!(order.updated_at >= before);
            } else {
                match result {
                    Err(DomainError::InvalidTransition {
                        from: got_from,
                        to: got_to,
                        allowed,
                    }) => {
                        assert_eq!(got_from, from);
                        assert_eq!(got_to, to);
                        assert_eq!(allowed, from.allowed_transitions());
                    }
                    other => panic!("{from} -> {to} should be rejected, got {other:?}"),
                }
                // A rejected transition leaves the order untouched.
                assert_eq!(order.status, from);
                assert_eq!(order.updated_at, before);
            }
        }
    }
}

#[test]
fn reachable_statuses_cover_the_whole_machine() {
    for status in OrderStatus::ALL {
        assert_eq!(order_in(status).status, status);
    }
}

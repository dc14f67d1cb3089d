// Integration tests for protocol message serialization
use mostro_client::message::{Action, Content, Message, PaymentRequest};
use mostro_client::order::{Order, OrderKind, Status};
use serde_json::json;
use std::str::FromStr;

fn sample_order() -> Order {
    Order {
        kind: Some(OrderKind::Buy),
        amount: 0,
        fiat_code: "USD".to_string(),
        fiat_amount: 100,
        payment_method: "bank transfer".to_string(),
        status: Some(Status::Pending),
        ..Default::default()
    }
}

#[test]
fn test_new_order_payload_shape() {
    let message = Message::new_order(
        None,
        Some(0),
        Action::NewOrder,
        Some(Content::Order {
            order: sample_order(),
        }),
    );
    let value = serde_json::to_value(&message).unwrap();

    assert_eq!(value["order"]["version"], 1);
    assert_eq!(value["order"]["request_id"], 0);
    assert_eq!(value["order"]["action"], "new-order");
    assert_eq!(value["order"]["content"]["order"]["fiat_code"], "USD");
    assert_eq!(value["order"]["content"]["order"]["fiat_amount"], 100);
    // No order id yet, and created_at is not sent on submissions.
    assert!(value["order"].get("id").is_none());
    assert!(value["order"].get("created_at").is_none());
}

#[test]
fn test_take_sell_with_amount() {
    let message = Message::new_order(
        Some("o1".to_string()),
        Some(3),
        Action::TakeSell,
        Some(Content::Amount { amount: 50000 }),
    );
    let value = serde_json::to_value(&message).unwrap();

    assert_eq!(value["order"]["action"], "take-sell");
    assert_eq!(value["order"]["id"], "o1");
    assert_eq!(value["order"]["content"], json!({ "amount": 50000 }));
}

#[test]
fn test_take_sell_without_amount_has_null_content() {
    let message = Message::new_order(Some("o1".to_string()), Some(4), Action::TakeSell, None);
    let value = serde_json::to_value(&message).unwrap();

    assert!(value["order"]["content"].is_null());
}

#[test]
fn test_payment_request_without_amount_is_two_elements() {
    let content = Content::PaymentRequest {
        payment_request: PaymentRequest {
            order: None,
            invoice: "lnbc1invoice".to_string(),
            amount: None,
        },
    };
    let value = serde_json::to_value(&content).unwrap();

    assert_eq!(value, json!({ "payment_request": [null, "lnbc1invoice"] }));
}

#[test]
fn test_payment_request_with_amount_is_three_elements() {
    let content = Content::PaymentRequest {
        payment_request: PaymentRequest {
            order: None,
            invoice: "lnbc1invoice".to_string(),
            amount: Some(7000),
        },
    };
    let value = serde_json::to_value(&content).unwrap();

    assert_eq!(
        value,
        json!({ "payment_request": [null, "lnbc1invoice", 7000] })
    );
}

#[test]
fn test_payment_request_parses_both_arities() {
    let two: Content =
        serde_json::from_value(json!({ "payment_request": [null, "lnbc1"] })).unwrap();
    let three: Content =
        serde_json::from_value(json!({ "payment_request": [null, "lnbc1", 42] })).unwrap();

    match two {
        Content::PaymentRequest { payment_request } => {
            assert_eq!(payment_request.invoice, "lnbc1");
            assert_eq!(payment_request.amount, None);
        }
        other => panic!("unexpected content: {other:?}"),
    }
    match three {
        Content::PaymentRequest { payment_request } => {
            assert_eq!(payment_request.amount, Some(42));
        }
        other => panic!("unexpected content: {other:?}"),
    }
}

#[test]
fn test_inbound_reply_parses() {
    let json = r#"{"order":{"version":1,"id":"abc","request_id":0,"action":"new-order","created_at":1700000000}}"#;
    let message = Message::from_json(json).unwrap();

    assert_eq!(message.request_id(), Some(0));
    assert_eq!(message.order_id(), Some("abc"));
    assert_eq!(message.action(), &Action::NewOrder);
    match &message {
        Message::Order(kind) => {
            assert!(kind.content.is_none());
            assert_eq!(kind.created_at, Some(1700000000));
        }
        other => panic!("unexpected message: {other:?}"),
    }
}

#[test]
fn test_cant_do_reply_surfaces_refusal_text() {
    let json = r#"{"cant-do":{"version":1,"id":"o1","request_id":5,"pubkey":"00aabbcc","action":"cant-do","content":{"text_message":"Out of range sats amount"}}}"#;
    let message = Message::from_json(json).unwrap();

    assert_eq!(message.request_id(), Some(5));
    assert_eq!(message.action(), &Action::CantDo);
    assert_eq!(message.refusal_text(), Some("Out of range sats amount"));
    match &message {
        Message::CantDo(kind) => assert_eq!(kind.pubkey, "00aabbcc"),
        other => panic!("unexpected message: {other:?}"),
    }
}

#[test]
fn test_cant_do_without_pubkey_is_malformed() {
    let json = r#"{"cant-do":{"version":1,"id":"o1","request_id":5,"action":"cant-do","content":{"text_message":"nope"}}}"#;
    assert!(Message::from_json(json).is_err());
}

#[test]
fn test_unknown_action_is_not_fatal() {
    let json = r#"{"order":{"version":1,"action":"quantum-settle","content":null}}"#;
    let message = Message::from_json(json).unwrap();

    assert_eq!(
        message.action(),
        &Action::Unknown("quantum-settle".to_string())
    );
    // And it round-trips without losing the action name.
    let value = serde_json::to_value(&message).unwrap();
    assert_eq!(value["order"]["action"], "quantum-settle");
}

#[test]
fn test_rating_travels_as_bare_number() {
    let content = Content::RatingUser { rating_user: 5 };
    assert_eq!(
        serde_json::to_value(&content).unwrap(),
        json!({ "rating_user": 5 })
    );

    let parsed: Content = serde_json::from_value(json!({ "rating_user": 3 })).unwrap();
    assert_eq!(parsed, Content::RatingUser { rating_user: 3 });
}

#[test]
fn test_action_string_round_trip() {
    for (action, wire) in [
        (Action::WaitingSellerToPay, "waiting-seller-to-pay"),
        (
            Action::CooperativeCancelInitiatedByPeer,
            "cooperative-cancel-initiated-by-peer",
        ),
        (Action::HoldInvoicePaymentSettled, "hold-invoice-payment-settled"),
        (Action::FiatSentOk, "fiat-sent-ok"),
    ] {
        assert_eq!(action.to_string(), wire);
        assert_eq!(Action::from_str(wire).unwrap(), action);
    }
}

#[test]
fn test_unrecognized_content_shape_falls_back_to_raw() {
    let parsed: Content =
        serde_json::from_value(json!({ "next_trade": ["pubkey", 7] })).unwrap();
    assert!(matches!(parsed, Content::Raw(_)));
}

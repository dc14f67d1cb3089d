// Trade actions: build the payload, wrap it, publish, await the reply
use nostr_sdk::prelude::*;

use super::{MostroClient, REQUEST_TIMEOUT};
use crate::crypto;
use crate::error::{Result, ServiceError};
use crate::giftwrap;
use crate::keys::UserKeys;
use crate::message::{Action, Content, Message, PaymentRequest};
use crate::order::Order;

impl MostroClient {
    fn current_keys(&self) -> Result<UserKeys> {
        self.keys
            .read()
            .expect("keys lock poisoned")
            .clone()
            .ok_or(ServiceError::KeyNotSet)
    }

    /// Common path for every trade action: allocate a request id, build
    /// the message, gift-wrap it to Mostro, publish, await the reply.
    ///
    /// A `cant-do` refusal resolves the returned message normally; only
    /// transport problems and timeouts are errors.
    async fn request(
        &self,
        action: Action,
        order_id: Option<String>,
        content: Option<Content>,
    ) -> Result<Message> {
        let user = self.current_keys()?;
        let mostro = self.mostro_pubkey.ok_or(ServiceError::MostroPubkeyNotSet)?;

        let (request_id, reply) = self.correlator.begin_request(REQUEST_TIMEOUT);
        let message = Message::new_order(order_id, Some(request_id), action, content);
        let wrap = giftwrap::wrap(&message.as_json()?, user.keys(), &mostro)?;

        if self.debug {
            log::debug!("publishing request {request_id} ({})", message.action());
        }
        self.gateway.publish(&wrap).await?;
        reply.recv().await
    }

    /// Publish a new order. Defaults are filled and amounts validated
    /// before anything is sent.
    pub async fn submit_order(&self, mut order: Order) -> Result<Message> {
        order.normalize()?;
        self.request(Action::NewOrder, None, Some(Content::Order { order }))
            .await
    }

    /// Take a sell order, optionally picking an amount within a range.
    pub async fn take_sell(&self, order: &Order, amount: Option<i64>) -> Result<Message> {
        self.request(
            Action::TakeSell,
            Some(required_id(order)?),
            amount.map(|amount| Content::Amount { amount }),
        )
        .await
    }

    /// Take a buy order, optionally picking an amount within a range.
    pub async fn take_buy(&self, order: &Order, amount: Option<i64>) -> Result<Message> {
        self.request(
            Action::TakeBuy,
            Some(required_id(order)?),
            amount.map(|amount| Content::Amount { amount }),
        )
        .await
    }

    /// Hand Mostro the invoice to be paid out on release. The invoice is
    /// passed through untouched; validation is the server's concern.
    pub async fn add_invoice(
        &self,
        order: &Order,
        invoice: &str,
        amount: Option<i64>,
    ) -> Result<Message> {
        let payment_request = PaymentRequest {
            order: None,
            invoice: invoice.to_string(),
            amount,
        };
        self.request(
            Action::AddInvoice,
            Some(required_id(order)?),
            Some(Content::PaymentRequest { payment_request }),
        )
        .await
    }

    /// Release the held satoshis to the buyer.
    pub async fn release(&self, order: &Order) -> Result<Message> {
        self.request(Action::Release, Some(required_id(order)?), None)
            .await
    }

    /// Tell Mostro the fiat payment went out.
    pub async fn fiat_sent(&self, order: &Order) -> Result<Message> {
        self.request(Action::FiatSent, Some(required_id(order)?), None)
            .await
    }

    /// Cancel the order.
    pub async fn cancel(&self, order: &Order) -> Result<Message> {
        self.request(Action::Cancel, Some(required_id(order)?), None)
            .await
    }

    /// Open a dispute on the order.
    pub async fn dispute(&self, order: &Order) -> Result<Message> {
        self.request(Action::Dispute, Some(required_id(order)?), None)
            .await
    }

    /// Rate the counterparty after a finished trade. The wire carries
    /// the bare number.
    pub async fn rate_user(&self, order: &Order, rating: u8) -> Result<Message> {
        self.request(
            Action::RateUser,
            Some(required_id(order)?),
            Some(Content::RatingUser {
                rating_user: rating,
            }),
        )
        .await
    }

    /// Out-of-band encrypted message to a counterparty peer over the
    /// legacy kind-4 channel. Not correlated with any reply.
    pub async fn send_dm(&self, peer: &PublicKey, text: &str) -> Result<()> {
        let user = self.current_keys()?;
        let ciphertext = crypto::encrypt_nip04(text, user.keys(), peer)?;
        let event = crypto::sign_event(
            EventBuilder::new(Kind::EncryptedDirectMessage, ciphertext)
                .tag(Tag::public_key(*peer)),
            user.keys(),
        )?;
        self.gateway.publish(&event).await?;
        Ok(())
    }
}

fn required_id(order: &Order) -> Result<String> {
    order.id.clone().ok_or(ServiceError::MissingOrderId)
}

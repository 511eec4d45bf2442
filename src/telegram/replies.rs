//! User- and approver-facing texts.

use crate::config::PaymentConfig;
use crate::core::engine::Reply;
use crate::core::gateway::{Decision, DecisionOutcome};
use crate::core::traits::PhotoAudit;
use crate::infrastructure::entities::Payment;
use chrono::Utc;

pub fn render(reply: &Reply, payment: &PaymentConfig) -> String {
    let price = payment.price_inr;

    match reply {
        Reply::Welcome => format!(
            "💝 Welcome to the Valentine Proposal Generator!\n\n\
             I'll help you create a magical, interactive proposal page that your special someone can't say no to 😏\n\n\
             Use /pay to make the payment (₹{price})\n\
             Then use /create to build your proposal!\n\n\
             How it works:\n\
             1️⃣ Pay ₹{price} via UPI\n\
             2️⃣ Send payment screenshot\n\
             3️⃣ Once approved, use /create\n\
             4️⃣ Get your unique love link! 💌"
        ),
        Reply::Help => "💝 Valentine Proposal Bot — Commands:\n\n\
             /start  — Welcome message\n\
             /pay    — Pay for a proposal link\n\
             /create — Create a new proposal link\n\
             /help   — Show this help\n\n\
             Just follow the steps after /create!"
            .to_owned(),
        Reply::PaymentInstructions => format!(
            "💰 Payment Required\n\n\
             To create your Valentine proposal, pay ₹{price} via UPI:\n\n\
             📲 UPI ID: {upi}\n\
             💵 Amount: ₹{price}\n\
             🔗 {link}\n\n\
             After paying, send a screenshot of the payment here.\n\
             Your access will be approved within minutes! ⚡\n\n\
             💡 How to pay:\n\
             1. Open any UPI app (PhonePe, Google Pay, Paytm, etc.)\n\
             2. Choose \"Send Money\" or \"Pay\"\n\
             3. Enter the UPI ID above\n\
             4. Enter amount ₹{price}\n\
             5. Complete payment and send screenshot here",
            upi = payment.upi_id,
            link = payment.upi_link(),
        ),
        Reply::AlreadyApproved => "✅ You already have an approved payment!\n\n\
             Use /create to build your Valentine proposal 💝"
            .to_owned(),
        Reply::PaymentPending => "⏳ Your payment is pending approval.\n\
             You'll be notified once it's verified! Hang tight 💕"
            .to_owned(),
        Reply::PaymentRequired => format!(
            "🔒 Payment required to create a proposal.\n\n\
             Pay ₹{price} via UPI and send a screenshot.\n\
             Use /pay to get started!"
        ),
        Reply::SendScreenshot => {
            "📷 Please send the payment screenshot as a photo.".to_owned()
        }
        Reply::ScreenshotReceived => "📩 Payment screenshot received!\n\n\
             ⏳ Our admin will verify it shortly.\n\
             You'll get a notification once approved ✅\n\n\
             This usually takes just a few minutes! 💕"
            .to_owned(),
        Reply::ScreenshotFailed => {
            "⚠️ Failed to process the screenshot. Please try sending it again later.".to_owned()
        }
        Reply::AskName => "💕 Let's create your Valentine proposal!\n\n\
             Step 1/3: What is your Valentine's name?"
            .to_owned(),
        Reply::NameRequired => "✏️ Please type your Valentine's name.".to_owned(),
        Reply::AskPhoto { name } => format!(
            "✨ Great! The proposal will be for \"{name}\"\n\n\
             Step 2/3: Send me a photo to display on the page,\n\
             or type \"skip\" to skip the photo."
        ),
        Reply::PhotoOrSkip => {
            "📷 Please send a photo image, or type \"skip\" to continue without one.".to_owned()
        }
        Reply::PhotoFailed => {
            "⚠️ Failed to process the photo. Please try again or type \"skip\".".to_owned()
        }
        Reply::AskExpiry { photo_saved } => {
            let lead = if *photo_saved {
                "📸 Beautiful photo saved!"
            } else {
                "📸 No photo — no problem! I'll use beautiful animations instead."
            };
            format!(
                "{lead}\n\n\
                 Step 3/3: How many hours should this link stay active?\n\
                 (Enter a number, e.g. 24 for 24 hours, or 0 for no expiry)"
            )
        }
        Reply::InvalidExpiry => {
            "⚠️ Please enter a valid number of hours (e.g. 24, 48, or 0 for no expiry).".to_owned()
        }
        Reply::ProposalReady {
            name,
            has_photo,
            hours,
            link,
        } => format!(
            "🎉 Your Valentine proposal is ready!\n\n\
             👤 Name: {name}\n\
             📸 Photo: {photo}\n\
             {expiry}\n\n\
             💌 Your love link:\n{link}\n\n\
             Send this link to your special someone! 💝\n\
             They won't be able to say no 😏",
            photo = if *has_photo {
                "Yes"
            } else {
                "None (animated fallback)"
            },
            expiry = expiry_text(*hours),
        ),
        Reply::TryAgainLater => "⚠️ Something went wrong. Please try again later.".to_owned(),
    }
}

fn expiry_text(hours: f64) -> String {
    if hours == 0.0 {
        return "♾️ No expiry — this love lasts forever!".to_owned();
    }
    let plural = if hours == 1.0 { "" } else { "s" };
    format!("⏳ Expires in {hours} hour{plural}")
}

/// Message sent to the payment owner once the approver decided.
pub fn decision_notice(decision: Decision, payment: &PaymentConfig) -> String {
    match decision {
        Decision::Approve => "✅ Payment approved!\n\n\
             You can now use /create to build your Valentine proposal 💝"
            .to_owned(),
        Decision::Reject => format!(
            "❌ Payment was not verified. Please send a valid screenshot after paying ₹{} to UPI ID: {}\n\n\
             Use /pay to try again.",
            payment.price_inr, payment.upi_id
        ),
    }
}

/// Answer shown to the approver after pressing a button.
pub fn decision_ack(outcome: &DecisionOutcome, decision: Decision) -> String {
    match (outcome, decision) {
        (DecisionOutcome::Applied(_), Decision::Approve) => "✅ Approved!".to_owned(),
        (DecisionOutcome::Applied(_), Decision::Reject) => "❌ Rejected".to_owned(),
        (DecisionOutcome::AlreadyResolved(status), _) => format!("Already {status}"),
        (DecisionOutcome::NotFound, _) => "❌ Payment not found".to_owned(),
        (DecisionOutcome::Superseded, _) => {
            "This chat already has an unused approved payment".to_owned()
        }
    }
}

/// Suffix appended to the approver's screenshot caption.
pub fn decision_stamp(decision: Decision) -> &'static str {
    match decision {
        Decision::Approve => "✅ APPROVED",
        Decision::Reject => "❌ REJECTED",
    }
}

pub fn payment_caption(payment: &Payment, config: &PaymentConfig) -> String {
    format!(
        "💰 Payment Screenshot\n\
         💵 Amount: ₹{}\n\
         👥 From: {}\n\
         🆔 Payment ID: {}\n\
         📅 {}",
        config.price_inr,
        payment.requester_label(),
        payment.id,
        Utc::now().format("%Y-%m-%d %H:%M UTC"),
    )
}

pub fn audit_caption(audit: &PhotoAudit) -> String {
    format!(
        "📸 New photo uploaded\n\
         👤 For: {}\n\
         👥 By: {}\n\
         📅 {}",
        audit.recipient_name,
        audit.requester,
        Utc::now().format("%Y-%m-%d %H:%M UTC"),
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::infrastructure::entities::PaymentStatus;
    use uuid::Uuid;

    fn config() -> PaymentConfig {
        PaymentConfig {
            upi_id: "someone@bank".into(),
            price_inr: 30,
        }
    }

    #[test]
    fn test_payment_instructions_mention_payee_and_price() {
        let text = render(&Reply::PaymentInstructions, &config());
        assert!(text.contains("someone@bank"));
        assert!(text.contains("₹30"));
        assert!(text.contains("upi://pay?pa=someone@bank"));
    }

    #[test]
    fn test_proposal_ready_contains_link() {
        let text = render(
            &Reply::ProposalReady {
                name: "Riya".into(),
                has_photo: false,
                hours: 24.0,
                link: "https://example.com/?id=abc".into(),
            },
            &config(),
        );
        assert!(text.contains("Riya"));
        assert!(text.contains("https://example.com/?id=abc"));
        assert!(text.contains("Expires in 24 hours"));
        assert!(text.contains("animated fallback"));
    }

    #[test]
    fn test_expiry_text() {
        assert!(expiry_text(0.0).contains("No expiry"));
        assert_eq!(expiry_text(1.0), "⏳ Expires in 1 hour");
        assert_eq!(expiry_text(1.5), "⏳ Expires in 1.5 hours");
    }

    #[test]
    fn test_decision_texts() {
        assert!(decision_notice(Decision::Approve, &config()).contains("/create"));
        let rejected = decision_notice(Decision::Reject, &config());
        assert!(rejected.contains("/pay"));
        assert!(rejected.contains("someone@bank"));

        assert_eq!(
            decision_ack(
                &DecisionOutcome::AlreadyResolved(PaymentStatus::Approved),
                Decision::Reject
            ),
            "Already approved"
        );
        assert_eq!(
            decision_ack(&DecisionOutcome::NotFound, Decision::Approve),
            "❌ Payment not found"
        );
    }

    #[test]
    fn test_payment_caption_identifies_payment() {
        let payment = Payment {
            id: Uuid::new_v4(),
            chat_id: 1,
            user_id: 2,
            username: Some("romeo".into()),
            first_name: None,
            status: PaymentStatus::Pending,
            created_at: Utc::now(),
        };
        let caption = payment_caption(&payment, &config());
        assert!(caption.contains(&payment.id.to_string()));
        assert!(caption.contains("@romeo"));
    }
}

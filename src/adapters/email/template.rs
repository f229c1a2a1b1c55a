//! Fulfillment email content.

use crate::ports::FulfillmentEmail;

/// Rendered subject, plain-text, and HTML bodies for one fulfillment email.
pub struct FulfillmentEmailContent {
    pub subject: String,
    pub text: String,
    pub html: String,
}

impl FulfillmentEmailContent {
    /// Renders the email for the given fulfillment.
    pub fn new(email: &FulfillmentEmail) -> Self {
        let batch_display = capitalize(&email.batch_name);
        let subject = format!(
            "Welcome to CourseGate - Your {} Batch Access",
            batch_display
        );

        let text = format!(
            "Hi {name},\n\n\
             Your payment is confirmed and your seat in the {batch} batch is \
             reserved.\n\n\
             Join your private group here (single-use link):\n{link}\n\n\
             Payment reference: {payment_id}\n\n\
             This link admits one member and stops working after you join. \
             If you run into any trouble, reply to this email.\n\n\
             - The CourseGate Team\n",
            name = email.user_name,
            batch = batch_display,
            link = email.invite_link,
            payment_id = email.provider_payment_id,
        );

        let html = format!(
            r#"<!DOCTYPE html>
<html>
  <body style="margin:0;padding:0;background-color:#f4f5f7;font-family:Arial,Helvetica,sans-serif;">
    <table role="presentation" width="100%" cellpadding="0" cellspacing="0">
      <tr>
        <td align="center" style="padding:32px 16px;">
          <table role="presentation" width="560" cellpadding="0" cellspacing="0" style="background:#ffffff;border-radius:8px;overflow:hidden;">
            <tr>
              <td style="background:#1a1f36;padding:24px 32px;">
                <h1 style="margin:0;color:#ffffff;font-size:20px;">CourseGate</h1>
              </td>
            </tr>
            <tr>
              <td style="padding:32px;">
                <h2 style="margin:0 0 16px;color:#1a1f36;font-size:18px;">Hi {name},</h2>
                <p style="margin:0 0 16px;color:#42526e;font-size:14px;line-height:1.6;">
                  Your payment is confirmed and your seat in the
                  <strong>{batch}</strong> batch is reserved.
                </p>
                <p style="margin:0 0 24px;" align="center">
                  <a href="{link}" style="display:inline-block;background:#2563eb;color:#ffffff;text-decoration:none;padding:12px 28px;border-radius:6px;font-size:14px;">
                    Join your private group
                  </a>
                </p>
                <p style="margin:0 0 16px;color:#42526e;font-size:13px;line-height:1.6;">
                  This link admits one member and stops working after you join.
                  If the button does not work, copy this address into your
                  browser:<br>
                  <a href="{link}" style="color:#2563eb;word-break:break-all;">{link}</a>
                </p>
                <p style="margin:0;color:#8993a4;font-size:12px;">
                  Payment reference: {payment_id}
                </p>
              </td>
            </tr>
            <tr>
              <td style="background:#f4f5f7;padding:16px 32px;">
                <p style="margin:0;color:#8993a4;font-size:12px;">
                  Questions? Just reply to this email.
                </p>
              </td>
            </tr>
          </table>
        </td>
      </tr>
    </table>
  </body>
</html>"#,
            name = email.user_name,
            batch = batch_display,
            link = email.invite_link,
            payment_id = email.provider_payment_id,
        );

        Self {
            subject,
            text,
            html,
        }
    }
}

fn capitalize(s: &str) -> String {
    let mut chars = s.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().collect::<String>() + chars.as_str(),
        None => String::new(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn test_email() -> FulfillmentEmail {
        FulfillmentEmail {
            to: "a@x.com".to_string(),
            user_name: "Asha".to_string(),
            batch_name: "morning".to_string(),
            invite_link: "https://t.me/+abc".to_string(),
            provider_payment_id: "pay_123".to_string(),
        }
    }

    #[test]
    fn subject_carries_capitalized_batch() {
        let content = FulfillmentEmailContent::new(&test_email());
        assert_eq!(
            content.subject,
            "Welcome to CourseGate - Your Morning Batch Access"
        );
    }

    #[test]
    fn both_bodies_carry_link_and_reference() {
        let content = FulfillmentEmailContent::new(&test_email());
        assert!(content.text.contains("https://t.me/+abc"));
        assert!(content.text.contains("pay_123"));
        assert!(content.html.contains("https://t.me/+abc"));
        assert!(content.html.contains("pay_123"));
        assert!(content.html.contains("Asha"));
    }

    #[test]
    fn capitalize_handles_empty_string() {
        assert_eq!(capitalize(""), "");
        assert_eq!(capitalize("evening"), "Evening");
    }
}

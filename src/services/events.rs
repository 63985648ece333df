use chrono::Utc;

use crate::models::User;
use crate::services::messaging::telegram::escape_html;
use crate::services::otp;
use crate::state::AppState;

pub fn registration_message(user_id: &str, user: &User) -> String {
    format!(
        "🆕 New user registered!\n\n\
         👤 Name: {} {}\n\
         📱 Phone: {}\n\
         🆔 Telegram ID: {}\n\
         🔑 User ID: {}",
        escape_html(&user.first_name),
        escape_html(&user.last_name),
        escape_html(&user.phone_number),
        user.telegram_id,
        escape_html(user_id),
    )
}

/// Runs after a user document is written. Every step is best effort: the
/// user already exists whether or not these succeed. The code is stored
/// before any network call.
pub async fn on_user_created(state: &AppState, user_id: &str, user: &User) {
    tracing::info!(user_id, first_name = %user.first_name, "new user created");

    let issued = state
        .db()
        .map_err(anyhow::Error::from)
        .and_then(|db| otp::issue(&db, user_id, Utc::now()));

    match state.chat.notify(&registration_message(user_id, user)).await {
        Ok(()) => tracing::info!(user_id, "registration notification sent"),
        Err(e) => tracing::error!(user_id, error = %e, "failed to send registration notification"),
    }

    let code = match issued {
        Ok(otp) => otp.otp_code,
        Err(e) => {
            tracing::error!(user_id, error = %e, "failed to create otp for new user");
            return;
        }
    };

    match state.sms.send_sms(&user.phone_number, &otp::sms_text(&code)).await {
        Ok(true) => tracing::info!(user_id, "otp sms sent"),
        Ok(false) => tracing::warn!(user_id, "sms provider not configured, otp not sent"),
        Err(e) => tracing::error!(user_id, error = %e, "failed to send otp sms"),
    }
}

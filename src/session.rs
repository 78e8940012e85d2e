//! "Logged in as" banner

use crate::api::{Backend, UserLookup};
use crate::console_error;
use crate::view::Notices;

/// Look up the session user and show the banner. A 401 is not an error here:
/// the page simply shows no banner.
pub async fn show_current_user<B: Backend>(backend: &B, notices: &dyn Notices) -> Option<String> {
    match backend.current_user().await {
        Ok(UserLookup::User(username)) => {
            notices.show_user(&username);
            Some(username)
        }
        Ok(UserLookup::Anonymous) => None,
        Err(e) => {
            console_error!("[session] Error fetching username: {}", e);
            None
        }
    }
}

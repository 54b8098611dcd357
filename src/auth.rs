//! # Auth Gate
//!
//! Derives the expected authentication token for a request and compares it
//! against the supplied one. Ordinary callers are keyed on account + login +
//! a fixed shared secret; the administrative identity is keyed on the current
//! local clock hour + a fixed administrative secret.
//!
//! The admin token is hour-granular: any admin token computed within the
//! same clock hour stays valid for that whole hour.

use chrono::Local;
use sha2::{Digest, Sha512};

use crate::request::MethodRequest;

/// The shared secret mixed into ordinary callers' tokens.
pub const SALT: &str = "Otus";

/// The secret mixed into the administrative token.
pub const ADMIN_SALT: &str = "42";

/// The time format that buckets admin tokens by clock hour.
const ADMIN_TIME_FORMAT: &str = "%Y%m%d%H";

fn sha512_hex(input: &str) -> String {
    format!("{:x}", Sha512::digest(input.as_bytes()))
}

/// The token expected from an ordinary caller with the given identity.
///
/// Absent account or login are treated as empty strings, matching the
/// envelope's empty-sentinel defaults.
pub fn user_token(account: &str, login: &str) -> String {
    sha512_hex(&format!("{}{}{}", account, login, SALT))
}

/// The token expected from the administrative identity right now.
///
/// The wall clock is read exactly once per call; the result is valid for the
/// remainder of the current local clock hour.
pub fn admin_token_now() -> String {
    let bucket = Local::now().format(ADMIN_TIME_FORMAT).to_string();
    sha512_hex(&format!("{}{}", bucket, ADMIN_SALT))
}

/// Checks the envelope's token against the expected one.
///
/// Returns false on mismatch; never errors. Callers translate a false result
/// into a forbidden outcome, not an internal failure.
pub fn check_auth(request: &MethodRequest) -> bool {
    let expected = if request.is_admin() {
        admin_token_now()
    } else {
        user_token(request.account(), request.login())
    };
    expected == request.token()
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn envelope(account: &str, login: &str, token: &str) -> MethodRequest {
        let args = json!({
            "account": account,
            "login": login,
            "token": token,
            "arguments": {},
            "method": "online_score",
        });
        MethodRequest::from_args(args.as_object().unwrap())
    }

    #[test]
    fn user_token_is_account_login_salted() {
        let expected = sha512_hex(&format!("horns&hoofsh&f{}", SALT));
        assert_eq!(user_token("horns&hoofs", "h&f"), expected);
    }

    #[test]
    fn valid_user_token_passes() {
        let token = user_token("horns&hoofs", "h&f");
        assert!(check_auth(&envelope("horns&hoofs", "h&f", &token)));
    }

    #[test]
    fn wrong_user_token_fails() {
        assert!(!check_auth(&envelope("horns&hoofs", "h&f", "deadbeef")));
        assert!(!check_auth(&envelope("horns&hoofs", "h&f", "")));
        // A token derived for a different identity must not transfer.
        let other = user_token("horns&hoofs", "other");
        assert!(!check_auth(&envelope("horns&hoofs", "h&f", &other)));
    }

    #[test]
    fn token_comparison_is_case_sensitive() {
        let token = user_token("", "h&f").to_uppercase();
        assert!(!check_auth(&envelope("", "h&f", &token)));
    }

    #[test]
    fn admin_token_is_hour_bucketed() {
        let bucket = Local::now().format(ADMIN_TIME_FORMAT).to_string();
        let expected = sha512_hex(&format!("{}{}", bucket, ADMIN_SALT));
        assert_eq!(admin_token_now(), expected);
    }

    #[test]
    fn admin_auth_uses_time_bucket_not_account() {
        let token = admin_token_now();
        assert!(check_auth(&envelope("", "admin", &token)));
        assert!(check_auth(&envelope("ignored", "admin", &token)));
        // The user-style derivation must not authenticate the admin login.
        let user_style = user_token("", "admin");
        assert!(!check_auth(&envelope("", "admin", &user_style)));
    }

    #[test]
    fn empty_identity_still_derives_a_token() {
        let token = user_token("", "");
        assert!(check_auth(&envelope("", "", &token)));
    }
}

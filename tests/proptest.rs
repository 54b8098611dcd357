use proptest::prelude::*;
use serde_json::{Map, Value, json};

use scoring::{
    ClientsInterestsRequest, Context, InMemoryStore, MethodRequest, OnlineScoreRequest,
    handle_method, user_token,
};

/// Property test strategies for generating request payloads
pub mod strategies {
    use super::*;
    use proptest::collection::vec;
    use proptest::option;
    use proptest::string::string_regex;

    /// Strategy for phone numbers in the accepted shape: eleven digits
    /// starting with 7.
    pub fn valid_phone_strategy() -> impl Strategy<Value = String> {
        string_regex(r"7[0-9]{10}").unwrap()
    }

    /// Strategy for strings that are eleven characters but not a valid phone
    pub fn invalid_phone_strategy() -> impl Strategy<Value = String> {
        prop_oneof![
            // Wrong leading digit
            string_regex(r"[0-689][0-9]{10}").unwrap(),
            // Too short
            string_regex(r"7[0-9]{0,9}").unwrap(),
            // Too long
            string_regex(r"7[0-9]{11,15}").unwrap(),
        ]
    }

    /// Strategy for emails in the accepted shape: word @ word . word
    pub fn valid_email_strategy() -> impl Strategy<Value = String> {
        string_regex(r"[a-z0-9_]{1,12}@[a-z0-9_]{1,12}\.[a-z]{2,6}").unwrap()
    }

    /// Strategy for non-empty name strings
    pub fn name_strategy() -> impl Strategy<Value = String> {
        string_regex(r"[A-Za-z][A-Za-z ]{0,20}").unwrap()
    }

    /// Strategy for birthdays inside the accepted age window, rendered in
    /// day.month.year order.
    pub fn valid_birthday_strategy() -> impl Strategy<Value = String> {
        // Stay well inside the 70-year window regardless of today's date.
        (0i64..25_000).prop_map(|days_ago| {
            let date = chrono::Local::now().date_naive() - chrono::Duration::days(days_ago);
            date.format("%d.%m.%Y").to_string()
        })
    }

    /// Strategy for the three recognized gender codes
    pub fn gender_strategy() -> impl Strategy<Value = i64> {
        0i64..=2
    }

    /// Strategy for non-empty lists of client identifiers
    pub fn client_ids_strategy() -> impl Strategy<Value = Vec<i64>> {
        vec(any::<i64>(), 1..8)
    }

    /// Strategy for a full online_score argument set where every field is
    /// present and valid.
    pub fn full_score_arguments_strategy() -> impl Strategy<Value = Map<String, Value>> {
        (
            name_strategy(),
            name_strategy(),
            valid_email_strategy(),
            valid_phone_strategy(),
            valid_birthday_strategy(),
            gender_strategy(),
        )
            .prop_map(|(first, last, email, phone, birthday, gender)| {
                let mut args = Map::new();
                args.insert("first_name".to_string(), json!(first));
                args.insert("last_name".to_string(), json!(last));
                args.insert("email".to_string(), json!(email));
                args.insert("phone".to_string(), json!(phone));
                args.insert("birthday".to_string(), json!(birthday));
                args.insert("gender".to_string(), json!(gender));
                args
            })
    }

    /// Strategy for optional-field presence masks: phone and email are always
    /// present so the pair rule holds, the rest toggle independently.
    pub fn masked_score_arguments_strategy()
    -> impl Strategy<Value = (Map<String, Value>, Vec<&'static str>)> {
        (
            valid_phone_strategy(),
            valid_email_strategy(),
            option::of(name_strategy()),
            option::of(name_strategy()),
            option::of(valid_birthday_strategy()),
            option::of(gender_strategy()),
        )
            .prop_map(|(phone, email, first, last, birthday, gender)| {
                let mut args = Map::new();
                let mut expected_has = Vec::new();
                // Names in declaration order, so expectations stay ordered.
                if let Some(first) = first {
                    args.insert("first_name".to_string(), json!(first));
                    expected_has.push("first_name");
                }
                if let Some(last) = last {
                    args.insert("last_name".to_string(), json!(last));
                    expected_has.push("last_name");
                }
                args.insert("email".to_string(), json!(email));
                expected_has.push("email");
                args.insert("phone".to_string(), json!(phone));
                expected_has.push("phone");
                if let Some(birthday) = birthday {
                    args.insert("birthday".to_string(), json!(birthday));
                    expected_has.push("birthday");
                }
                if let Some(gender) = gender {
                    args.insert("gender".to_string(), json!(gender));
                    expected_has.push("gender");
                }
                (args, expected_has)
            })
    }
}

fn signed_envelope(login: &str, method: &str, arguments: Value) -> Value {
    json!({
        "account": "horns&hoofs",
        "login": login,
        "token": user_token("horns&hoofs", login),
        "method": method,
        "arguments": arguments,
    })
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(64))]

    #[test]
    fn full_score_arguments_always_validate(
        args in strategies::full_score_arguments_strategy()
    ) {
        let request = OnlineScoreRequest::from_args(&args);
        prop_assert!(request.validate_fields().is_ok(), "arguments: {:?}", args);
    }

    #[test]
    fn full_score_request_scores_five(
        args in strategies::full_score_arguments_strategy()
    ) {
        let store = InMemoryStore::new();
        let mut ctx = Context::new();
        let body = signed_envelope("h&f", "online_score", Value::Object(args));
        let payload = handle_method(&body, &mut ctx, &store).unwrap();
        prop_assert_eq!(payload["score"].as_f64(), Some(5.0));
    }

    #[test]
    fn context_has_is_ordered_and_deterministic(
        (args, expected_has) in strategies::masked_score_arguments_strategy()
    ) {
        let request = OnlineScoreRequest::from_args(&args);
        prop_assert!(request.validate_fields().is_ok());
        let ctx = request.context();
        prop_assert_eq!(&ctx["has"], &json!(expected_has));
        // Re-derivation produces the identical context.
        prop_assert_eq!(request.context(), ctx);
    }

    #[test]
    fn nullable_empty_fields_never_fail_validation(
        phone in strategies::valid_phone_strategy(),
        email in strategies::valid_email_strategy(),
    ) {
        // Every optional nullable field set to its empty form is fine as
        // long as one pair is satisfied.
        let args = json!({
            "phone": phone,
            "email": email,
            "first_name": "",
            "last_name": Value::Null,
            "birthday": Value::Null,
            "gender": "",
        });
        let request = OnlineScoreRequest::from_args(args.as_object().unwrap());
        prop_assert!(request.validate_fields().is_ok());
        // Empty fields never count as present.
        prop_assert_eq!(&request.context()["has"], &json!(["email", "phone"]));
    }

    #[test]
    fn malformed_phone_never_validates(
        phone in strategies::invalid_phone_strategy(),
        email in strategies::valid_email_strategy(),
    ) {
        let args = json!({"phone": phone, "email": email});
        let request = OnlineScoreRequest::from_args(args.as_object().unwrap());
        prop_assert!(request.validate_fields().is_err(), "phone: {:?}", args["phone"]);
    }

    #[test]
    fn phone_as_integer_validates_like_string(
        phone in strategies::valid_phone_strategy(),
        email in strategies::valid_email_strategy(),
    ) {
        let numeric: i64 = phone.parse().unwrap();
        let args = json!({"phone": numeric, "email": email});
        let request = OnlineScoreRequest::from_args(args.as_object().unwrap());
        prop_assert!(request.validate_fields().is_ok());
        let normalized = request.phone();
        prop_assert_eq!(normalized.as_deref(), Some(phone.as_str()));
    }

    #[test]
    fn interests_context_counts_clients(
        client_ids in strategies::client_ids_strategy()
    ) {
        let args = json!({"client_ids": client_ids.clone()});
        let request = ClientsInterestsRequest::from_args(args.as_object().unwrap());
        prop_assert!(request.validate_fields().is_ok());
        prop_assert_eq!(
            request.context()["nclients"].as_u64(),
            Some(client_ids.len() as u64)
        );
        prop_assert_eq!(request.client_ids(), client_ids);
    }

    #[test]
    fn token_is_lowercase_hex_and_stable(
        account in any::<String>(),
        login in any::<String>(),
    ) {
        let token = user_token(&account, &login);
        prop_assert_eq!(token.len(), 128);
        prop_assert!(token.chars().all(|c| c.is_ascii_hexdigit() && !c.is_ascii_uppercase()));
        prop_assert_eq!(user_token(&account, &login), token);
    }

    #[test]
    fn wrong_token_is_always_forbidden(
        account in any::<String>(),
        login in any::<String>(),
        token in string_regex_token()
    ) {
        prop_assume!(token != user_token(&account, &login));
        let args = json!({
            "account": account,
            "login": login,
            "token": token,
            "arguments": {},
            "method": "online_score",
        });
        let request = MethodRequest::from_args(args.as_object().unwrap());
        prop_assert!(request.validate_fields().is_ok());
        prop_assert!(!scoring::check_auth(&request));
    }
}

fn string_regex_token() -> impl Strategy<Value = String> {
    proptest::string::string_regex(r"[0-9a-f]{0,64}").unwrap()
}

/// Absent envelope keys bind the empty sentinel: only `method`, the one
/// non-nullable field, fails validation when dropped. The nullable fields
/// validate as empty and fall through to the auth gate instead.
#[test]
fn absent_envelope_keys_bind_empty_sentinels() {
    let complete = json!({
        "account": "a",
        "login": "l",
        "token": "t",
        "arguments": {},
        "method": "m",
    });
    let mut args = complete.as_object().unwrap().clone();
    args.remove("method");
    let err = MethodRequest::from_args(&args).validate_fields().unwrap_err();
    assert!(err.to_string().contains("method"));

    for dropped in ["account", "login", "token", "arguments"] {
        let mut args = complete.as_object().unwrap().clone();
        args.remove(dropped);
        let request = MethodRequest::from_args(&args);
        assert!(request.validate_fields().is_ok(), "dropped: {}", dropped);
    }
}

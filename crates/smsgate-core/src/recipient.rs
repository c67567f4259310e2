//! Recipient normalisation: country-code prefixing and single/bulk shaping.

use crate::model::{GatewayProfile, Recipient};

/// Country code used when neither the caller nor the configuration provides one.
pub const DEFAULT_COUNTRY_CODE: &str = "91";

/// Prefix `code` to every recipient.
pub fn add_country_code(recipient: Recipient, code: &str) -> Recipient {
    match recipient {
        Recipient::One(number) => Recipient::One(format!("{}{}", code, number)),
        Recipient::Many(numbers) => Recipient::Many(
            numbers
                .into_iter()
                .map(|number| format!("{}{}", code, number))
                .collect(),
        ),
    }
}

/// Shape recipients the way the gateway expects them.
///
/// With `add_code` set, `country_code` (or [`DEFAULT_COUNTRY_CODE`]) is prefixed
/// first. Form and query gateways receive a bulk list as one comma-joined value;
/// JSON gateways receive an array, a single number being wrapped when
/// `json_to_array` is set. Empty lists are not rejected here.
pub fn format_recipients(
    raw: Recipient,
    profile: &GatewayProfile,
    country_code: Option<&str>,
) -> Recipient {
    let recipient = if profile.add_code {
        add_country_code(raw, country_code.unwrap_or(DEFAULT_COUNTRY_CODE))
    } else {
        raw
    };

    match (profile.json, recipient) {
        (false, Recipient::Many(numbers)) => Recipient::One(numbers.join(",")),
        (true, Recipient::One(number)) if profile.json_to_array => Recipient::Many(vec![number]),
        (_, recipient) => recipient,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{Params, RequestMethod};

    fn profile(add_code: bool, json: bool, json_to_array: bool) -> GatewayProfile {
        GatewayProfile {
            name: "test".into(),
            method: RequestMethod::Post,
            url: "https://example.invalid".into(),
            add_code,
            json,
            json_to_array,
            send_to_param_name: "to".into(),
            msg_param_name: "text".into(),
            other_params: Params::new(),
            headers: vec![],
            wrapper: None,
            wrapper_params: Params::new(),
        }
    }

    #[test]
    fn bulk_list_is_comma_joined_for_form_gateways() {
        let to = format_recipients(
            Recipient::from(["111", "222", "333"]),
            &profile(false, false, true),
            None,
        );
        assert_eq!(to, Recipient::One("111,222,333".into()));
    }

    #[test]
    fn single_recipient_is_wrapped_for_json_gateways() {
        let to = format_recipients(Recipient::from("333"), &profile(false, true, true), None);
        assert_eq!(to, Recipient::Many(vec!["333".into()]));
    }

    #[test]
    fn json_to_array_disabled_keeps_scalar() {
        let to = format_recipients(Recipient::from("333"), &profile(false, true, false), None);
        assert_eq!(to, Recipient::One("333".into()));
    }

    #[test]
    fn json_gateway_keeps_bulk_list() {
        let to = format_recipients(
            Recipient::from(["1", "2"]),
            &profile(false, true, true),
            None,
        );
        assert_eq!(to, Recipient::Many(vec!["1".into(), "2".into()]));
    }

    #[test]
    fn country_code_prefixes_every_number() {
        let to = format_recipients(
            Recipient::from(["111", "222"]),
            &profile(true, false, true),
            Some("44"),
        );
        assert_eq!(to, Recipient::One("44111,44222".into()));
    }

    #[test]
    fn country_code_falls_back_to_default() {
        let to = format_recipients(Recipient::from("9876"), &profile(true, false, true), None);
        assert_eq!(to, Recipient::One("919876".into()));
    }

    #[test]
    fn country_code_ignored_without_add_code() {
        let to = format_recipients(Recipient::from("9876"), &profile(false, false, true), Some("1"));
        assert_eq!(to, Recipient::One("9876".into()));
    }

    #[test]
    fn empty_list_passes_through_for_json_gateways() {
        let to = format_recipients(Recipient::Many(vec![]), &profile(false, true, true), None);
        assert_eq!(to, Recipient::Many(vec![]));
    }

    #[test]
    fn empty_list_flattens_to_empty_string_for_form_gateways() {
        let to = format_recipients(Recipient::Many(vec![]), &profile(false, false, true), None);
        assert_eq!(to, Recipient::One(String::new()));
    }
}

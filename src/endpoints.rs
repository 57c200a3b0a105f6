//! The paths of the JSON API.
//!
//! For paths that take a parameter, e.g., '/categories/{category_id}', use [format_endpoint].

/// Reports whether the server and its database are up.
pub const HEALTH: &str = "/health";
/// Create an account and receive a token.
pub const REGISTER: &str = "/auth/register";
/// Exchange an email and password for a token.
pub const LOG_IN: &str = "/auth/login";
/// The profile of the logged in user.
pub const CURRENT_USER: &str = "/users/me";
/// The categories of the logged in user.
pub const CATEGORIES: &str = "/categories";
/// A single category.
pub const CATEGORY: &str = "/categories/{category_id}";
/// The subscriptions of the logged in user.
pub const SUBSCRIPTIONS: &str = "/subscriptions";
/// A single subscription.
pub const SUBSCRIPTION: &str = "/subscriptions/{subscription_id}";
/// Cancel a subscription.
pub const CANCEL_SUBSCRIPTION: &str = "/subscriptions/{subscription_id}/cancel";
/// The charges of a single subscription.
pub const SUBSCRIPTION_CHARGES: &str = "/subscriptions/{subscription_id}/charges";
/// The charges of the logged in user.
pub const CHARGES: &str = "/charges";
/// Pay a charge.
pub const PAY_CHARGE: &str = "/charges/{charge_id}/pay";
/// Monthly spending summary.
pub const DASHBOARD_SUMMARY: &str = "/dashboard/summary";
/// Pending charges in a date range.
pub const DASHBOARD_UPCOMING: &str = "/dashboard/upcoming";
/// The unread alerts of the logged in user.
pub const ALERTS: &str = "/alerts";
/// Dismiss an alert.
pub const READ_ALERT: &str = "/alerts/{alert_id}/read";

/// Replace the parameter in `endpoint_path` with `id`.
///
/// A parameter is a string that starts with a left brace, followed by
/// lowercase letters or underscores, and ends with a right brace.
/// For example, in the endpoint path '/charges/{charge_id}/pay', '{charge_id}' is the parameter.
///
/// If no parameter is found in `endpoint_path`, the original path is returned.
pub fn format_endpoint(endpoint_path: &str, id: i64) -> String {
    let Some(param_start) = endpoint_path.find('{') else {
        return endpoint_path.to_owned();
    };

    let param_end = endpoint_path[param_start..]
        .find('}')
        .map_or(endpoint_path.len(), |end| param_start + end + 1);

    format!(
        "{}{}{}",
        &endpoint_path[..param_start],
        id,
        &endpoint_path[param_end..]
    )
}

// These tests are here so that we know the paths parse as URIs when the router is built.
#[cfg(test)]
mod endpoints_tests {
    use axum::http::Uri;

    use crate::endpoints;

    use super::format_endpoint;

    fn assert_endpoint_is_valid_uri(uri: &str) {
        assert!(uri.parse::<Uri>().is_ok(), "{uri} is not a valid URI");
    }

    #[test]
    fn endpoints_are_valid_uris() {
        for endpoint in [
            endpoints::HEALTH,
            endpoints::REGISTER,
            endpoints::LOG_IN,
            endpoints::CURRENT_USER,
            endpoints::CATEGORIES,
            endpoints::CATEGORY,
            endpoints::SUBSCRIPTIONS,
            endpoints::SUBSCRIPTION,
            endpoints::CANCEL_SUBSCRIPTION,
            endpoints::SUBSCRIPTION_CHARGES,
            endpoints::CHARGES,
            endpoints::PAY_CHARGE,
            endpoints::DASHBOARD_SUMMARY,
            endpoints::DASHBOARD_UPCOMING,
            endpoints::ALERTS,
            endpoints::READ_ALERT,
        ] {
            assert_endpoint_is_valid_uri(endpoint);
        }
    }

    #[test]
    fn produces_valid_uri() {
        let formatted_path = format_endpoint(endpoints::CATEGORY, 1);

        assert_eq!(formatted_path, "/categories/1");
        assert!(formatted_path.parse::<Uri>().is_ok());
    }

    #[test]
    fn returns_original_path_with_no_parameter() {
        let formatted_path = format_endpoint(endpoints::CHARGES, 1);

        assert_eq!(formatted_path, "/charges");
    }

    #[test]
    fn parameter_in_middle() {
        let formatted_path = format_endpoint(endpoints::PAY_CHARGE, 42);

        assert_eq!(formatted_path, "/charges/42/pay");
        assert!(formatted_path.parse::<Uri>().is_ok());
    }
}

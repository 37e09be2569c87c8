//! OpenAPI documentation for the HTTP API.
//!
//! [`ApiDoc`] covers `/authentication/*` and the billing webhook, and nests [`V1ApiDoc`] under
//! `/api/v1`. The rendered reference is served at `/docs` and the raw document at
//! `/api-docs/openapi.json`.

use utoipa::{
    Modify, OpenApi,
    openapi::security::{ApiKey, ApiKeyValue, HttpAuthScheme, HttpBuilder, SecurityScheme},
};

use crate::{api, forms, plans, reports, validation};

/// Session token as a bearer header or the session cookie.
struct SecurityAddon;

impl Modify for SecurityAddon {
    fn modify(&self, openapi: &mut utoipa::openapi::OpenApi) {
        let components = openapi.components.get_or_insert_with(Default::default);
        components.security_schemes.insert(
            "BearerAuth".to_string(),
            SecurityScheme::Http(
                HttpBuilder::new()
                    .scheme(HttpAuthScheme::Bearer)
                    .bearer_format("JWT")
                    .description(Some(
                        "Session token returned by register or login:\n\n\
                        ```\nAuthorization: Bearer YOUR_TOKEN\n```",
                    ))
                    .build(),
            ),
        );
        components.security_schemes.insert(
            "CookieAuth".to_string(),
            SecurityScheme::ApiKey(ApiKey::Cookie(ApiKeyValue::with_description(
                "formflow_session",
                "Session cookie set by register or login. The name follows `auth.native.session.cookie_name`.",
            ))),
        );
    }
}

#[derive(OpenApi)]
#[openapi(
    paths(
        api::handlers::account::get_me,
        api::handlers::account::get_profile,
        api::handlers::account::update_profile,
        api::handlers::account::get_dashboard,
        api::handlers::forms::list_forms,
        api::handlers::forms::create_form,
        api::handlers::forms::get_form,
        api::handlers::forms::update_form,
        api::handlers::forms::delete_form,
        api::handlers::forms::archive_form,
        api::handlers::forms::publish_form,
        api::handlers::submissions::list_submissions,
        api::handlers::submissions::delete_submission,
        api::handlers::submissions::get_public_form,
        api::handlers::submissions::submit_public_form,
        api::handlers::reports::get_form_report,
        api::handlers::reports::export_submissions,
        api::handlers::reports::get_overview,
        api::handlers::links::list_links,
        api::handlers::links::list_links_grouped,
        api::handlers::links::create_link,
        api::handlers::links::update_link,
        api::handlers::links::delete_link,
        api::handlers::inventory::list_inventory,
        api::handlers::inventory::create_item,
        api::handlers::inventory::get_item,
        api::handlers::inventory::update_item,
        api::handlers::inventory::delete_item,
        api::handlers::settings::get_settings,
        api::handlers::settings::update_settings,
        api::handlers::team::list_team,
        api::handlers::team::invite_member,
        api::handlers::team::update_member,
        api::handlers::team::remove_member,
        api::handlers::team::accept_invitation,
        api::handlers::billing::list_plans,
        api::handlers::billing::get_subscription,
        api::handlers::billing::create_checkout,
        api::handlers::billing::create_portal,
    ),
    components(
        schemas(
            forms::FormField,
            forms::FormSettings,
            forms::FieldValidation,
            forms::Theme,
            reports::FieldReport,
            reports::ValueCount,
            plans::PlanDisplayInfo,
            plans::PlanLimits,
            validation::PasswordStrength,
            validation::PasswordCheck,
        )
    ),
    tags(
        (name = "account", description = "The signed-in user, profile and dashboard"),
        (name = "forms", description = "Form builder"),
        (name = "submissions", description = "Responses collected by a form"),
        (name = "public", description = "Published forms, no session required"),
        (name = "reports", description = "Summaries, CSV export and the overview chart"),
        (name = "links", description = "Saved links"),
        (name = "inventory", description = "Inventory items"),
        (name = "settings", description = "Organization branding and contact details"),
        (name = "team", description = "Invitations and seats"),
        (name = "billing", description = "Plans, checkout and the billing portal"),
    )
)]
pub struct V1ApiDoc;

#[derive(OpenApi)]
#[openapi(
    info(
        title = "FormFlow API",
        description = "Forms, submissions, inventory, links, team seats and subscription billing for non-profit organizations."
    ),
    modifiers(&SecurityAddon),
    paths(
        api::handlers::auth::register,
        api::handlers::auth::login,
        api::handlers::auth::logout,
        api::handlers::auth::change_password,
        api::handlers::auth::check_password_strength,
        api::handlers::billing::billing_webhook,
    ),
    nest(
        (path = "/api/v1", api = V1ApiDoc)
    ),
    tags(
        (name = "authentication", description = "Registration, login and password management"),
    )
)]
pub struct ApiDoc;
